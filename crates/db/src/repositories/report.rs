//! Report repository for persistence and geo-queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entities::{
    Report, Role, UserRole,
    report::{self, ReportCategory, ReportStatus},
    role, user, user_role,
};
use civic_common::{AppError, AppResult, BoundingBox};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, JoinType,
    Linked, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

/// Statuses that count towards a staff member's current workload.
const OPEN_STATUSES: [ReportStatus; 3] = [
    ReportStatus::Assigned,
    ReportStatus::InProgress,
    ReportStatus::Suspended,
];

/// Link from a report to its reporter.
#[derive(Debug)]
pub struct ReportToReporter;

impl Linked for ReportToReporter {
    type FromEntity = report::Entity;
    type ToEntity = user::Entity;

    fn link(&self) -> Vec<sea_orm::RelationDef> {
        vec![report::Relation::Reporter.def()]
    }
}

/// An approved report prepared for map rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MapReportRecord {
    /// The report itself.
    pub report: report::Model,
    /// Display name of the reporter; "Anonymous" for anonymous reports.
    pub reporter_name: String,
}

/// A grid cell of spatially aggregated reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCluster {
    /// Stable cluster identifier derived from the grid cell.
    pub cluster_id: String,
    /// Latitude of the cluster centroid.
    pub latitude: f64,
    /// Longitude of the cluster centroid.
    pub longitude: f64,
    /// Number of reports in the cell.
    pub report_count: u64,
    /// Ids of the member reports.
    pub report_ids: Vec<i64>,
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by id, failing when absent.
    pub async fn get_by_id(&self, id: i64) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::ReportNotFound(id))
    }

    /// List reports with optional status and category filters.
    pub async fn find_all(
        &self,
        status: Option<ReportStatus>,
        category: Option<ReportCategory>,
    ) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find().order_by_desc(report::Column::CreatedAt);

        if let Some(s) = status {
            query = query.filter(report::Column::Status.eq(s));
        }
        if let Some(c) = category {
            query = query.filter(report::Column::Category.eq(c));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List reports assigned to an internal staff member.
    pub async fn find_by_assignee(
        &self,
        user_id: i64,
        status: Option<ReportStatus>,
        category: Option<ReportCategory>,
    ) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find()
            .filter(report::Column::AssigneeId.eq(user_id))
            .order_by_desc(report::Column::CreatedAt);

        if let Some(s) = status {
            query = query.filter(report::Column::Status.eq(s));
        }
        if let Some(c) = category {
            query = query.filter(report::Column::Category.eq(c));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List reports delegated to an external maintainer.
    ///
    /// The join double-checks that the delegate actually holds the
    /// External Maintainer role.
    pub async fn find_by_external_assignee(
        &self,
        user_id: i64,
        status: Option<ReportStatus>,
    ) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find()
            .filter(report::Column::ExternalAssigneeId.eq(user_id))
            .join(JoinType::InnerJoin, report::Relation::ExternalAssignee.def())
            .join(JoinType::InnerJoin, user::Relation::UserRoles.def())
            .join(JoinType::InnerJoin, user_role::Relation::Role.def())
            .filter(role::Column::Name.eq("External Maintainer"))
            .order_by_desc(report::Column::CreatedAt);

        if let Some(s) = status {
            query = query.filter(report::Column::Status.eq(s));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a mutated report, guarded by its optimistic-lock version.
    ///
    /// The UPDATE is conditional on the version the caller read; a
    /// concurrent transition that already bumped it surfaces as `Conflict`.
    pub async fn update_with_version(
        &self,
        mut model: report::ActiveModel,
        expected_version: i32,
    ) -> AppResult<report::Model> {
        let id = match model.id {
            ActiveValue::Set(id) | ActiveValue::Unchanged(id) => id,
            ActiveValue::NotSet => {
                return Err(AppError::Internal(
                    "Cannot update a report without an id".to_string(),
                ));
            }
        };

        model.version = ActiveValue::Set(expected_version + 1);

        let result = Report::update_many()
            .set(model)
            .filter(report::Column::Id.eq(id))
            .filter(report::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "Report {id} was modified concurrently"
            )));
        }

        self.get_by_id(id).await
    }

    /// List approved reports for map rendering, with the reporter joined for
    /// display-name derivation.
    ///
    /// Pending Approval and Rejected reports never appear on the map.
    pub async fn approved_for_map(
        &self,
        bbox: Option<BoundingBox>,
        category: Option<ReportCategory>,
    ) -> AppResult<Vec<MapReportRecord>> {
        let mut query = Report::find()
            .filter(report::Column::Status.ne(ReportStatus::PendingApproval))
            .filter(report::Column::Status.ne(ReportStatus::Rejected))
            .order_by_desc(report::Column::CreatedAt);

        if let Some(b) = bbox {
            query = query
                .filter(report::Column::Latitude.between(b.min_latitude, b.max_latitude))
                .filter(report::Column::Longitude.between(b.min_longitude, b.max_longitude));
        }
        if let Some(c) = category {
            query = query.filter(report::Column::Category.eq(c));
        }

        let rows = query
            .find_also_linked(ReportToReporter)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(report, reporter)| {
                let reporter_name = if report.is_anonymous {
                    "Anonymous".to_string()
                } else {
                    reporter
                        .map(|u| u.name.unwrap_or(u.username))
                        .unwrap_or_else(|| "Anonymous".to_string())
                };
                MapReportRecord {
                    report,
                    reporter_name,
                }
            })
            .collect())
    }

    /// Aggregate approved reports into grid cells of the given size.
    ///
    /// Bucketing runs over the bbox-filtered rows, so any geo-capable store
    /// can replace the column-range query without touching callers.
    pub async fn cluster_by_grid(
        &self,
        cell_size: f64,
        bbox: Option<BoundingBox>,
        category: Option<ReportCategory>,
    ) -> AppResult<Vec<ReportCluster>> {
        let records = self.approved_for_map(bbox, category).await?;
        Ok(cluster_records(&records, cell_size))
    }

    /// Find reports whose address matches a substring.
    pub async fn find_by_address(&self, address: &str) -> AppResult<Vec<report::Model>> {
        let pattern = format!("%{}%", address.replace('%', "\\%"));

        Report::find()
            .filter(report::Column::Address.like(&pattern))
            .order_by_desc(report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a staff member's currently open assigned reports.
    pub async fn count_open_by_assignee(&self, user_id: i64) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::AssigneeId.eq(user_id))
            .filter(report::Column::Status.is_in(OPEN_STATUSES))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Bucket map records into grid cells of the given size.
fn cluster_records(records: &[MapReportRecord], cell_size: f64) -> Vec<ReportCluster> {
    let mut cells: BTreeMap<(i64, i64), (f64, f64, Vec<i64>)> = BTreeMap::new();
    for record in records {
        let report = &record.report;
        let grid_lat = (report.latitude / cell_size).floor() as i64;
        let grid_lng = (report.longitude / cell_size).floor() as i64;
        let cell = cells.entry((grid_lat, grid_lng)).or_default();
        cell.0 += report.latitude;
        cell.1 += report.longitude;
        cell.2.push(report.id);
    }

    cells
        .into_iter()
        .map(|((grid_lat, grid_lng), (lat_sum, lng_sum, report_ids))| {
            let count = report_ids.len() as u64;
            ReportCluster {
                cluster_id: format!("cluster_{grid_lat}_{grid_lng}"),
                latitude: lat_sum / count as f64,
                longitude: lng_sum / count as f64,
                report_count: count,
                report_ids,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_report(id: i64, latitude: f64, longitude: f64) -> report::Model {
        report::Model {
            id,
            reporter_id: Some(1),
            title: format!("Report {id}"),
            description: "Broken street light".to_string(),
            category: ReportCategory::PublicLighting,
            latitude,
            longitude,
            address: None,
            is_anonymous: false,
            status: ReportStatus::Assigned,
            assignee_id: Some(2),
            external_assignee_id: None,
            rejection_reason: None,
            version: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_all_with_status_filter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_report(1, 45.07, 7.68), test_report(2, 45.08, 7.69)]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo
            .find_all(Some(ReportStatus::Assigned), None)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let err = repo.get_by_id(99).await.unwrap_err();

        assert!(matches!(err, AppError::ReportNotFound(99)));
    }

    #[tokio::test]
    async fn test_update_with_version_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let mut model: report::ActiveModel = test_report(1, 45.07, 7.68).into();
        model.status = ActiveValue::Set(ReportStatus::Resolved);

        let err = repo.update_with_version(model, 0).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_count_open_by_assignee() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit_count(3)]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert_eq!(repo.count_open_by_assignee(2).await.unwrap(), 3);
    }

    fn maplit_count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }

    fn map_record(id: i64, latitude: f64, longitude: f64) -> MapReportRecord {
        MapReportRecord {
            report: test_report(id, latitude, longitude),
            reporter_name: "Anonymous".to_string(),
        }
    }

    #[test]
    fn test_cluster_records_groups_nearby_reports() {
        let records = vec![
            map_record(1, 45.071, 7.681),
            map_record(2, 45.072, 7.683),
            map_record(3, 45.121, 7.731),
        ];

        let clusters = cluster_records(&records, 0.01);

        assert_eq!(clusters.len(), 2);
        let big = clusters
            .iter()
            .find(|c| c.report_count == 2)
            .unwrap();
        assert_eq!(big.report_ids, vec![1, 2]);
        assert!((big.latitude - 45.0715).abs() < 1e-9);
        assert!((big.longitude - 7.682).abs() < 1e-9);
    }

    #[test]
    fn test_cluster_id_encodes_grid_cell() {
        let clusters = cluster_records(&[map_record(1, 45.071, 7.681)], 0.01);
        assert_eq!(clusters[0].cluster_id, "cluster_4507_768");
    }

    #[test]
    fn test_cluster_records_empty() {
        assert!(cluster_records(&[], 0.01).is_empty());
    }
}
