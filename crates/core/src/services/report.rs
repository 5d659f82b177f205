//! Report lifecycle service.
//!
//! Owns the report state machine: citizen submission, approval and rejection
//! by the public relations office, staff assignment, delegation to external
//! maintainers, and the work transitions towards resolution. Every transition
//! carries its own authorization rule.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use tracing::{info, warn};

use civic_common::{
    AppError, AppResult, BoundingBox, DecodedPhoto, LocationInput, PhotoStorage, ServiceArea,
    decode_photo_data_uri,
};
use civic_db::{
    entities::{
        photo,
        report::{self, ReportCategory, ReportStatus},
    },
    repositories::{
        CompanyRepository, MapReportRecord, PhotoRepository, ReportCluster, ReportRepository,
        UserRepository, UserWithRoles,
    },
};

use crate::roles::RoleKind;
use crate::services::assignment::{CategoryRoleResolver, StaffLoadBalancer};

/// Minimum number of photos on a new report.
pub const MIN_PHOTOS: usize = 1;

/// Maximum number of photos on a new report.
pub const MAX_PHOTOS: usize = 3;

/// Grid cell size at the clustering zoom threshold, in degrees.
const BASE_CELL_SIZE: f64 = 0.01;

/// Input for creating a new report.
pub struct CreateReportInput {
    pub title: String,
    pub description: String,
    pub category: ReportCategory,
    pub location: Option<LocationInput>,
    pub address: Option<String>,
    /// Base64 data URIs, 1-3 items.
    pub photos: Vec<String>,
    pub is_anonymous: bool,
}

/// A report together with its photos.
#[derive(Debug)]
pub struct ReportDetail {
    pub report: report::Model,
    pub photos: Vec<photo::Model>,
}

/// Map query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapQuery {
    pub zoom: Option<u8>,
    pub bbox: Option<BoundingBox>,
    pub category: Option<ReportCategory>,
}

/// Map data, individual or clustered depending on zoom.
pub enum MapData {
    Individual(Vec<MapReportRecord>),
    Clustered(Vec<ReportCluster>),
}

/// Report lifecycle service.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    photo_repo: PhotoRepository,
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    resolver: CategoryRoleResolver,
    balancer: StaffLoadBalancer,
    storage: Arc<dyn PhotoStorage>,
    service_area: ServiceArea,
    cluster_zoom_threshold: u8,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub fn new(
        report_repo: ReportRepository,
        photo_repo: PhotoRepository,
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        resolver: CategoryRoleResolver,
        balancer: StaffLoadBalancer,
        storage: Arc<dyn PhotoStorage>,
        service_area: ServiceArea,
        cluster_zoom_threshold: u8,
    ) -> Self {
        Self {
            report_repo,
            photo_repo,
            user_repo,
            company_repo,
            resolver,
            balancer,
            storage,
            service_area,
            cluster_zoom_threshold,
        }
    }

    // ========== Creation ==========

    /// Create a report from a citizen submission.
    ///
    /// The report starts in Pending Approval. Photos are decoded and
    /// validated before anything is persisted; if storing them fails after
    /// the report row exists, already-uploaded blobs are deleted best-effort
    /// and the original error propagates.
    pub async fn create_report(
        &self,
        reporter_id: Option<i64>,
        input: CreateReportInput,
    ) -> AppResult<ReportDetail> {
        let location = self.service_area.validate(input.location)?;

        if input.photos.len() < MIN_PHOTOS || input.photos.len() > MAX_PHOTOS {
            return Err(AppError::BadRequest(format!(
                "Between {MIN_PHOTOS} and {MAX_PHOTOS} photos are required"
            )));
        }

        let decoded: Vec<DecodedPhoto> = input
            .photos
            .iter()
            .map(|p| decode_photo_data_uri(p))
            .collect::<AppResult<_>>()?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }

        let now = Utc::now();
        let model = report::ActiveModel {
            reporter_id: Set(reporter_id),
            title: Set(title),
            description: Set(input.description.trim().to_string()),
            category: Set(input.category),
            latitude: Set(location.latitude),
            longitude: Set(location.longitude),
            address: Set(input.address),
            is_anonymous: Set(input.is_anonymous),
            status: Set(ReportStatus::PendingApproval),
            assignee_id: Set(None),
            external_assignee_id: Set(None),
            rejection_reason: Set(None),
            version: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let saved = self.report_repo.create(model).await?;

        match self.store_photos(saved.id, &decoded).await {
            Ok(photos) => Ok(ReportDetail {
                report: saved,
                photos,
            }),
            Err(err) => {
                if let Err(cleanup_err) = self.storage.delete_report_photos(saved.id).await {
                    warn!(
                        report_id = saved.id,
                        error = %cleanup_err,
                        "Failed to clean up photos after report creation failure"
                    );
                }
                Err(err)
            }
        }
    }

    async fn store_photos(
        &self,
        report_id: i64,
        decoded: &[DecodedPhoto],
    ) -> AppResult<Vec<photo::Model>> {
        let mut photos = Vec::with_capacity(decoded.len());
        for item in decoded {
            let url = self.storage.upload_photo(report_id, item).await?;
            let model = photo::ActiveModel {
                report_id: Set(report_id),
                storage_url: Set(url),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            };
            photos.push(self.photo_repo.create(model).await?);
        }
        Ok(photos)
    }

    // ========== Approval / rejection ==========

    /// Approve a pending report and assign it to the least-loaded staff
    /// member of the role responsible for its category.
    pub async fn approve_report(
        &self,
        id: i64,
        category_override: Option<String>,
        caller_id: i64,
    ) -> AppResult<report::Model> {
        self.require_moderator(caller_id).await?;

        let existing = self.report_repo.get_by_id(id).await?;

        if existing.status != ReportStatus::PendingApproval {
            return Err(AppError::BadRequest(format!(
                "Cannot approve report with status {}. Only reports with status Pending Approval can be approved.",
                existing.status
            )));
        }

        let category = match category_override {
            Some(name) => ReportCategory::from_name(&name)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid category: {name}")))?,
            None => existing.category,
        };

        let role_id = self
            .resolver
            .role_id_for_category(category)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("No role mapping found for category: {category}"))
            })?;

        let staff = self
            .balancer
            .find_available_staff(role_id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "No available technical staff found for category: {category}"
                ))
            })?;

        let mut model: report::ActiveModel = existing.clone().into();
        model.status = Set(ReportStatus::Assigned);
        model.category = Set(category);
        model.assignee_id = Set(Some(staff.id));
        model.rejection_reason = Set(None);
        model.updated_at = Set(Utc::now().into());

        let updated = self
            .report_repo
            .update_with_version(model, existing.version)
            .await?;

        info!(
            report_id = updated.id,
            assignee_id = staff.id,
            category = %category,
            "Report approved and assigned"
        );

        Ok(updated)
    }

    /// Reject a pending report with a reason.
    pub async fn reject_report(
        &self,
        id: i64,
        reason: &str,
        caller_id: i64,
    ) -> AppResult<report::Model> {
        self.require_moderator(caller_id).await?;

        let existing = self.report_repo.get_by_id(id).await?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest(
                "Rejection reason is required".to_string(),
            ));
        }

        if existing.status != ReportStatus::PendingApproval {
            return Err(AppError::BadRequest(format!(
                "Cannot reject report with status {}. Only reports with status Pending Approval can be rejected.",
                existing.status
            )));
        }

        let mut model: report::ActiveModel = existing.clone().into();
        model.status = Set(ReportStatus::Rejected);
        model.rejection_reason = Set(Some(reason.to_string()));
        model.updated_at = Set(Utc::now().into());

        self.report_repo
            .update_with_version(model, existing.version)
            .await
    }

    // ========== Work transitions ==========

    /// Move an approved report between In Progress, Suspended and Resolved.
    ///
    /// Only the report's internal assignee, its external assignee, or
    /// technical staff may trigger these transitions.
    pub async fn update_status(
        &self,
        id: i64,
        target: ReportStatus,
        caller_id: i64,
    ) -> AppResult<report::Model> {
        let caller = self
            .user_repo
            .find_with_roles(caller_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let existing = self.report_repo.get_by_id(id).await?;

        if !matches!(
            target,
            ReportStatus::InProgress | ReportStatus::Suspended | ReportStatus::Resolved
        ) {
            return Err(AppError::BadRequest(format!(
                "Status {target} cannot be set directly. Use the approval or rejection operations."
            )));
        }

        let kinds = RoleKind::for_user(&caller);
        let is_assignee = existing.assignee_id == Some(caller.user.id);
        let is_external_assignee = existing.external_assignee_id == Some(caller.user.id);
        let is_technical_staff = kinds.iter().any(|k| k.is_technical_staff());

        if !is_assignee && !is_external_assignee && !is_technical_staff {
            return Err(AppError::InsufficientRights(
                "Only the report's assignee or technical staff can update its status".to_string(),
            ));
        }

        if !existing.status.can_transition_to(target) {
            return Err(AppError::BadRequest(format!(
                "Cannot change report status from {} to {}.",
                existing.status, target
            )));
        }

        let mut model: report::ActiveModel = existing.clone().into();
        model.status = Set(target);
        model.updated_at = Set(Utc::now().into());

        self.report_repo
            .update_with_version(model, existing.version)
            .await
    }

    /// Delegate an assigned report to an external maintainer.
    ///
    /// The target must hold the External Maintainer role and belong to a
    /// company registered for the report's category.
    pub async fn assign_to_external_maintainer(
        &self,
        report_id: i64,
        external_assignee_id: i64,
        caller_id: i64,
    ) -> AppResult<report::Model> {
        let existing = self.report_repo.get_by_id(report_id).await?;

        let caller = self
            .user_repo
            .find_with_roles(caller_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let kinds = RoleKind::for_user(&caller);
        if !kinds.iter().any(|k| k.is_technical_staff()) {
            return Err(AppError::InsufficientRights(
                "Only technical staff can delegate reports to external maintainers".to_string(),
            ));
        }

        if existing.status != ReportStatus::Assigned {
            return Err(AppError::BadRequest(format!(
                "Cannot delegate report with status {}. Only reports with status Assigned can be delegated.",
                existing.status
            )));
        }

        let target = self
            .user_repo
            .find_with_roles(external_assignee_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(external_assignee_id.to_string()))?;

        let target_kinds = RoleKind::for_user(&target);
        if !target_kinds.iter().any(|k| k.is_external()) {
            return Err(AppError::BadRequest(format!(
                "User {external_assignee_id} does not hold the External Maintainer role"
            )));
        }

        let company_id = target.user.company_id.ok_or_else(|| {
            AppError::BadRequest("External maintainer has no associated company".to_string())
        })?;

        let company = self
            .company_repo
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Company {company_id} not found")))?;

        if company.category != existing.category {
            return Err(AppError::BadRequest(format!(
                "Company category {} does not match report category {}",
                company.category, existing.category
            )));
        }

        let mut model: report::ActiveModel = existing.clone().into();
        model.external_assignee_id = Set(Some(external_assignee_id));
        model.updated_at = Set(Utc::now().into());

        let updated = self
            .report_repo
            .update_with_version(model, existing.version)
            .await?;

        info!(
            report_id = updated.id,
            external_assignee_id,
            "Report delegated to external maintainer"
        );

        Ok(updated)
    }

    // ========== Listings ==========

    /// List reports, with Pending Approval visibility restricted to the
    /// public relations office.
    pub async fn get_all_reports(
        &self,
        user_id: i64,
        status: Option<ReportStatus>,
        category: Option<ReportCategory>,
    ) -> AppResult<Vec<report::Model>> {
        let caller = self
            .user_repo
            .find_with_roles(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let kinds = RoleKind::for_user(&caller);
        if kinds.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let is_moderator = kinds.iter().any(|k| k.can_moderate());

        if status == Some(ReportStatus::PendingApproval) && !is_moderator {
            return Err(AppError::InsufficientRights(
                "Only a Municipal Public Relations Officer can view reports pending approval"
                    .to_string(),
            ));
        }

        let reports = self.report_repo.find_all(status, category).await?;

        // Defense in depth: even an unfiltered listing must not leak pending
        // reports to non-moderators.
        if status.is_none() && !is_moderator {
            return Ok(reports
                .into_iter()
                .filter(|r| r.status != ReportStatus::PendingApproval)
                .collect());
        }

        Ok(reports)
    }

    /// List the caller's assigned reports, branching on whether they work
    /// for the municipality or an external company.
    pub async fn get_my_assigned_reports(
        &self,
        user_id: i64,
        status: Option<ReportStatus>,
        category: Option<ReportCategory>,
    ) -> AppResult<Vec<report::Model>> {
        let caller = self
            .user_repo
            .find_with_roles(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let kinds = RoleKind::for_user(&caller);
        if kinds.iter().any(|k| k.is_external()) {
            self.report_repo
                .find_by_external_assignee(user_id, status)
                .await
        } else {
            self.report_repo
                .find_by_assignee(user_id, status, category)
                .await
        }
    }

    /// Get a report and its photos.
    pub async fn get_report(&self, id: i64) -> AppResult<ReportDetail> {
        let report = self.report_repo.get_by_id(id).await?;
        let photos = self.photo_repo.find_by_report_id(id).await?;
        Ok(ReportDetail { report, photos })
    }

    /// Find reports by address substring.
    pub async fn search_by_address(&self, address: &str) -> AppResult<Vec<report::Model>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::BadRequest("Address is required".to_string()));
        }
        self.report_repo.find_by_address(address).await
    }

    // ========== Map ==========

    /// Map data for a viewport: individual approved reports above the
    /// clustering threshold (or when zoom is omitted), grid clusters at or
    /// below it.
    pub async fn get_map_reports(&self, query: MapQuery) -> AppResult<MapData> {
        match query.zoom {
            Some(zoom) if zoom <= self.cluster_zoom_threshold => {
                let cell_size = self.grid_cell_size(zoom);
                let clusters = self
                    .report_repo
                    .cluster_by_grid(cell_size, query.bbox, query.category)
                    .await?;
                Ok(MapData::Clustered(clusters))
            }
            _ => {
                let records = self
                    .report_repo
                    .approved_for_map(query.bbox, query.category)
                    .await?;
                Ok(MapData::Individual(records))
            }
        }
    }

    /// Grid cell size for a zoom level: 0.01 degrees at the threshold,
    /// doubling for every level zoomed out.
    fn grid_cell_size(&self, zoom: u8) -> f64 {
        let levels_out = i32::from(self.cluster_zoom_threshold.saturating_sub(zoom));
        BASE_CELL_SIZE * 2f64.powi(levels_out)
    }

    // ========== Helpers ==========

    async fn require_moderator(&self, caller_id: i64) -> AppResult<UserWithRoles> {
        let caller = self
            .user_repo
            .find_with_roles(caller_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let kinds = RoleKind::for_user(&caller);
        if !kinds.iter().any(|k| k.can_moderate()) {
            return Err(AppError::InsufficientRights(
                "Only a Municipal Public Relations Officer can approve or reject reports"
                    .to_string(),
            ));
        }

        Ok(caller)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use civic_common::config::GeofenceConfig;
    use civic_db::entities::{category_role, company, role, user};
    use civic_db::repositories::CategoryRoleRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    const PHOTO: &str = "data:image/jpeg;base64,aGVsbG8=";

    struct StubStorage {
        fail_upload: bool,
        deleted: Mutex<Vec<i64>>,
    }

    impl StubStorage {
        fn new(fail_upload: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_upload,
                deleted: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl PhotoStorage for StubStorage {
        async fn upload_photo(&self, report_id: i64, _photo: &DecodedPhoto) -> AppResult<String> {
            if self.fail_upload {
                return Err(AppError::Storage("upload failed".to_string()));
            }
            Ok(format!("/photos/{report_id}/test.jpg"))
        }

        async fn delete_report_photos(&self, report_id: i64) -> AppResult<()> {
            self.deleted.lock().unwrap().push(report_id);
            Ok(())
        }
    }

    fn service(db: Arc<DatabaseConnection>, storage: Arc<StubStorage>) -> ReportService {
        ReportService::new(
            ReportRepository::new(Arc::clone(&db)),
            PhotoRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            CompanyRepository::new(Arc::clone(&db)),
            CategoryRoleResolver::new(CategoryRoleRepository::new(Arc::clone(&db))),
            StaffLoadBalancer::new(
                UserRepository::new(Arc::clone(&db)),
                ReportRepository::new(Arc::clone(&db)),
            ),
            storage,
            ServiceArea::from_config(&GeofenceConfig::default()),
            12,
        )
    }

    fn test_user(id: i64, company_id: Option<i64>) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            name: None,
            token: None,
            company_id,
            created_at: Utc::now().into(),
        }
    }

    fn test_role(name: &str) -> role::Model {
        role::Model {
            id: 1,
            name: name.to_string(),
            department: None,
        }
    }

    fn test_report(id: i64, status: ReportStatus) -> report::Model {
        report::Model {
            id,
            reporter_id: Some(1),
            title: "Streetlight out".to_string(),
            description: "The lamp post is dark".to_string(),
            category: ReportCategory::PublicLighting,
            latitude: 45.0703393,
            longitude: 7.6869005,
            address: None,
            is_anonymous: false,
            status,
            assignee_id: None,
            external_assignee_id: None,
            rejection_reason: None,
            version: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn assigned_report(id: i64, assignee_id: i64) -> report::Model {
        report::Model {
            status: ReportStatus::Assigned,
            assignee_id: Some(assignee_id),
            ..test_report(id, ReportStatus::Assigned)
        }
    }

    fn create_input(latitude: f64, longitude: f64, photos: Vec<String>) -> CreateReportInput {
        CreateReportInput {
            title: "Pothole on the corner".to_string(),
            description: "Deep pothole, dangerous for bikes".to_string(),
            category: ReportCategory::Roads,
            location: Some(LocationInput {
                latitude: Some(latitude),
                longitude: Some(longitude),
            }),
            address: None,
            photos,
            is_anonymous: false,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        let mut row = BTreeMap::new();
        row.insert("num_items", Value::BigInt(Some(n)));
        row
    }

    fn map_row(id: i64, latitude: f64, longitude: f64) -> BTreeMap<&'static str, Value> {
        let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();
        let mut row = BTreeMap::new();
        row.insert("A_id", Value::BigInt(Some(id)));
        row.insert("A_reporter_id", Value::BigInt(None));
        row.insert("A_title", Value::from(format!("Report {id}")));
        row.insert("A_description", Value::from("desc"));
        row.insert("A_category", Value::from("Public Lighting"));
        row.insert("A_latitude", Value::Double(Some(latitude)));
        row.insert("A_longitude", Value::Double(Some(longitude)));
        row.insert("A_address", Value::String(None));
        row.insert("A_is_anonymous", Value::Bool(Some(true)));
        row.insert("A_status", Value::from("Assigned"));
        row.insert("A_assignee_id", Value::BigInt(Some(2)));
        row.insert("A_external_assignee_id", Value::BigInt(None));
        row.insert("A_rejection_reason", Value::String(None));
        row.insert("A_version", Value::Int(Some(0)));
        row.insert("A_created_at", now.into());
        row.insert("A_updated_at", now.into());
        row
    }

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    // ===== Creation =====

    #[tokio::test]
    async fn test_create_report_outside_city_fails() {
        let svc = service(empty_db(), StubStorage::new(false));

        // Milan
        let err = svc
            .create_report(Some(1), create_input(45.464, 9.19, vec![PHOTO.to_string()]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("outside the city boundaries"));
    }

    #[tokio::test]
    async fn test_create_report_requires_one_to_three_photos() {
        let svc = service(empty_db(), StubStorage::new(false));

        let err = svc
            .create_report(Some(1), create_input(45.07, 7.68, Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let svc = service(empty_db(), StubStorage::new(false));
        let err = svc
            .create_report(
                Some(1),
                create_input(45.07, 7.68, vec![PHOTO.to_string(); 4]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_report_rejects_non_image_payload() {
        let svc = service(empty_db(), StubStorage::new(false));

        let err = svc
            .create_report(
                Some(1),
                create_input(45.07, 7.68, vec!["data:text/plain;base64,aGk=".to_string()]),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Unsupported photo type"));
    }

    #[tokio::test]
    async fn test_create_report_success() {
        let created = test_report(7, ReportStatus::PendingApproval);
        let photo_row = photo::Model {
            id: 1,
            report_id: 7,
            storage_url: "/photos/7/test.jpg".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .append_query_results([[photo_row]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let detail = svc
            .create_report(Some(1), create_input(45.07, 7.68, vec![PHOTO.to_string()]))
            .await
            .unwrap();

        assert_eq!(detail.report.status, ReportStatus::PendingApproval);
        assert_eq!(detail.photos.len(), 1);
    }

    #[tokio::test]
    async fn test_create_report_cleans_up_photos_on_failure() {
        let created = test_report(7, ReportStatus::PendingApproval);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .into_connection(),
        );

        let storage = StubStorage::new(true);
        let svc = service(db, Arc::clone(&storage));

        let err = svc
            .create_report(Some(1), create_input(45.07, 7.68, vec![PHOTO.to_string()]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(*storage.deleted.lock().unwrap(), vec![7]);
    }

    // ===== Approval =====

    #[tokio::test]
    async fn test_approve_requires_public_relations_officer() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(5, None)]])
                .append_query_results([[test_role("Citizen")]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc.approve_report(7, None, 5).await.unwrap_err();

        assert!(matches!(err, AppError::InsufficientRights(_)));
    }

    #[tokio::test]
    async fn test_approve_fails_when_not_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[assigned_report(7, 11)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc.approve_report(7, None, 2).await.unwrap_err();

        assert!(err.to_string().contains(
            "Cannot approve report with status Assigned. Only reports with status Pending Approval can be approved."
        ));
    }

    #[tokio::test]
    async fn test_approve_assigns_least_loaded_staff() {
        let mut approved = assigned_report(7, 11);
        approved.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(7, ReportStatus::PendingApproval)]])
                .append_query_results([[category_role::Model {
                    category: ReportCategory::PublicLighting,
                    role_id: 2,
                }]])
                .append_query_results([[test_user(11, None)]])
                .append_query_results([[count_row(0)]])
                .append_query_results([[approved]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let updated = svc.approve_report(7, None, 2).await.unwrap();

        assert_eq!(updated.status, ReportStatus::Assigned);
        assert_eq!(updated.assignee_id, Some(11));
        assert!(updated.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn test_approve_rejects_unknown_category_override() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(7, ReportStatus::PendingApproval)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .approve_report(7, Some("Potholes".to_string()), 2)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Invalid category: Potholes"));
    }

    #[tokio::test]
    async fn test_approve_fails_without_role_mapping() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(7, ReportStatus::PendingApproval)]])
                .append_query_results([Vec::<category_role::Model>::new()])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc.approve_report(7, None, 2).await.unwrap_err();

        assert!(
            err.to_string()
                .contains("No role mapping found for category: Public Lighting")
        );
    }

    #[tokio::test]
    async fn test_approve_fails_without_available_staff() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(7, ReportStatus::PendingApproval)]])
                .append_query_results([[category_role::Model {
                    category: ReportCategory::PublicLighting,
                    role_id: 2,
                }]])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc.approve_report(7, None, 2).await.unwrap_err();

        assert!(
            err.to_string()
                .contains("No available technical staff found for category: Public Lighting")
        );
    }

    // ===== Rejection =====

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(7, ReportStatus::PendingApproval)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc.reject_report(7, "   ", 2).await.unwrap_err();

        assert!(err.to_string().contains("Rejection reason is required"));
    }

    #[tokio::test]
    async fn test_reject_sets_reason() {
        let mut rejected = test_report(7, ReportStatus::Rejected);
        rejected.rejection_reason = Some("Duplicate".to_string());
        rejected.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(7, ReportStatus::PendingApproval)]])
                .append_query_results([[rejected]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let updated = svc.reject_report(7, "Duplicate", 2).await.unwrap();

        assert_eq!(updated.status, ReportStatus::Rejected);
        assert_eq!(updated.rejection_reason.as_deref(), Some("Duplicate"));
    }

    #[tokio::test]
    async fn test_reject_fails_when_not_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(7, ReportStatus::Rejected)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc.reject_report(7, "Duplicate", 2).await.unwrap_err();

        assert!(err.to_string().contains("Cannot reject report with status Rejected"));
    }

    // ===== Work transitions =====

    #[tokio::test]
    async fn test_non_assigned_external_maintainer_cannot_resolve() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(20, Some(5))]])
                .append_query_results([[test_role("External Maintainer")]])
                .append_query_results([[assigned_report(7, 11)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .update_status(7, ReportStatus::Resolved, 20)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientRights(_)));
    }

    #[tokio::test]
    async fn test_assignee_can_resolve() {
        let mut resolved = assigned_report(7, 11);
        resolved.status = ReportStatus::Resolved;
        resolved.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(11, None)]])
                .append_query_results([[test_role("Technical Manager")]])
                .append_query_results([[assigned_report(7, 11)]])
                .append_query_results([[resolved]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let updated = svc.update_status(7, ReportStatus::Resolved, 11).await.unwrap();

        assert_eq!(updated.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_pending_report_cannot_be_resolved() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(11, None)]])
                .append_query_results([[test_role("Technical Manager")]])
                .append_query_results([[test_report(7, ReportStatus::PendingApproval)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .update_status(7, ReportStatus::Resolved, 11)
            .await
            .unwrap_err();

        assert!(
            err.to_string()
                .contains("Cannot change report status from Pending Approval to Resolved.")
        );
    }

    #[tokio::test]
    async fn test_concurrent_transition_loser_observes_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(11, None)]])
                .append_query_results([[test_role("Technical Manager")]])
                .append_query_results([[assigned_report(7, 11)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .update_status(7, ReportStatus::Resolved, 11)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    // ===== External delegation =====

    fn delegation_db(
        report: report::Model,
        target_company: Option<company::Model>,
    ) -> MockDatabase {
        let mut db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report]])
            .append_query_results([[test_user(2, None)]])
            .append_query_results([[test_role("Technical Manager")]])
            .append_query_results([[test_user(30, Some(5))]])
            .append_query_results([[test_role("External Maintainer")]]);
        if let Some(company) = target_company {
            db = db.append_query_results([[company]]);
        }
        db
    }

    #[tokio::test]
    async fn test_delegation_fails_on_company_category_mismatch() {
        let db = Arc::new(
            delegation_db(
                assigned_report(7, 2),
                Some(company::Model {
                    id: 5,
                    name: "Rifiuti Srl".to_string(),
                    category: ReportCategory::Waste,
                }),
            )
            .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .assign_to_external_maintainer(7, 30, 2)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("does not match report category"));
    }

    #[tokio::test]
    async fn test_delegation_sets_external_assignee() {
        let mut delegated = assigned_report(7, 2);
        delegated.external_assignee_id = Some(30);
        delegated.version = 1;

        let db = Arc::new(
            delegation_db(
                assigned_report(7, 2),
                Some(company::Model {
                    id: 5,
                    name: "Lumen Servizi".to_string(),
                    category: ReportCategory::PublicLighting,
                }),
            )
            .append_query_results([[delegated]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let updated = svc.assign_to_external_maintainer(7, 30, 2).await.unwrap();

        assert_eq!(updated.external_assignee_id, Some(30));
    }

    #[tokio::test]
    async fn test_delegation_requires_technical_staff() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[assigned_report(7, 2)]])
                .append_query_results([[test_user(9, None)]])
                .append_query_results([[test_role("Citizen")]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .assign_to_external_maintainer(7, 30, 9)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientRights(_)));
    }

    #[tokio::test]
    async fn test_delegation_requires_assigned_status() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_report(7, ReportStatus::InProgress)]])
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Technical Manager")]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .assign_to_external_maintainer(7, 30, 2)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Cannot delegate report with status In Progress"));
    }

    #[tokio::test]
    async fn test_delegation_requires_external_maintainer_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[assigned_report(7, 2)]])
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Technical Manager")]])
                .append_query_results([[test_user(30, Some(5))]])
                .append_query_results([[test_role("Citizen")]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .assign_to_external_maintainer(7, 30, 2)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("does not hold the External Maintainer role"));
    }

    #[tokio::test]
    async fn test_delegation_requires_company() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[assigned_report(7, 2)]])
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Technical Manager")]])
                .append_query_results([[test_user(30, None)]])
                .append_query_results([[test_role("External Maintainer")]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .assign_to_external_maintainer(7, 30, 2)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no associated company"));
    }

    // ===== Listings =====

    #[tokio::test]
    async fn test_get_all_pending_requires_moderator() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(5, None)]])
                .append_query_results([[test_role("Citizen")]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc
            .get_all_reports(5, Some(ReportStatus::PendingApproval), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientRights(_)));
    }

    #[tokio::test]
    async fn test_get_all_strips_pending_for_non_moderators() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(5, None)]])
                .append_query_results([[test_role("Citizen")]])
                .append_query_results([[
                    test_report(1, ReportStatus::PendingApproval),
                    test_report(2, ReportStatus::Assigned),
                ]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let reports = svc.get_all_reports(5, None, None).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, 2);
    }

    #[tokio::test]
    async fn test_get_all_pending_for_moderator() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(2, None)]])
                .append_query_results([[test_role("Municipal Public Relations Officer")]])
                .append_query_results([[test_report(1, ReportStatus::PendingApproval)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let reports = svc
            .get_all_reports(2, Some(ReportStatus::PendingApproval), None)
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, ReportStatus::PendingApproval);
    }

    #[tokio::test]
    async fn test_get_all_unknown_user_is_unauthorized() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let err = svc.get_all_reports(99, None, None).await.unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_get_my_assigned_branches_for_external_maintainer() {
        let mut delegated = assigned_report(7, 11);
        delegated.external_assignee_id = Some(30);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(30, Some(5))]])
                .append_query_results([[test_role("External Maintainer")]])
                .append_query_results([[delegated]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let reports = svc.get_my_assigned_reports(30, None, None).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].external_assignee_id, Some(30));
    }

    // ===== Map =====

    #[tokio::test]
    async fn test_map_without_zoom_returns_individual_reports() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[map_row(1, 45.07, 7.68)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let data = svc.get_map_reports(MapQuery::default()).await.unwrap();

        match data {
            MapData::Individual(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].reporter_name, "Anonymous");
            }
            MapData::Clustered(_) => panic!("expected individual reports"),
        }
    }

    #[tokio::test]
    async fn test_map_at_low_zoom_returns_clusters() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[map_row(1, 45.071, 7.681), map_row(2, 45.072, 7.682)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let data = svc
            .get_map_reports(MapQuery {
                zoom: Some(10),
                bbox: None,
                category: None,
            })
            .await
            .unwrap();

        match data {
            MapData::Clustered(clusters) => {
                assert_eq!(clusters.len(), 1);
                assert_eq!(clusters[0].report_count, 2);
                assert_eq!(clusters[0].report_ids, vec![1, 2]);
            }
            MapData::Individual(_) => panic!("expected clusters"),
        }
    }

    #[tokio::test]
    async fn test_map_above_threshold_returns_individual_reports() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[map_row(1, 45.07, 7.68)]])
                .into_connection(),
        );

        let svc = service(db, StubStorage::new(false));
        let data = svc
            .get_map_reports(MapQuery {
                zoom: Some(15),
                bbox: None,
                category: None,
            })
            .await
            .unwrap();

        assert!(matches!(data, MapData::Individual(_)));
    }

    #[test]
    fn test_grid_cell_size_doubles_per_level_out() {
        let svc = service(empty_db(), StubStorage::new(false));
        assert!((svc.grid_cell_size(12) - 0.01).abs() < 1e-12);
        assert!((svc.grid_cell_size(11) - 0.02).abs() < 1e-12);
        assert!((svc.grid_cell_size(10) - 0.04).abs() < 1e-12);
    }
}
