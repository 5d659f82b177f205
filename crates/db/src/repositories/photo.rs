//! Photo repository.

use std::sync::Arc;

use crate::entities::{Photo, photo};
use civic_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Photo repository for database operations.
#[derive(Clone)]
pub struct PhotoRepository {
    db: Arc<DatabaseConnection>,
}

impl PhotoRepository {
    /// Create a new photo repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a photo record.
    pub async fn create(&self, model: photo::ActiveModel) -> AppResult<photo::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List photos belonging to a report.
    pub async fn find_by_report_id(&self, report_id: i64) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .filter(photo::Column::ReportId.eq(report_id))
            .order_by_asc(photo::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every photo record belonging to a report.
    pub async fn delete_by_report_id(&self, report_id: i64) -> AppResult<u64> {
        let result = Photo::delete_many()
            .filter(photo::Column::ReportId.eq(report_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
