//! Internal comment repository.

use std::sync::Arc;

use crate::entities::{InternalComment, internal_comment};
use civic_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

/// Internal comment repository for database operations.
#[derive(Clone)]
pub struct InternalCommentRepository {
    db: Arc<DatabaseConnection>,
}

impl InternalCommentRepository {
    /// Create a new internal comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert an internal comment.
    pub async fn create(
        &self,
        model: internal_comment::ActiveModel,
    ) -> AppResult<internal_comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<internal_comment::Model>> {
        InternalComment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List comments belonging to a report, oldest first.
    pub async fn find_by_report_id(
        &self,
        report_id: i64,
    ) -> AppResult<Vec<internal_comment::Model>> {
        InternalComment::find()
            .filter(internal_comment::Column::ReportId.eq(report_id))
            .order_by_asc(internal_comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment.
    pub async fn delete(&self, model: internal_comment::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_report_id() {
        let comment = internal_comment::Model {
            id: 1,
            report_id: 7,
            author_id: 2,
            content: "Checked on site".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment]])
                .into_connection(),
        );

        let repo = InternalCommentRepository::new(db);
        let comments = repo.find_by_report_id(7).await.unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author_id, 2);
    }
}
