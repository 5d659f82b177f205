//! Category-to-role mapping repository.

use std::sync::Arc;

use crate::entities::{CategoryRole, report::ReportCategory};
use civic_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Category-role mapping repository.
#[derive(Clone)]
pub struct CategoryRoleRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRoleRepository {
    /// Create a new category-role repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the role configured to handle a category.
    pub async fn find_role_id(&self, category: ReportCategory) -> AppResult<Option<i64>> {
        let mapping = CategoryRole::find_by_id(category)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(mapping.map(|m| m.role_id))
    }
}
