//! Company registry repository.

use std::sync::Arc;

use crate::entities::{Company, company};
use civic_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Company repository for database operations.
#[derive(Clone)]
pub struct CompanyRepository {
    db: Arc<DatabaseConnection>,
}

impl CompanyRepository {
    /// Create a new company repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a company by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<company::Model>> {
        Company::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::report::ReportCategory;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_id() {
        let company = company::Model {
            id: 1,
            name: "Lumen Servizi".to_string(),
            category: ReportCategory::PublicLighting,
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[company]])
                .into_connection(),
        );

        let repo = CompanyRepository::new(db);
        let found = repo.find_by_id(1).await.unwrap().unwrap();

        assert_eq!(found.category, ReportCategory::PublicLighting);
    }
}
