//! User repository.
//!
//! The report engine consumes users for authorization checks and staff
//! selection; account CRUD lives elsewhere.

use std::sync::Arc;

use crate::entities::{Role, User, role, user, user_role};
use civic_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};

/// A user together with their department-role assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWithRoles {
    /// The user record.
    pub user: user::Model,
    /// Roles held by the user.
    pub roles: Vec<role::Model>,
}

impl UserWithRoles {
    /// Names of the roles held by the user.
    #[must_use]
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user and their roles by id.
    pub async fn find_with_roles(&self, id: i64) -> AppResult<Option<UserWithRoles>> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let roles = user
            .find_related(Role)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(UserWithRoles { user, roles }))
    }

    /// Get a user and their roles, failing when the user is absent.
    pub async fn get_with_roles(&self, id: i64) -> AppResult<UserWithRoles> {
        self.find_with_roles(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// List users holding the given role.
    pub async fn find_by_role_id(&self, role_id: i64) -> AppResult<Vec<user::Model>> {
        User::find()
            .join(JoinType::InnerJoin, user::Relation::UserRoles.def())
            .filter(user_role::Column::RoleId.eq(role_id))
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Resolve a user from a bearer token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
