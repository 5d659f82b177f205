//! Staff assignment: category-to-role resolution and load balancing.

use civic_common::AppResult;
use civic_db::{
    entities::{report::ReportCategory, user},
    repositories::{CategoryRoleRepository, ReportRepository, UserRepository},
};

/// Resolves the department role responsible for a report category.
#[derive(Clone)]
pub struct CategoryRoleResolver {
    category_role_repo: CategoryRoleRepository,
}

impl CategoryRoleResolver {
    /// Create a new resolver.
    #[must_use]
    pub const fn new(category_role_repo: CategoryRoleRepository) -> Self {
        Self { category_role_repo }
    }

    /// The role configured for a category, or `None` when unconfigured.
    pub async fn role_id_for_category(
        &self,
        category: ReportCategory,
    ) -> AppResult<Option<i64>> {
        self.category_role_repo.find_role_id(category).await
    }
}

/// Picks the least-loaded staff member holding a given role.
#[derive(Clone)]
pub struct StaffLoadBalancer {
    user_repo: UserRepository,
    report_repo: ReportRepository,
}

impl StaffLoadBalancer {
    /// Create a new load balancer.
    #[must_use]
    pub const fn new(user_repo: UserRepository, report_repo: ReportRepository) -> Self {
        Self {
            user_repo,
            report_repo,
        }
    }

    /// The member of the role with the fewest open assigned reports.
    ///
    /// Ties go to the lowest user id; returns `None` when the role has no
    /// members.
    pub async fn find_available_staff(&self, role_id: i64) -> AppResult<Option<user::Model>> {
        let members = self.user_repo.find_by_role_id(role_id).await?;

        let mut best: Option<(u64, user::Model)> = None;
        for member in members {
            let open = self.report_repo.count_open_by_assignee(member.id).await?;
            match &best {
                Some((fewest, _)) if open >= *fewest => {}
                _ => best = Some((open, member)),
            }
        }

        Ok(best.map(|(_, member)| member))
    }
}
