use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::AppRole;

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Which dashboard a signed-in user is shown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DashboardView {
    Admin,
    Moderator,
    User,
}

/// Picks the dashboard from a role set. Admin outranks moderator.
pub fn dashboard_view(roles: &[AppRole]) -> DashboardView {
    if roles.contains(&AppRole::Admin) {
        DashboardView::Admin
    } else if roles.contains(&AppRole::Moderator) {
        DashboardView::Moderator
    } else {
        DashboardView::User
    }
}

/// Single role-table existence check used to gate admin-only routes.
pub async fn is_admin(db: &DatabaseService, user_id: Uuid) -> Result<bool, Error> {
    db.has_role(user_id, AppRole::Admin).await
}
