//! The authenticated user as seen by the application.

use learnhub_core::{Role, UserId};

/// The signed-in identity merged with its profile row.
///
/// Produced by [`crate::session::merge_profile`]; profile fields take
/// precedence over auth metadata for the listed fields only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl CurrentUser {
    /// Display name preferring username, then email, then the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Whether this user may author courses.
    #[must_use]
    pub const fn is_instructor(&self) -> bool {
        matches!(self.role, Role::Instructor)
    }
}
