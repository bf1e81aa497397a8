//! Course review model.

use chrono::{DateTime, Utc};
use learnhub_core::{CourseId, ReviewId, UserId};

/// A review with its author's public profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub course_id: CourseId,
    pub user_id: UserId,
    /// Integer rating, 1-5.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub author_username: Option<String>,
    pub author_avatar: Option<String>,
}
