//! Wire row types for the hosted backend, and conversions into domain
//! models.
//!
//! Field names match the remote tables exactly (`courses`, `lessons`,
//! `enrollments`, `reviews`, `profiles`); the backend owns those schemas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use learnhub_core::{CourseId, LessonId, LessonKind, Price, ReviewId, Role, UserId};

use crate::models::{Course, EnrolledCourse, Lesson, Review};

// =============================================================================
// Auth (GoTrue)
// =============================================================================

/// Metadata attached to the auth identity at registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// The raw authenticated identity as returned by the auth provider.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// An established session: access token plus the identity it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

// =============================================================================
// Courses & lessons (PostgREST)
// =============================================================================

/// A `courses` row, optionally with embedded `lessons` rows.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseRow {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub instructor_id: UserId,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lessons: Vec<LessonRow>,
}

/// A `lessons` row.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonRow {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: LessonKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub duration: String,
    pub order: u32,
}

/// Course fields sent on insert.
#[derive(Debug, Clone, Serialize)]
pub struct NewCourseRow {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub thumbnail: Option<String>,
    pub instructor_id: UserId,
    pub published: bool,
}

/// Course fields sent on update.
#[derive(Debug, Clone, Serialize)]
pub struct CourseChanges {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub thumbnail: Option<String>,
    pub published: bool,
}

/// A lesson row as sent in an insert or upsert batch.
///
/// `id` is omitted from the payload for new lessons so the backend assigns
/// a fresh identifier; for existing lessons it is passed through unchanged,
/// turning the upsert into an update-in-place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonUpsertRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LessonId>,
    pub course_id: CourseId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: LessonKind,
    pub url: String,
    pub duration: String,
    /// 1-based position; always reassigned from list position.
    pub order: u32,
}

/// Bare `{"id": ...}` projection used by the reconciliation fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonIdRow {
    pub id: LessonId,
}

// =============================================================================
// Enrollments
// =============================================================================

/// Enrollment fields sent on insert.
#[derive(Debug, Clone, Serialize)]
pub struct NewEnrollmentRow {
    pub user_id: UserId,
    pub course_id: CourseId,
}

/// An `enrollments` row joined with its course and a lesson count.
///
/// `courses` is `None` when the course no longer exists; such rows are
/// quietly dropped by the listing.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentJoinRow {
    pub course_id: CourseId,
    #[serde(default)]
    pub progress: i32,
    pub courses: Option<EnrolledCourseRow>,
}

/// The course half of an enrollment join; `lessons(count)` comes back as a
/// single-element array of counts.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrolledCourseRow {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub instructor_id: UserId,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lessons: Vec<LessonCountRow>,
}

/// PostgREST aggregate projection `lessons(count)`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LessonCountRow {
    pub count: u32,
}

/// Bare key projection used by the enrollment existence check.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EnrollmentKeyRow {
    pub user_id: UserId,
}

// =============================================================================
// Profiles
// =============================================================================

/// A `profiles` row.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProfileRow {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Profile fields sent on upsert.
///
/// `role` is only ever set by the self-healing path on course creation;
/// profile edits never carry it, keeping role immutable through them.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpsert {
    pub id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Bare `{"email": ...}` projection used by username login resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileEmailRow {
    #[serde(default)]
    pub email: Option<String>,
}

// =============================================================================
// Reviews
// =============================================================================

/// Review fields sent on insert.
#[derive(Debug, Clone, Serialize)]
pub struct NewReviewRow {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub rating: u8,
    pub comment: String,
}

/// A `reviews` row joined with the author's public profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub course_id: CourseId,
    pub user_id: UserId,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub profiles: Option<ReviewAuthorRow>,
}

/// The embedded author projection on a review.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewAuthorRow {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// =============================================================================
// Conversions
// =============================================================================

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            kind: row.kind,
            url: row.url,
            duration: row.duration,
            order: row.order,
        }
    }
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        let mut lessons: Vec<Lesson> = row.lessons.into_iter().map(Lesson::from).collect();
        lessons.sort_by_key(|lesson| lesson.order);

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            price: Price::new(row.price),
            thumbnail: row.thumbnail,
            instructor_id: row.instructor_id,
            published: row.published,
            created_at: row.created_at,
            lessons,
        }
    }
}

impl EnrollmentJoinRow {
    /// Convert to the domain model, or `None` when the course is gone.
    #[must_use]
    pub fn into_enrolled(self) -> Option<EnrolledCourse> {
        let row = self.courses?;
        let total_lessons = row.lessons.first().map_or(0, |c| c.count);

        Some(EnrolledCourse {
            course: Course {
                id: row.id,
                title: row.title,
                description: row.description,
                category: row.category,
                price: Price::new(row.price),
                thumbnail: row.thumbnail,
                instructor_id: row.instructor_id,
                published: row.published,
                created_at: row.created_at,
                lessons: Vec::new(),
            },
            progress: self.progress,
            total_lessons,
        })
    }
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        let (author_username, author_avatar) = row
            .profiles
            .map_or((None, None), |author| (author.username, author.avatar_url));

        Self {
            id: row.id,
            course_id: row.course_id,
            user_id: row.user_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            author_username,
            author_avatar,
        }
    }
}
