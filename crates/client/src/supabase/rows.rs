//! Row CRUD against the PostgREST endpoint.
//!
//! One impl block per table concern, all on the shared client. Filters use
//! PostgREST operator syntax (`id=eq.{uuid}`, `id=in.(a,b)`); writes that
//! need the stored row back send `Prefer: return=representation`.

use reqwest::Method;

use learnhub_core::{CourseId, LessonId, ReviewId, UserId};

use super::types::{
    CourseChanges, CourseRow, EnrollmentJoinRow, EnrollmentKeyRow, LessonIdRow, LessonUpsertRow,
    NewCourseRow, NewEnrollmentRow, NewReviewRow, ProfileEmailRow, ProfileRow, ProfileUpsert,
    ReviewRow,
};
use super::{SupabaseClient, SupabaseError};

/// Ask PostgREST to return the affected rows.
const RETURN_REPRESENTATION: &str = "return=representation";

/// Turn an insert into an upsert on primary-key conflicts.
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=minimal";

/// Columns selected for a review joined with its author.
const REVIEW_SELECT: &str = "id,course_id,user_id,rating,comment,created_at,profiles(username,avatar_url)";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

// =============================================================================
// Courses
// =============================================================================

impl SupabaseClient {
    /// Fetch all published courses with their lessons embedded.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn select_published_courses(&self) -> Result<Vec<CourseRow>, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("courses"))
            .await
            .query(&[("select", "*,lessons(*)"), ("published", "eq.true")]);
        self.send_json(request).await
    }

    /// Fetch every course with lessons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn select_all_courses(&self) -> Result<Vec<CourseRow>, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("courses"))
            .await
            .query(&[("select", "*,lessons(*)"), ("order", "created_at.desc")]);
        self.send_json(request).await
    }

    /// Insert a course row and return it with its generated id.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the insert fails or the backend returns
    /// no representation.
    pub async fn insert_course(&self, row: &NewCourseRow) -> Result<CourseRow, SupabaseError> {
        let request = self
            .request(Method::POST, self.rest_url("courses"))
            .await
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row]);
        let mut rows: Vec<CourseRow> = self.send_json(request).await?;

        rows.pop()
            .ok_or_else(|| SupabaseError::NotFound("inserted course row".to_string()))
    }

    /// Update a course's scalar fields.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn update_course(
        &self,
        id: CourseId,
        changes: &CourseChanges,
    ) -> Result<(), SupabaseError> {
        let request = self
            .request(Method::PATCH, self.rest_url("courses"))
            .await
            .query(&[("id", eq(id))])
            .json(changes);
        self.send_ok(request).await
    }

    /// Delete a course row.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn delete_course(&self, id: CourseId) -> Result<(), SupabaseError> {
        let request = self
            .request(Method::DELETE, self.rest_url("courses"))
            .await
            .query(&[("id", eq(id))]);
        self.send_ok(request).await
    }
}

// =============================================================================
// Lessons
// =============================================================================

impl SupabaseClient {
    /// Fetch the ids of the lessons currently persisted for a course.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn select_lesson_ids(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<LessonId>, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("lessons"))
            .await
            .query(&[("select", "id".to_string()), ("course_id", eq(course_id))]);
        let rows: Vec<LessonIdRow> = self.send_json(request).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    /// Delete a batch of lessons in one call.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn delete_lessons(&self, ids: &[LessonId]) -> Result<(), SupabaseError> {
        if ids.is_empty() {
            return Ok(());
        }

        let id_list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .request(Method::DELETE, self.rest_url("lessons"))
            .await
            .query(&[("id", format!("in.({id_list})"))]);
        self.send_ok(request).await
    }

    /// Insert a fresh batch of lesson rows.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn insert_lessons(&self, rows: &[LessonUpsertRow]) -> Result<(), SupabaseError> {
        if rows.is_empty() {
            return Ok(());
        }

        let request = self
            .request(Method::POST, self.rest_url("lessons"))
            .await
            .json(rows);
        self.send_ok(request).await
    }

    /// Apply an upsert batch: rows with ids update in place, rows without
    /// get fresh identifiers.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn upsert_lessons(&self, rows: &[LessonUpsertRow]) -> Result<(), SupabaseError> {
        if rows.is_empty() {
            return Ok(());
        }

        let request = self
            .request(Method::POST, self.rest_url("lessons"))
            .await
            .header("Prefer", MERGE_DUPLICATES)
            .json(rows);
        self.send_ok(request).await
    }
}

// =============================================================================
// Enrollments
// =============================================================================

impl SupabaseClient {
    /// Insert an enrollment join row.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on failure; a unique-constraint violation
    /// (already enrolled) is distinguishable via
    /// [`SupabaseError::is_unique_violation`].
    pub async fn insert_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<(), SupabaseError> {
        let row = NewEnrollmentRow { user_id, course_id };
        let request = self
            .request(Method::POST, self.rest_url("enrollments"))
            .await
            .json(&[row]);
        self.send_ok(request).await
    }

    /// Whether an enrollment row exists for the (user, course) pair.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn enrollment_exists(
        &self,
        course_id: CourseId,
        user_id: UserId,
    ) -> Result<bool, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("enrollments"))
            .await
            .query(&[
                ("select", "user_id".to_string()),
                ("course_id", eq(course_id)),
                ("user_id", eq(user_id)),
                ("limit", "1".to_string()),
            ]);
        let rows: Vec<EnrollmentKeyRow> = self.send_json(request).await?;
        Ok(!rows.is_empty())
    }

    /// Fetch a user's enrollments joined with course rows and lesson counts.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn select_enrollments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<EnrollmentJoinRow>, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("enrollments"))
            .await
            .query(&[
                (
                    "select",
                    "course_id,progress,courses(*,lessons(count))".to_string(),
                ),
                ("user_id", eq(user_id)),
            ]);
        self.send_json(request).await
    }
}

// =============================================================================
// Profiles
// =============================================================================

impl SupabaseClient {
    /// Fetch the profile row for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure; a missing row
    /// is `Ok(None)`, never an error.
    pub async fn select_profile(
        &self,
        user_id: UserId,
    ) -> Result<Option<ProfileRow>, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("profiles"))
            .await
            .query(&[
                ("select", "*".to_string()),
                ("id", eq(user_id)),
                ("limit", "1".to_string()),
            ]);
        let mut rows: Vec<ProfileRow> = self.send_json(request).await?;
        Ok(rows.pop())
    }

    /// Insert or update a profile row keyed by the user id.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<(), SupabaseError> {
        let request = self
            .request(Method::POST, self.rest_url("profiles"))
            .await
            .header("Prefer", MERGE_DUPLICATES)
            .json(&[profile]);
        self.send_ok(request).await
    }

    /// Resolve a username to the email stored on its profile.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn lookup_email_by_username(
        &self,
        username: &str,
    ) -> Result<Option<String>, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("profiles"))
            .await
            .query(&[
                ("select", "email".to_string()),
                ("username", format!("eq.{username}")),
                ("limit", "1".to_string()),
            ]);
        let mut rows: Vec<ProfileEmailRow> = self.send_json(request).await?;
        Ok(rows.pop().and_then(|row| row.email))
    }
}

// =============================================================================
// Reviews
// =============================================================================

impl SupabaseClient {
    /// Fetch a course's reviews with author profiles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn select_reviews(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<ReviewRow>, SupabaseError> {
        let request = self
            .request(Method::GET, self.rest_url("reviews"))
            .await
            .query(&[
                ("select", REVIEW_SELECT.to_string()),
                ("course_id", eq(course_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        self.send_json(request).await
    }

    /// Insert a review and return it joined with the author profile.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the insert fails or the backend returns
    /// no representation.
    pub async fn insert_review(&self, row: &NewReviewRow) -> Result<ReviewRow, SupabaseError> {
        let request = self
            .request(Method::POST, self.rest_url("reviews"))
            .await
            .query(&[("select", REVIEW_SELECT)])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row]);
        let mut rows: Vec<ReviewRow> = self.send_json(request).await?;

        rows.pop()
            .ok_or_else(|| SupabaseError::NotFound("inserted review row".to_string()))
    }

    /// Delete a review row.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport or API failure.
    pub async fn delete_review(&self, id: ReviewId) -> Result<(), SupabaseError> {
        let request = self
            .request(Method::DELETE, self.rest_url("reviews"))
            .await
            .query(&[("id", eq(id))]);
        self.send_ok(request).await
    }
}
