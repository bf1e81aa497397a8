//! Course repository: in-memory catalog cache plus mutation operations.
//!
//! The hosted backend is the source of truth; the cache is a whole-list
//! snapshot refreshed after every mutation. Multiple in-flight operations
//! are not mutually excluded - the last response to resolve wins the cache,
//! matching the single-session client model.

pub mod reconcile;

pub use reconcile::ReconcilePlan;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use learnhub_core::{CourseId, Role, UserId};

use crate::error::{AppError, Result};
use crate::models::{Course, CourseDraft, CurrentUser, EnrolledCourse};
use crate::supabase::types::{CourseChanges, NewCourseRow, ProfileUpsert};
use crate::supabase::SupabaseClient;

/// Course repository shared across the application.
#[derive(Clone)]
pub struct CourseStore {
    inner: Arc<CourseStoreInner>,
}

struct CourseStoreInner {
    supabase: SupabaseClient,
    catalog: RwLock<Vec<Course>>,
}

impl CourseStore {
    /// Create an empty store over the backend client.
    #[must_use]
    pub fn new(supabase: SupabaseClient) -> Self {
        Self {
            inner: Arc::new(CourseStoreInner {
                supabase,
                catalog: RwLock::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // Catalog cache
    // =========================================================================

    /// Load published courses (with lessons) into the cache.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the fetch fails; the cache keeps its
    /// previous contents in that case.
    pub async fn fetch_published(&self) -> Result<()> {
        let rows = self.inner.supabase.select_published_courses().await?;
        let courses: Vec<Course> = rows.into_iter().map(Course::from).collect();

        debug!(count = courses.len(), "loaded published catalog");
        *self.inner.catalog.write().await = courses;
        Ok(())
    }

    /// Reload the full course list, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the fetch fails.
    pub async fn refresh(&self) -> Result<()> {
        let rows = self.inner.supabase.select_all_courses().await?;
        let courses: Vec<Course> = rows.into_iter().map(Course::from).collect();

        debug!(count = courses.len(), "refreshed course list");
        *self.inner.catalog.write().await = courses;
        Ok(())
    }

    /// Refresh after a mutation. The mutation already succeeded, so a
    /// failed reload only logs: the next refresh heals the cache.
    async fn refresh_after_mutation(&self) {
        if let Err(err) = self.refresh().await {
            error!(error = %err, "course list refresh failed after mutation");
        }
    }

    /// Snapshot of the cached catalog.
    pub async fn catalog(&self) -> Vec<Course> {
        self.inner.catalog.read().await.clone()
    }

    /// Look up a cached course by id.
    pub async fn get(&self, id: CourseId) -> Option<Course> {
        self.inner
            .catalog
            .read()
            .await
            .iter()
            .find(|course| course.id == id)
            .cloned()
    }

    /// Cached courses owned by an instructor.
    pub async fn by_instructor(&self, instructor_id: UserId) -> Vec<Course> {
        self.inner
            .catalog
            .read()
            .await
            .iter()
            .filter(|course| course.instructor_id == instructor_id)
            .cloned()
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Persist a new course owned by the given user.
    ///
    /// Self-heals a missing profile row first (a race between account
    /// creation and profile-row creation can leave it absent), then inserts
    /// the course, then its lessons as a fresh batch ordered `1..n`.
    ///
    /// The writes are sequential remote calls with no transaction; a
    /// failure partway leaves partial state (at worst an unpublished course
    /// row without lessons).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when `owner` is absent, otherwise
    /// re-throws the first failing remote call.
    pub async fn create_course(
        &self,
        owner: Option<&CurrentUser>,
        draft: &CourseDraft,
    ) -> Result<Course> {
        let owner =
            owner.ok_or_else(|| AppError::Validation("owning user id is missing".to_string()))?;

        self.ensure_owner_profile(owner).await?;

        let row = NewCourseRow {
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            price: draft.price.amount(),
            thumbnail: draft.thumbnail.clone(),
            instructor_id: owner.id,
            published: draft.published,
        };
        let inserted = self.inner.supabase.insert_course(&row).await.map_err(|err| {
            error!(error = %err, "course insert failed");
            err
        })?;
        debug!(course = %inserted.id, "course row created");

        if !draft.lessons.is_empty() {
            let batch = reconcile::fresh_batch(inserted.id, &draft.lessons);
            self.inner.supabase.insert_lessons(&batch).await.map_err(|err| {
                error!(error = %err, course = %inserted.id, "lesson insert failed");
                err
            })?;
        }

        self.refresh_after_mutation().await;
        Ok(Course::from(inserted))
    }

    /// Update a course's fields and reconcile its lesson list.
    ///
    /// Reconciliation assumes no concurrent writer touches the same
    /// course's lessons during the delete-then-upsert window; a concurrent
    /// editor could observe or cause lost updates. There is no version
    /// token to detect this.
    ///
    /// # Errors
    ///
    /// Re-throws the first failing remote call; no partial rollback is
    /// attempted (the operation is not atomic).
    pub async fn update_course(&self, id: CourseId, draft: &CourseDraft) -> Result<()> {
        let changes = CourseChanges {
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            price: draft.price.amount(),
            thumbnail: draft.thumbnail.clone(),
            published: draft.published,
        };
        self.inner.supabase.update_course(id, &changes).await.map_err(|err| {
            error!(error = %err, course = %id, "course update failed");
            err
        })?;

        let persisted = self.inner.supabase.select_lesson_ids(id).await?;
        let plan = ReconcilePlan::build(id, &persisted, &draft.lessons);

        if !plan.delete.is_empty() {
            debug!(course = %id, count = plan.delete.len(), "deleting removed lessons");
            self.inner.supabase.delete_lessons(&plan.delete).await.map_err(|err| {
                error!(error = %err, course = %id, "lesson delete failed");
                err
            })?;
        }

        debug!(course = %id, count = plan.upserts.len(), "upserting lessons");
        self.inner.supabase.upsert_lessons(&plan.upserts).await.map_err(|err| {
            error!(error = %err, course = %id, "lesson upsert failed");
            err
        })?;

        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Delete a course.
    ///
    /// # Errors
    ///
    /// Re-throws the remote failure.
    pub async fn delete_course(&self, id: CourseId) -> Result<()> {
        self.inner.supabase.delete_course(id).await.map_err(|err| {
            error!(error = %err, course = %id, "course delete failed");
            err
        })?;

        self.refresh_after_mutation().await;
        Ok(())
    }

    // =========================================================================
    // Enrollment
    // =========================================================================

    /// Enroll a user in a course. Enrolling twice is idempotent success.
    ///
    /// # Errors
    ///
    /// Re-throws remote failures other than the duplicate-row conflict.
    pub async fn enroll(&self, course_id: CourseId, user_id: UserId) -> Result<()> {
        match self.inner.supabase.insert_enrollment(user_id, course_id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_unique_violation() => {
                debug!(course = %course_id, user = %user_id, "already enrolled");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, course = %course_id, "enrollment failed");
                Err(err.into())
            }
        }
    }

    /// Whether the user is enrolled in the course. Absence of a row is
    /// `false`, never an error.
    ///
    /// # Errors
    ///
    /// Re-throws transport/API failures.
    pub async fn is_enrolled(&self, course_id: CourseId, user_id: UserId) -> Result<bool> {
        Ok(self
            .inner
            .supabase
            .enrollment_exists(course_id, user_id)
            .await?)
    }

    /// The user's enrolled courses with progress and lesson counts.
    ///
    /// Enrollments whose course no longer exists are quietly dropped.
    ///
    /// # Errors
    ///
    /// Re-throws transport/API failures.
    pub async fn enrolled_courses(&self, user_id: UserId) -> Result<Vec<EnrolledCourse>> {
        let rows = self.inner.supabase.select_enrollments(user_id).await?;
        let total = rows.len();

        let enrolled: Vec<EnrolledCourse> = rows
            .into_iter()
            .filter_map(super::supabase::types::EnrollmentJoinRow::into_enrolled)
            .collect();

        if enrolled.len() < total {
            warn!(
                dropped = total - enrolled.len(),
                user = %user_id,
                "dropped enrollments pointing at deleted courses"
            );
        }
        Ok(enrolled)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Make sure the owner has a profile row, creating a minimal
    /// instructor profile when it is missing.
    async fn ensure_owner_profile(&self, owner: &CurrentUser) -> Result<()> {
        let profile = match self.inner.supabase.select_profile(owner.id).await {
            Ok(profile) => profile,
            Err(err) => {
                // Treat a failed check like a missing row; the upsert below
                // settles it either way.
                warn!(error = %err, user = %owner.id, "profile check failed");
                None
            }
        };

        if profile.is_some() {
            return Ok(());
        }

        warn!(user = %owner.id, "instructor profile missing, creating fallback row");
        let fallback = ProfileUpsert {
            id: owner.id,
            email: Some(owner.email.clone().unwrap_or_default()),
            username: owner
                .username
                .clone()
                .or_else(|| owner.email.clone())
                .or_else(|| Some("User".to_string())),
            role: Some(Role::Instructor),
            avatar_url: None,
        };

        self.inner.supabase.upsert_profile(&fallback).await.map_err(|err| {
            error!(error = %err, user = %owner.id, "fallback profile creation failed");
            err
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::testutil::{serve_script, stub_client};

    fn pair() -> (CourseId, UserId) {
        (
            CourseId::new(Uuid::from_u128(1)),
            UserId::new(Uuid::from_u128(2)),
        )
    }

    #[tokio::test]
    async fn test_enroll_duplicate_row_is_idempotent_success() {
        // Second enrollment of the same (user, course) pair surfaces as a
        // unique-constraint conflict and must still succeed.
        let base = serve_script(vec![(
            "409 Conflict",
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        )]);
        let store = CourseStore::new(stub_client(&base));
        let (course_id, user_id) = pair();

        let result = store.enroll(course_id, user_id).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_enroll_other_conflicts_still_fail() {
        let base = serve_script(vec![(
            "409 Conflict",
            r#"{"code":"23503","message":"insert or update violates foreign key constraint"}"#,
        )]);
        let store = CourseStore::new(stub_client(&base));
        let (course_id, user_id) = pair();

        let result = store.enroll(course_id, user_id).await;
        assert!(matches!(result, Err(AppError::Backend(_))));
    }
}
