//! Course reviews: list, submit, delete.

use std::sync::Arc;

use tracing::{debug, error};

use learnhub_core::{CourseId, UserId};

use crate::error::{AppError, Result};
use crate::models::{CurrentUser, Review};
use crate::supabase::types::NewReviewRow;
use crate::supabase::SupabaseClient;

/// Valid rating bounds, inclusive.
const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Review operations over the backend client.
#[derive(Clone)]
pub struct Reviews {
    inner: Arc<ReviewsInner>,
}

struct ReviewsInner {
    supabase: SupabaseClient,
}

impl Reviews {
    #[must_use]
    pub fn new(supabase: SupabaseClient) -> Self {
        Self {
            inner: Arc::new(ReviewsInner { supabase }),
        }
    }

    /// A course's reviews with author profiles, newest first.
    ///
    /// # Errors
    ///
    /// Re-throws transport/API failures.
    pub async fn list(&self, course_id: CourseId) -> Result<Vec<Review>> {
        let rows = self.inner.supabase.select_reviews(course_id).await.map_err(|err| {
            error!(error = %err, course = %course_id, "review fetch failed");
            err
        })?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Submit a review for a course as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a signed-in author,
    /// `AppError::Validation` for an out-of-range rating, otherwise
    /// re-throws the remote failure.
    pub async fn submit(
        &self,
        course_id: CourseId,
        author: Option<&CurrentUser>,
        rating: u8,
        comment: &str,
    ) -> Result<Review> {
        let author = author
            .ok_or_else(|| AppError::Unauthorized("sign in to leave a review".to_string()))?;
        validate_rating(rating)?;

        let row = NewReviewRow {
            course_id,
            user_id: author.id,
            rating,
            comment: comment.trim().to_string(),
        };
        let inserted = self.inner.supabase.insert_review(&row).await.map_err(|err| {
            error!(error = %err, course = %course_id, "review submit failed");
            err
        })?;

        debug!(review = %inserted.id, course = %course_id, "review submitted");
        Ok(Review::from(inserted))
    }

    /// Delete a review. Only the review's author may delete it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when `requester` is not the author,
    /// otherwise re-throws the remote failure.
    pub async fn delete(&self, review: &Review, requester: UserId) -> Result<()> {
        if review.user_id != requester {
            return Err(AppError::Unauthorized(
                "only the author can delete a review".to_string(),
            ));
        }

        self.inner.supabase.delete_review(review.id).await.map_err(|err| {
            error!(error = %err, review = %review.id, "review delete failed");
            err
        })?;
        Ok(())
    }
}

/// Reject ratings outside the 1-5 scale.
fn validate_rating(rating: u8) -> Result<()> {
    if RATING_RANGE.contains(&rating) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "rating must be between {} and {}, got {rating}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(3).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_out_of_range_rating_is_validation_error() {
        let err = validate_rating(9).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
