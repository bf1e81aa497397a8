//! Review commands.
//!
//! # Usage
//!
//! ```bash
//! # List a course's reviews, newest first
//! learnhub reviews list <course-id>
//!
//! # Submit a review (requires LEARNHUB_ACCESS_TOKEN)
//! learnhub reviews add <course-id> -r 5 -c "Great course"
//! ```

use learnhub_client::{AppError, AppState};
use learnhub_core::CourseId;

/// List a course's reviews, newest first.
pub async fn list(state: &AppState, course_id: CourseId) -> Result<(), AppError> {
    let reviews = state.reviews().list(course_id).await?;

    if reviews.is_empty() {
        println!("No reviews yet.");
        return Ok(());
    }

    for review in reviews {
        let author = review.author_username.as_deref().unwrap_or("anonymous");
        println!(
            "{}  {}/5  {}  {}",
            review.created_at.format("%Y-%m-%d"),
            review.rating,
            author,
            review.comment
        );
    }
    Ok(())
}

/// Submit a review as the signed-in user.
pub async fn add(
    state: &AppState,
    course_id: CourseId,
    rating: u8,
    comment: &str,
) -> Result<(), AppError> {
    state
        .session()
        .bootstrap(state.config().bootstrap_timeout)
        .await;
    let user = state.session().current_user();

    let review = state
        .reviews()
        .submit(course_id, user.as_ref(), rating, comment)
        .await?;
    println!("Review {} submitted.", review.id);
    Ok(())
}
