//! Catalog browsing commands.
//!
//! # Usage
//!
//! ```bash
//! # List published courses
//! learnhub catalog list
//!
//! # Show one course with its lessons
//! learnhub catalog show <course-id>
//! ```

use learnhub_client::{AppError, AppState};
use learnhub_core::CourseId;

/// List published courses.
pub async fn list(state: &AppState) -> Result<(), AppError> {
    state.courses().fetch_published().await?;
    let catalog = state.courses().catalog().await;

    if catalog.is_empty() {
        println!("No published courses.");
        return Ok(());
    }

    for course in catalog {
        let price = if course.price.is_free() {
            "free".to_string()
        } else {
            format!("${}", course.price.amount())
        };
        println!(
            "{}  {}  [{}]  {}  ({} lessons)",
            course.id,
            course.title,
            course.category,
            price,
            course.lessons.len()
        );
    }
    Ok(())
}

/// Show one course with its ordered lessons.
pub async fn show(state: &AppState, course_id: CourseId) -> Result<(), AppError> {
    state.courses().fetch_published().await?;
    let course = state
        .courses()
        .get(course_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("course {course_id}")))?;

    println!("{}", course.title);
    println!("  category:  {}", course.category);
    println!("  price:     {}", course.price.amount());
    println!("  published: {}", course.published);
    println!("  created:   {}", course.created_at.to_rfc3339());
    println!();

    if course.lessons.is_empty() {
        println!("  (no lessons)");
        return Ok(());
    }

    for lesson in &course.lessons {
        println!(
            "  {:>3}. {}  [{}]  {}",
            lesson.order,
            lesson.title,
            lesson.kind.as_str(),
            lesson.duration
        );
    }
    Ok(())
}
