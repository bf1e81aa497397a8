//! Domain models consumed by front ends.
//!
//! Wire rows (see [`crate::supabase::types`]) convert into these; the rest
//! of the crate never hands raw backend payloads to callers.

pub mod course;
pub mod review;
pub mod user;

pub use course::{Course, CourseDraft, EnrolledCourse, Lesson, LessonDraft};
pub use review::Review;
pub use user::CurrentUser;
