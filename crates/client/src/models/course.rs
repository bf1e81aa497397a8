//! Course and lesson models.

use chrono::{DateTime, Utc};
use learnhub_core::{CourseId, LessonId, LessonKind, LessonRef, Price, UserId};

/// A published or draft course with its ordered lessons.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    /// Free-form category label.
    pub category: String,
    pub price: Price,
    pub thumbnail: Option<String>,
    pub instructor_id: UserId,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    /// Lessons sorted by their 1-based `order` column.
    pub lessons: Vec<Lesson>,
}

/// One content item within a course, with a fixed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub kind: LessonKind,
    pub url: String,
    /// Display label such as `12:30`; not parsed.
    pub duration: String,
    /// 1-based position within the course.
    pub order: u32,
}

/// Editor output for creating or updating a course.
///
/// Prices are coerced at the form boundary with [`Price::parse_lenient`],
/// so a draft always carries a valid non-negative amount.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Price,
    pub thumbnail: Option<String>,
    pub published: bool,
    pub lessons: Vec<LessonDraft>,
}

/// Editor output for a single lesson entry.
///
/// The [`LessonRef`] is fixed when the entry is accepted from user input:
/// rows loaded from the backend carry `Existing`, rows added in the editor
/// carry `New` with the client-generated placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub reference: LessonRef,
    pub title: String,
    pub kind: LessonKind,
    pub url: String,
    pub duration: String,
}

impl LessonDraft {
    /// Build a draft from a raw editor row, classifying the id string.
    #[must_use]
    pub fn from_editor(
        raw_id: &str,
        title: impl Into<String>,
        kind: LessonKind,
        url: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            reference: LessonRef::classify(raw_id),
            title: title.into(),
            kind,
            url: url.into(),
            duration: duration.into(),
        }
    }
}

impl From<&Lesson> for LessonDraft {
    fn from(lesson: &Lesson) -> Self {
        Self {
            reference: LessonRef::Existing(lesson.id),
            title: lesson.title.clone(),
            kind: lesson.kind,
            url: lesson.url.clone(),
            duration: lesson.duration.clone(),
        }
    }
}

/// A course joined with the current user's enrollment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledCourse {
    pub course: Course,
    /// Completion percentage carried on the enrollment row.
    pub progress: i32,
    /// Lesson count reported by the backend join.
    pub total_lessons: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_from_editor_classifies_persisted_row() {
        let raw = "0b54b945-dfd1-48a8-a982-b40356ba1c49";
        let draft = LessonDraft::from_editor(raw, "Intro", LessonKind::Video, "", "3:10");

        assert_eq!(
            draft.reference,
            LessonRef::Existing(LessonId::new(Uuid::try_parse(raw).unwrap()))
        );
        assert_eq!(draft.title, "Intro");
    }

    #[test]
    fn test_from_editor_classifies_unsaved_row() {
        let draft = LessonDraft::from_editor("l1712345678", "New", LessonKind::Text, "", "");

        assert_eq!(draft.reference, LessonRef::New("l1712345678".to_owned()));
        assert!(draft.reference.is_new());
    }

    #[test]
    fn test_draft_from_persisted_lesson_keeps_id() {
        let lesson = Lesson {
            id: LessonId::new(Uuid::from_u128(3)),
            course_id: CourseId::new(Uuid::from_u128(4)),
            title: "Wrap".to_string(),
            kind: LessonKind::Pdf,
            url: "https://cdn/a.pdf".to_string(),
            duration: "1:00".to_string(),
            order: 2,
        };

        let draft = LessonDraft::from(&lesson);
        assert_eq!(draft.reference.existing_id(), Some(lesson.id));
        assert_eq!(draft.duration, "1:00");
    }
}
