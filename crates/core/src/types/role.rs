//! Role and lesson-kind enums.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A user's role on the platform.
///
/// Assigned at registration and immutable through normal profile edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can browse the catalog, enroll and review.
    #[default]
    Student,
    /// Can additionally author and publish courses.
    Instructor,
}

impl Role {
    /// Parse a role from a stored string, defaulting unknown values to
    /// [`Role::Student`].
    ///
    /// Profile rows and auth metadata are written by several client
    /// versions, so an unrecognised role is treated as the least-privileged
    /// one rather than an error.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "instructor" => Self::Instructor,
            _ => Self::Student,
        }
    }

    /// The wire representation stored in profile rows.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The content type of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    /// Streamed or linked video content.
    #[default]
    Video,
    /// Inline text content.
    Text,
    /// A linked PDF document.
    Pdf,
}

impl LessonKind {
    /// The wire representation stored in lesson rows.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Text => "text",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_lenient() {
        assert_eq!(Role::parse_lenient("instructor"), Role::Instructor);
        assert_eq!(Role::parse_lenient("student"), Role::Student);
        assert_eq!(Role::parse_lenient("admin"), Role::Student);
        assert_eq!(Role::parse_lenient(""), Role::Student);
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Instructor).unwrap(), "\"instructor\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"student\"").unwrap(),
            Role::Student
        );
    }

    #[test]
    fn test_lesson_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&LessonKind::Pdf).unwrap(), "\"pdf\"");
        assert_eq!(
            serde_json::from_str::<LessonKind>("\"video\"").unwrap(),
            LessonKind::Video
        );
    }
}
