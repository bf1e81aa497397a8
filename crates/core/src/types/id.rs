//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. All persisted
//! Learnhub entities are keyed by UUIDs assigned by the hosted backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_uuid()`
/// - `From<Uuid>` and `Into<Uuid>` implementations
///
/// # Example
///
/// ```rust
/// # use learnhub_core::define_id;
/// # use uuid::Uuid;
/// define_id!(UserId);
/// define_id!(CourseId);
///
/// let user_id = UserId::new(Uuid::new_v4());
/// let course_id = CourseId::new(Uuid::new_v4());
///
/// // These are different types, so this won't compile:
/// // let _: UserId = course_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Create a new ID from a UUID value.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID value.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(CourseId);
define_id!(LessonId);
define_id!(ReviewId);

/// A lesson's identity as submitted from the editor.
///
/// Lessons added in the editor carry a client-generated placeholder id
/// (e.g. `l1712345678`) until first saved; persisted lessons carry the
/// backend-assigned UUID. The variant is fixed at the boundary where the
/// entry is accepted from user input, so save-time code never has to
/// re-infer "new vs existing" from string shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LessonRef {
    /// A persisted lesson, identified by its stable backend id.
    Existing(LessonId),
    /// A not-yet-saved lesson carrying a client-generated placeholder.
    New(String),
}

impl LessonRef {
    /// Classify a raw id string from user input.
    ///
    /// Only a canonical 36-character hyphenated UUID (8-4-4-4-12 groups,
    /// case-insensitive hex) counts as existing. Everything else - client
    /// placeholders, braced or unhyphenated UUID renditions, empty strings -
    /// is treated as new.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        // Uuid::try_parse also accepts simple, braced and urn forms; the
        // length check restricts classification to the canonical rendition.
        if raw.len() == 36
            && let Ok(uuid) = Uuid::try_parse(raw)
        {
            return Self::Existing(LessonId::new(uuid));
        }
        Self::New(raw.to_owned())
    }

    /// The stable id, if this reference points at a persisted lesson.
    #[must_use]
    pub const fn existing_id(&self) -> Option<LessonId> {
        match self {
            Self::Existing(id) => Some(*id),
            Self::New(_) => None,
        }
    }

    /// Whether this reference is a not-yet-saved placeholder.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_roundtrip() {
        let uuid = Uuid::new_v4();
        let id = CourseId::new(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_classify_canonical_uuid_is_existing() {
        let raw = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";
        let lesson_ref = LessonRef::classify(raw);
        assert_eq!(
            lesson_ref,
            LessonRef::Existing(LessonId::new(Uuid::try_parse(raw).unwrap()))
        );
        assert!(!lesson_ref.is_new());
    }

    #[test]
    fn test_classify_uppercase_hex_is_existing() {
        let lesson_ref = LessonRef::classify("A1B2C3D4-E5F6-7890-ABCD-EF1234567890");
        assert!(lesson_ref.existing_id().is_some());
    }

    #[test]
    fn test_classify_client_placeholder_is_new() {
        // The editor generates ids like `l` + epoch millis for unsaved rows.
        let lesson_ref = LessonRef::classify("l171234567");
        assert_eq!(lesson_ref, LessonRef::New("l171234567".to_owned()));
        assert!(lesson_ref.existing_id().is_none());
    }

    #[test]
    fn test_classify_non_canonical_uuid_forms_are_new() {
        // Simple (unhyphenated), braced and urn forms parse as UUIDs but are
        // not the stable-identifier format the backend hands out.
        assert!(LessonRef::classify("a1b2c3d4e5f67890abcdef1234567890").is_new());
        assert!(LessonRef::classify("{a1b2c3d4-e5f6-7890-abcd-ef1234567890}").is_new());
        assert!(
            LessonRef::classify("urn:uuid:a1b2c3d4-e5f6-7890-abcd-ef1234567890").is_new()
        );
    }

    #[test]
    fn test_classify_empty_and_garbage_are_new() {
        assert!(LessonRef::classify("").is_new());
        assert!(LessonRef::classify("not-a-uuid-at-all-but-36-chars-long!").is_new());
    }
}
