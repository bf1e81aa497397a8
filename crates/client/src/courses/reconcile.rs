//! Lesson-list reconciliation.
//!
//! Given the lesson ids currently persisted for a course and the desired
//! ordered list coming out of the editor, compute the minimal batches that
//! make the persisted set exactly match the desired list:
//!
//! 1. every persisted id absent from the desired list is deleted, in a
//!    single batch applied before any upsert (deleting first avoids
//!    transient duplicate-order conflicts);
//! 2. every desired entry becomes one upsert row with `order` set to its
//!    1-based list position - positions are always reassigned, never
//!    preserved from prior state. New entries omit the id so the backend
//!    assigns one; existing entries keep theirs and update in place.
//!
//! Planning is pure; [`crate::courses::CourseStore`] applies the plan.

use std::collections::HashSet;

use learnhub_core::{CourseId, LessonId};

use crate::models::LessonDraft;
use crate::supabase::types::LessonUpsertRow;

/// Duration label stored when the editor leaves the field empty.
const DEFAULT_DURATION: &str = "0:00";

/// The batches to apply, in order: deletions first, then upserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Persisted lesson ids to delete in one batch.
    pub delete: Vec<LessonId>,
    /// Rows to upsert, in desired-list order.
    pub upserts: Vec<LessonUpsertRow>,
}

impl ReconcilePlan {
    /// Build the plan for a course.
    ///
    /// `persisted` is the set of lesson ids currently stored for the
    /// course; `desired` is the edited list in its final order. An empty
    /// `desired` list plans the deletion of everything and no upserts.
    ///
    /// If two desired entries share the same existing id the plan carries
    /// both rows in list order; the persisted outcome is then whatever the
    /// storage layer's merge-duplicates resolution produces (last write in
    /// the batch wins), not something this planner guarantees.
    #[must_use]
    pub fn build(course_id: CourseId, persisted: &[LessonId], desired: &[LessonDraft]) -> Self {
        let keep: HashSet<LessonId> = desired
            .iter()
            .filter_map(|entry| entry.reference.existing_id())
            .collect();

        let delete: Vec<LessonId> = persisted
            .iter()
            .filter(|id| !keep.contains(id))
            .copied()
            .collect();

        let upserts: Vec<LessonUpsertRow> = desired
            .iter()
            .enumerate()
            .map(|(index, entry)| LessonUpsertRow {
                id: entry.reference.existing_id(),
                course_id,
                title: entry.title.clone(),
                kind: entry.kind,
                url: entry.url.clone(),
                duration: if entry.duration.is_empty() {
                    DEFAULT_DURATION.to_string()
                } else {
                    entry.duration.clone()
                },
                order: position(index),
            })
            .collect();

        Self { delete, upserts }
    }

    /// Whether the plan changes nothing remotely.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.upserts.is_empty()
    }
}

/// Build the insert batch for a just-created course.
///
/// There is no prior state to reconcile against, so every row goes in
/// fresh: ids are omitted even when the editor carried existing-looking
/// ones, and `order` runs `1..n` over the list.
#[must_use]
pub fn fresh_batch(course_id: CourseId, lessons: &[LessonDraft]) -> Vec<LessonUpsertRow> {
    lessons
        .iter()
        .enumerate()
        .map(|(index, entry)| LessonUpsertRow {
            id: None,
            course_id,
            title: entry.title.clone(),
            kind: entry.kind,
            url: entry.url.clone(),
            duration: if entry.duration.is_empty() {
                DEFAULT_DURATION.to_string()
            } else {
                entry.duration.clone()
            },
            order: position(index),
        })
        .collect()
}

/// 1-based order value for a list index.
fn position(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use learnhub_core::{LessonKind, LessonRef};
    use uuid::Uuid;

    fn course() -> CourseId {
        CourseId::new(Uuid::try_parse("0b54b945-dfd1-48a8-a982-b40356ba1c49").unwrap())
    }

    fn lesson_id(n: u128) -> LessonId {
        LessonId::new(Uuid::from_u128(n))
    }

    fn existing(id: LessonId, title: &str) -> LessonDraft {
        LessonDraft {
            reference: LessonRef::Existing(id),
            title: title.to_string(),
            kind: LessonKind::Video,
            url: "https://cdn/x.mp4".to_string(),
            duration: "5:00".to_string(),
        }
    }

    fn new_entry(placeholder: &str, title: &str) -> LessonDraft {
        LessonDraft {
            reference: LessonRef::New(placeholder.to_string()),
            title: title.to_string(),
            kind: LessonKind::Text,
            url: String::new(),
            duration: String::new(),
        }
    }

    /// Replay a plan against an in-memory lesson table, mimicking the
    /// backend's delete-then-merge-duplicates semantics.
    fn apply(
        table: &mut Vec<LessonUpsertRow>,
        plan: &ReconcilePlan,
        next_fresh_id: &mut u128,
    ) {
        table.retain(|row| row.id.is_none_or(|id| !plan.delete.contains(&id)));

        for upsert in &plan.upserts {
            let assigned = upsert.id.unwrap_or_else(|| {
                *next_fresh_id += 1;
                lesson_id(*next_fresh_id)
            });
            let mut row = upsert.clone();
            row.id = Some(assigned);

            if let Some(slot) = table.iter_mut().find(|r| r.id == Some(assigned)) {
                *slot = row;
            } else {
                table.push(row);
            }
        }
    }

    #[test]
    fn test_orders_are_contiguous_and_match_input() {
        let desired = vec![
            existing(lesson_id(1), "a"),
            new_entry("l171234567", "b"),
            existing(lesson_id(2), "c"),
            new_entry("l171234568", "d"),
        ];
        let plan = ReconcilePlan::build(course(), &[lesson_id(1), lesson_id(2)], &desired);

        assert!(plan.delete.is_empty());
        let orders: Vec<u32> = plan.upserts.iter().map(|row| row.order).collect();
        assert_eq!(orders, [1, 2, 3, 4]);
        let titles: Vec<&str> = plan.upserts.iter().map(|row| row.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_desired_list_deletes_everything() {
        let persisted = [lesson_id(1), lesson_id(2), lesson_id(3)];
        let plan = ReconcilePlan::build(course(), &persisted, &[]);

        assert_eq!(plan.delete, persisted);
        assert!(plan.upserts.is_empty());
    }

    #[test]
    fn test_no_prior_lessons_plans_pure_inserts() {
        let desired = vec![new_entry("l1", "a"), new_entry("l2", "b")];
        let plan = ReconcilePlan::build(course(), &[], &desired);

        assert!(plan.delete.is_empty());
        assert!(plan.upserts.iter().all(|row| row.id.is_none()));
    }

    #[test]
    fn test_placeholder_id_is_never_treated_as_existing() {
        // A client placeholder must not protect a persisted row from
        // deletion, even if it coincidentally appeared before.
        let desired = vec![new_entry("l171234567", "fresh")];
        let plan = ReconcilePlan::build(course(), &[lesson_id(9)], &desired);

        assert_eq!(plan.delete, [lesson_id(9)]);
        assert_eq!(plan.upserts.len(), 1);
        assert!(plan.upserts[0].id.is_none());
    }

    #[test]
    fn test_mixed_update_scenario() {
        // Persisted [A, B]; editor submits [B retitled, new entry].
        let (a, b) = (lesson_id(1), lesson_id(2));
        let desired = vec![existing(b, "X"), new_entry("newtmp", "Y")];
        let plan = ReconcilePlan::build(course(), &[a, b], &desired);

        assert_eq!(plan.delete, [a]);
        assert_eq!(plan.upserts.len(), 2);
        assert_eq!(plan.upserts[0].id, Some(b));
        assert_eq!(plan.upserts[0].order, 1);
        assert_eq!(plan.upserts[0].title, "X");
        assert_eq!(plan.upserts[1].id, None);
        assert_eq!(plan.upserts[1].order, 2);
        assert_eq!(plan.upserts[1].title, "Y");
    }

    #[test]
    fn test_applied_state_matches_desired_list() {
        let mut table = Vec::new();
        let mut fresh = 100;

        let desired = vec![
            new_entry("l1", "intro"),
            new_entry("l2", "setup"),
            new_entry("l3", "wrap"),
        ];
        let plan = ReconcilePlan::build(course(), &[], &desired);
        apply(&mut table, &plan, &mut fresh);

        assert_eq!(table.len(), desired.len());
        let orders: Vec<u32> = table.iter().map(|row| row.order).collect();
        assert_eq!(orders, [1, 2, 3]);
    }

    #[test]
    fn test_reconcile_twice_is_idempotent() {
        let mut table = Vec::new();
        let mut fresh = 100;

        // First pass persists two new lessons.
        let first = vec![new_entry("l1", "intro"), new_entry("l2", "setup")];
        let plan = ReconcilePlan::build(course(), &[], &first);
        apply(&mut table, &plan, &mut fresh);

        // Re-submit the persisted state verbatim.
        let persisted_ids: Vec<LessonId> = table.iter().filter_map(|row| row.id).collect();
        let resubmit: Vec<LessonDraft> = table
            .iter()
            .map(|row| LessonDraft {
                reference: LessonRef::Existing(row.id.unwrap()),
                title: row.title.clone(),
                kind: row.kind,
                url: row.url.clone(),
                duration: row.duration.clone(),
            })
            .collect();

        let second = ReconcilePlan::build(course(), &persisted_ids, &resubmit);
        assert!(second.delete.is_empty());

        let before = table.clone();
        apply(&mut table, &second, &mut fresh);
        assert_eq!(table, before);
    }

    #[test]
    fn test_duplicate_existing_ids_keep_batch_order() {
        let b = lesson_id(2);
        let desired = vec![existing(b, "first write"), existing(b, "second write")];
        let plan = ReconcilePlan::build(course(), &[b], &desired);

        // Both rows ship; the storage layer's conflict resolution decides
        // the survivor.
        assert!(plan.delete.is_empty());
        assert_eq!(plan.upserts.len(), 2);
        assert_eq!(plan.upserts[0].id, Some(b));
        assert_eq!(plan.upserts[1].id, Some(b));
        assert_eq!(plan.upserts[1].title, "second write");
    }

    #[test]
    fn test_empty_duration_defaults() {
        let desired = vec![new_entry("l1", "a")];
        let plan = ReconcilePlan::build(course(), &[], &desired);
        assert_eq!(plan.upserts[0].duration, DEFAULT_DURATION);
    }

    #[test]
    fn test_fresh_batch_ignores_carried_ids() {
        let drafts = vec![existing(lesson_id(5), "copied"), new_entry("l1", "typed")];
        let batch = fresh_batch(course(), &drafts);

        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|row| row.id.is_none()));
        let orders: Vec<u32> = batch.iter().map(|row| row.order).collect();
        assert_eq!(orders, [1, 2]);
    }

    #[test]
    fn test_is_empty() {
        assert!(ReconcilePlan::build(course(), &[], &[]).is_empty());
        assert!(!ReconcilePlan::build(course(), &[lesson_id(1)], &[]).is_empty());
    }
}
