//! AttachmentReconciler: merging an existing attachment set with an edit.
//!
//! This is the correctness-critical step of the whole system. The edit plan
//! records *explicit* user actions only; an existing attachment absent from
//! both the kept and removed lists was untouched and MUST be preserved.
//! Treating absence as removal is exactly the silent-data-loss bug this
//! component exists to prevent, so the merge is written as
//! `(existing - explicitly_removed) ++ newly_uploaded` and never consults
//! the kept list to decide survival.
//!
//! A plan that references ids the existing set does not contain was computed
//! from stale data; that surfaces as [`ReconcileError::Conflict`], never as
//! a silent skip.

use billproto::{AttachmentEditPlan, AttachmentId, PublishedAttachment, ReconcileError};
use std::collections::BTreeSet;

/// Merge `existing` attachments with an edit plan and the attachments the
/// plan's added files produced.
///
/// The result preserves the relative order of retained attachments, followed
/// by newly uploaded attachments in upload order. Retained attachments are
/// carried verbatim except for primary designation: if the previous primary
/// was removed (or none existed), the first attachment of the result becomes
/// primary.
pub fn reconcile(
    existing: &[PublishedAttachment],
    plan: &AttachmentEditPlan,
    newly_uploaded: &[PublishedAttachment],
) -> Result<Vec<PublishedAttachment>, ReconcileError> {
    let existing_ids: BTreeSet<&AttachmentId> = existing.iter().map(|a| &a.id).collect();

    // A removal or keep referencing an unknown id means the edit session was
    // based on stale data. Refuse rather than guess.
    let unknown: Vec<AttachmentId> = plan
        .removed
        .iter()
        .chain(plan.kept.iter())
        .filter(|id| !existing_ids.contains(id))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        tracing::error!(
            reconcile.unknown_ids = unknown.len(),
            "edit plan references attachments that do not exist"
        );
        return Err(ReconcileError::Conflict { unknown });
    }

    // Survival is decided by the removal list alone.
    let mut result: Vec<PublishedAttachment> = existing
        .iter()
        .filter(|a| !plan.removed.contains(&a.id))
        .cloned()
        .collect();
    result.extend(newly_uploaded.iter().cloned());

    // Primary designation: preserve the previous primary when it survived,
    // otherwise promote the first attachment.
    if !result.is_empty() && !result.iter().any(|a| a.is_primary) {
        result[0] = result[0].clone().as_primary(true);
    }

    tracing::info!(
        reconcile.existing = existing.len(),
        reconcile.removed = plan.removed.len(),
        reconcile.added = newly_uploaded.len(),
        reconcile.result = result.len(),
        "attachment set reconciled"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mediacas::ContentHasher;
    use pretty_assertions::assert_eq;

    fn attachment(name: &str, primary: bool) -> PublishedAttachment {
        let meta = ContentHasher::from_bytes(name.as_bytes(), "image/png", name);
        PublishedAttachment::new(meta, format!("https://media.example/{}", name), Utc::now())
            .as_primary(primary)
    }

    fn urls(attachments: &[PublishedAttachment]) -> Vec<&str> {
        attachments.iter().map(|a| a.url.as_str()).collect()
    }

    #[test]
    fn test_remove_and_add() {
        let existing = vec![
            attachment("a1", true),
            attachment("a2", false),
            attachment("a3", false),
        ];
        let added = vec![attachment("a4", false)];
        let plan = AttachmentEditPlan::removals(vec![existing[1].id.clone()]);

        let result = reconcile(&existing, &plan, &added).unwrap();
        assert_eq!(
            urls(&result),
            vec![
                "https://media.example/a1",
                "https://media.example/a3",
                "https://media.example/a4"
            ]
        );
        // Untouched attachments are carried verbatim
        assert_eq!(result[0], existing[0]);
        assert_eq!(result[1], existing[2]);
    }

    #[test]
    fn test_untouched_attachments_survive_empty_plan() {
        // The regression this module exists for: an edit that touches no
        // attachments must leave the set exactly as it was.
        let existing = vec![attachment("a1", true), attachment("a2", false)];
        let plan = AttachmentEditPlan::default();

        let result = reconcile(&existing, &plan, &[]).unwrap();
        assert_eq!(result, existing);
    }

    #[test]
    fn test_absence_from_kept_is_not_removal() {
        let existing = vec![
            attachment("a1", true),
            attachment("a2", false),
            attachment("a3", false),
        ];
        // The plan explicitly keeps only a1; a2/a3 appear in neither list
        let plan = AttachmentEditPlan::new(vec![existing[0].id.clone()], vec![], vec![]);

        let result = reconcile(&existing, &plan, &[]).unwrap();
        assert_eq!(result, existing);
    }

    #[test]
    fn test_kept_equals_existing_minus_removed_property() {
        // reconcile(E, {kept: E-R, removed: R}, A) == (E - R) ++ A,
        // whether kept is explicit or derived
        let existing: Vec<_> = (1..=4).map(|i| attachment(&format!("a{}", i), i == 1)).collect();
        let added = vec![attachment("n1", false), attachment("n2", false)];
        let removed = vec![existing[1].id.clone(), existing[3].id.clone()];

        let explicit = AttachmentEditPlan::new(
            vec![existing[0].id.clone(), existing[2].id.clone()],
            removed.clone(),
            vec![],
        );
        let derived = AttachmentEditPlan::removals(removed);

        let a = reconcile(&existing, &explicit, &added).unwrap();
        let b = reconcile(&existing, &derived, &added).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            urls(&a),
            vec![
                "https://media.example/a1",
                "https://media.example/a3",
                "https://media.example/n1",
                "https://media.example/n2"
            ]
        );
    }

    #[test]
    fn test_removed_primary_promotes_first_remaining() {
        let existing = vec![attachment("a1", true), attachment("a2", false)];
        let plan = AttachmentEditPlan::removals(vec![existing[0].id.clone()]);

        let result = reconcile(&existing, &plan, &[]).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].is_primary);
        assert_eq!(result[0].url, "https://media.example/a2");
    }

    #[test]
    fn test_surviving_primary_is_preserved() {
        let existing = vec![attachment("a1", false), attachment("a2", true)];
        let plan = AttachmentEditPlan::removals(vec![existing[0].id.clone()]);

        let result = reconcile(&existing, &plan, &[]).unwrap();
        assert!(result[0].is_primary);
        assert_eq!(result[0], existing[1]);
    }

    #[test]
    fn test_fresh_publish_marks_first_primary() {
        let added = vec![attachment("n1", false), attachment("n2", false)];
        let result = reconcile(&[], &AttachmentEditPlan::default(), &added).unwrap();
        assert!(result[0].is_primary);
        assert!(!result[1].is_primary);
    }

    #[test]
    fn test_unknown_removed_id_is_a_conflict() {
        let existing = vec![attachment("a1", true)];
        let stale = AttachmentId::new();
        let plan = AttachmentEditPlan::removals(vec![stale.clone()]);

        let err = reconcile(&existing, &plan, &[]).unwrap_err();
        assert_eq!(err, ReconcileError::Conflict { unknown: vec![stale] });
    }

    #[test]
    fn test_unknown_kept_id_is_a_conflict() {
        let existing = vec![attachment("a1", true)];
        let stale = AttachmentId::new();
        let plan = AttachmentEditPlan::new(vec![stale], vec![], vec![]);

        assert!(reconcile(&existing, &plan, &[]).is_err());
    }

    #[test]
    fn test_remove_everything() {
        let existing = vec![attachment("a1", true), attachment("a2", false)];
        let plan =
            AttachmentEditPlan::removals(existing.iter().map(|a| a.id.clone()).collect::<Vec<_>>());
        let result = reconcile(&existing, &plan, &[]).unwrap();
        assert!(result.is_empty());
    }
}
