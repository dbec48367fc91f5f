//! End-to-end pipeline runs against in-memory storage targets.

use billconf::{HandbillConfig, MediaPolicy};
use billproto::{AuthorizeError, MediaFile, RejectReason, UploadErrorKind};
use handbill::testing::{issue_test_auth, CountingSigner, MemoryTarget, RejectingSigner};
use handbill::upload::Clock;
use handbill::{
    AutoAcceptPrompt, NullObserver, Pipeline, PipelineError, StorageTarget, UploadCoordinator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn file(name: &str, size: usize, fill: u8) -> MediaFile {
    MediaFile::new(vec![fill; size], "image/png", name)
}

fn pipeline(
    config: HandbillConfig,
    signer: Arc<CountingSigner>,
    targets: Vec<Arc<MemoryTarget>>,
) -> Pipeline {
    Pipeline::new(
        config,
        signer,
        Arc::new(AutoAcceptPrompt),
        targets
            .into_iter()
            .map(|t| t as Arc<dyn StorageTarget>)
            .collect(),
        Arc::new(NullObserver),
    )
}

#[tokio::test]
async fn test_batch_publish_signs_once() {
    let signer = Arc::new(CountingSigner::new([1u8; 32]));
    let target = Arc::new(MemoryTarget::new("mem"));
    let p = pipeline(HandbillConfig::default(), signer.clone(), vec![target.clone()]);

    let files = vec![
        file("one.png", 2 * 1024, 0x01),
        file("two.png", 5 * 1024, 0x02),
        file("three.png", 1024, 0x03),
    ];
    let addresses: Vec<_> = files.iter().map(|f| f.metadata().address).collect();

    let report = p.publish(files).await.unwrap();

    assert_eq!(signer.calls(), 1);
    assert!(report.upload.all_succeeded());
    assert!(report.rejected.is_empty());
    assert_eq!(report.revision.attachments.len(), 3);
    for address in &addresses {
        assert!(target.contains(address));
    }
    // Attachments come back in submission order with the first as primary
    let orders: Vec<_> = report
        .revision
        .attachments
        .iter()
        .map(|a| a.display_order)
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert!(report.revision.attachments[0].is_primary);
    assert_eq!(report.upload.summary(), "3 of 3 files uploaded");
}

#[tokio::test]
async fn test_oversized_file_rejected_others_still_publish() {
    let config = HandbillConfig {
        policy: MediaPolicy {
            max_file_bytes: 4 * 1024,
            ..Default::default()
        },
        ..Default::default()
    };
    let signer = Arc::new(CountingSigner::new([1u8; 32]));
    let target = Arc::new(MemoryTarget::new("mem"));
    let p = pipeline(config, signer.clone(), vec![target.clone()]);

    let files = vec![
        file("a.png", 1024, 0x0a),
        file("b.png", 1024, 0x0b),
        file("huge.png", 64 * 1024, 0x0c),
        file("d.png", 1024, 0x0d),
        file("e.png", 1024, 0x0e),
    ];
    let huge_address = files[2].metadata().address;

    let report = p.publish(files).await.unwrap();

    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].file.file_name, "huge.png");
    assert!(matches!(
        report.rejected[0].reasons[0],
        RejectReason::FileTooLarge { .. }
    ));
    // The rejected file never reaches the wire and the credential never
    // covers it
    assert!(!target.contains(&huge_address));
    assert_eq!(target.put_count(), 4);
    assert_eq!(signer.calls(), 1);
    assert_eq!(report.revision.attachments.len(), 4);
}

#[tokio::test]
async fn test_signer_rejection_aborts_before_any_upload() {
    let target = Arc::new(MemoryTarget::new("mem"));
    let p = Pipeline::new(
        HandbillConfig::default(),
        Arc::new(RejectingSigner),
        Arc::new(AutoAcceptPrompt),
        vec![target.clone() as Arc<dyn StorageTarget>],
        Arc::new(NullObserver),
    );

    let err = p.publish(vec![file("a.png", 512, 0x01)]).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Authorize(AuthorizeError::SignerRejected)
    ));
    assert_eq!(target.put_count(), 0);
}

#[tokio::test]
async fn test_multi_target_mirrors() {
    let signer = Arc::new(CountingSigner::new([1u8; 32]));
    let first = Arc::new(MemoryTarget::new("first"));
    let second = Arc::new(MemoryTarget::new("second"));
    let p = pipeline(
        HandbillConfig::default(),
        signer,
        vec![first.clone(), second.clone()],
    );

    let report = p.publish(vec![file("a.png", 512, 0x01)]).await.unwrap();

    let attachment = &report.revision.attachments[0];
    assert!(attachment.url.starts_with("memory://first/"));
    assert_eq!(attachment.mirrors.len(), 1);
    assert!(attachment.mirrors[0].starts_with("memory://second/"));
    // Every (file, target) attempt is on record
    assert_eq!(report.upload.outcomes.len(), 2);
}

#[tokio::test]
async fn test_expiry_mid_batch_spares_earlier_successes() {
    // A clock that is fresh for the first file's pre-check and expired for
    // every later one. Exactly one file gets through; the rest fail locally.
    let calls = Arc::new(AtomicUsize::new(0));
    let stepping: Clock = {
        let calls = calls.clone();
        Arc::new(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                // first file: pre-check, then stored_at
                chrono::Utc::now()
            } else {
                chrono::Utc::now() + chrono::Duration::hours(2)
            }
        })
    };

    let files = vec![
        file("a.png", 512, 0x01),
        file("b.png", 512, 0x02),
        file("c.png", 512, 0x03),
    ];
    let auth = Arc::new(issue_test_auth(&files, 20));
    let target = Arc::new(MemoryTarget::new("mem"));

    let report = UploadCoordinator::new(1)
        .with_clock(stepping)
        .upload(
            &files,
            auth,
            &[target.clone() as Arc<dyn StorageTarget>],
            Arc::new(NullObserver),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.files_succeeded(), 1);
    assert_eq!(target.put_count(), 1);
    for outcome in report.failed_outcomes() {
        assert_eq!(outcome.error, Some(UploadErrorKind::AuthorizationExpired));
    }
    // The upload that landed before expiry stays stored
    let published = report.published_attachments();
    assert_eq!(published.len(), 1);
    assert!(target.contains(&published[0].metadata.address));
}

#[tokio::test]
async fn test_retry_after_transient_failure_reuses_credential() {
    let files = vec![file("a.png", 512, 0x01), file("b.png", 512, 0x02)];
    let auth = Arc::new(issue_test_auth(&files, 20));
    let target = Arc::new(MemoryTarget::new("mem"));
    target.fail_address(&files[1].metadata().address);

    let coordinator = UploadCoordinator::new(2);
    let cancel = CancellationToken::new();
    let first = coordinator
        .upload(
            &files,
            auth.clone(),
            &[target.clone() as Arc<dyn StorageTarget>],
            Arc::new(NullObserver),
            &cancel,
        )
        .await;
    assert_eq!(first.summary(), "1 of 2 files uploaded");

    target.clear_failures();
    let merged = coordinator
        .retry_failed(
            &files,
            &first,
            auth,
            &[target.clone() as Arc<dyn StorageTarget>],
            Arc::new(NullObserver),
            &cancel,
        )
        .await;

    assert!(merged.all_succeeded());
    assert_eq!(merged.summary(), "2 of 2 files uploaded");
    for f in &files {
        assert!(target.contains(&f.metadata().address));
    }
}

#[tokio::test]
async fn test_credential_covers_exactly_the_accepted_set() {
    // A strict target rejects anything outside the covered set, so a clean
    // run proves coverage; pushing an uncovered blob proves the bound.
    let accepted = vec![file("a.png", 512, 0x01)];
    let auth = issue_test_auth(&accepted, 20);

    assert!(auth.covers(&accepted[0].metadata().address));
    let outsider = file("other.png", 512, 0x02);
    assert!(!auth.covers(&outsider.metadata().address));
}
