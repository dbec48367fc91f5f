//! UploadCoordinator: non-interactive fan-out of authorized uploads.
//!
//! Everything here runs after the one interactive signature exists. Each
//! (file, target) attempt is checked locally against the credential first:
//! an uncovered address or an expired credential fails the file without a
//! network call. Concurrency across files is bounded by a semaphore; the
//! targets for one file are tried in order so the first success supplies the
//! canonical URL and later successes become mirrors.
//!
//! Progress events for a file are emitted from its own task, so per-file
//! causal order (started before completed/failed) holds; nothing is ordered
//! across files. Cancellation stops new uploads from being issued and lets
//! in-flight ones finish; already-succeeded uploads stay valid.
//!
//! There is no automatic retry. [`UploadCoordinator::retry_failed`] is a
//! hook the caller may invoke to re-attempt only the failed subset while the
//! credential is still unexpired.

use crate::progress::ProgressObserver;
use crate::target::StorageTarget;
use billproto::{
    BatchAuthorization, MediaFile, ProgressEvent, ProgressStep, PublishedAttachment,
    UploadErrorKind, UploadOutcome, UploadReport,
};
use chrono::{DateTime, Utc};
use mediacas::ContentAddress;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Source of "now" for expiry checks. Injectable so expiry-mid-batch
/// behavior is testable without wall-clock races.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct UploadCoordinator {
    concurrency: usize,
    clock: Clock,
}

impl UploadCoordinator {
    /// Coordinator allowing up to `concurrency` files in flight at once.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the expiry clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Upload every file to every target using the batch credential.
    ///
    /// Returns the full outcome list, one record per (file, target) attempt.
    /// Partial failure is not a pipeline failure; the caller decides what a
    /// partial result means.
    pub async fn upload(
        &self,
        files: &[MediaFile],
        auth: Arc<BatchAuthorization>,
        targets: &[Arc<dyn StorageTarget>],
        observer: Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> UploadReport {
        let indexed: Vec<(usize, MediaFile)> = files.iter().cloned().enumerate().collect();
        let outcomes = self
            .upload_indexed(indexed, files.len(), auth, targets, observer, cancel)
            .await;
        UploadReport::new(outcomes, files.len())
    }

    /// Re-attempt only the files that failed on every target in `prior`.
    ///
    /// Never invoked automatically. The merged report keeps the prior
    /// successes untouched and replaces the failed files' outcomes.
    pub async fn retry_failed(
        &self,
        files: &[MediaFile],
        prior: &UploadReport,
        auth: Arc<BatchAuthorization>,
        targets: &[Arc<dyn StorageTarget>],
        observer: Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> UploadReport {
        let failed: BTreeSet<ContentAddress> = prior
            .failed_outcomes()
            .iter()
            .map(|o| o.address.clone())
            .collect();

        let indexed: Vec<(usize, MediaFile)> = files
            .iter()
            .cloned()
            .enumerate()
            .filter(|(_, f)| failed.contains(&f.metadata().address))
            .collect();

        tracing::info!(
            retry.files = indexed.len(),
            retry.total = prior.total_files,
            "retrying failed subset"
        );

        let retried = self
            .upload_indexed(indexed, prior.total_files, auth, targets, observer, cancel)
            .await;

        let mut outcomes: Vec<UploadOutcome> = prior
            .outcomes
            .iter()
            .filter(|o| !failed.contains(&o.address))
            .cloned()
            .collect();
        outcomes.extend(retried);
        UploadReport::new(outcomes, prior.total_files)
    }

    async fn upload_indexed(
        &self,
        indexed: Vec<(usize, MediaFile)>,
        total_files: usize,
        auth: Arc<BatchAuthorization>,
        targets: &[Arc<dyn StorageTarget>],
        observer: Arc<dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> Vec<UploadOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut join_set: JoinSet<(usize, Vec<UploadOutcome>)> = JoinSet::new();

        for (index, file) in indexed {
            let semaphore = semaphore.clone();
            let auth = auth.clone();
            let targets = targets.to_vec();
            let observer = observer.clone();
            let cancel = cancel.clone();
            let clock = self.clock.clone();
            let completed = completed.clone();

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("upload semaphore closed");

                // Stop issuing new uploads once cancelled; files already
                // past this point run to completion.
                if cancel.is_cancelled() {
                    let address = file.metadata().address;
                    let outcomes = targets
                        .iter()
                        .map(|t| {
                            UploadOutcome::failure(
                                file.file_name.clone(),
                                address.clone(),
                                t.name(),
                                UploadErrorKind::Cancelled,
                            )
                        })
                        .collect();
                    emit(
                        &*observer,
                        ProgressStep::Failed,
                        index,
                        &file.file_name,
                        total_files,
                        1.0,
                        &completed,
                    );
                    completed.fetch_add(1, Ordering::Relaxed);
                    return (index, outcomes);
                }

                let outcomes = upload_one_file(
                    index,
                    &file,
                    total_files,
                    &auth,
                    &targets,
                    &*observer,
                    &clock,
                    &completed,
                )
                .await;
                (index, outcomes)
            });
        }

        let mut collected: Vec<(usize, Vec<UploadOutcome>)> = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(entry) => collected.push(entry),
                Err(e) => tracing::error!(error = %e, "upload task panicked"),
            }
        }
        collected.sort_by_key(|(index, _)| *index);
        collected.into_iter().flat_map(|(_, o)| o).collect()
    }
}

fn emit(
    observer: &dyn ProgressObserver,
    step: ProgressStep,
    index: usize,
    file_name: &str,
    total_files: usize,
    per_file_fraction: f64,
    completed: &AtomicUsize,
) {
    observer.on_event(ProgressEvent::new(
        step,
        index,
        file_name,
        total_files,
        per_file_fraction,
        completed.load(Ordering::Relaxed),
    ));
}

#[allow(clippy::too_many_arguments)]
async fn upload_one_file(
    index: usize,
    file: &MediaFile,
    total_files: usize,
    auth: &BatchAuthorization,
    targets: &[Arc<dyn StorageTarget>],
    observer: &dyn ProgressObserver,
    clock: &Clock,
    completed: &AtomicUsize,
) -> Vec<UploadOutcome> {
    let metadata = file.metadata();
    let address = metadata.address.clone();

    emit(
        observer,
        ProgressStep::Started,
        index,
        &file.file_name,
        total_files,
        0.0,
        completed,
    );

    // Local pre-checks: never hit the network with a credential that can't
    // authorize this blob.
    let fail_all = |kind: UploadErrorKind| -> Vec<UploadOutcome> {
        targets
            .iter()
            .map(|t| {
                UploadOutcome::failure(
                    file.file_name.clone(),
                    address.clone(),
                    t.name(),
                    kind.clone(),
                )
            })
            .collect()
    };

    if !auth.covers(&address) {
        tracing::warn!(
            upload.file = %file.file_name,
            upload.address = %address,
            "file address is not covered by the batch authorization"
        );
        let outcomes = fail_all(UploadErrorKind::AuthorizationMismatch);
        emit(
            observer,
            ProgressStep::Failed,
            index,
            &file.file_name,
            total_files,
            1.0,
            completed,
        );
        completed.fetch_add(1, Ordering::Relaxed);
        return outcomes;
    }

    if auth.is_expired((clock)()) {
        tracing::warn!(
            upload.file = %file.file_name,
            upload.expires_at = %auth.expires_at,
            "batch authorization expired before upload"
        );
        let outcomes = fail_all(UploadErrorKind::AuthorizationExpired);
        emit(
            observer,
            ProgressStep::Failed,
            index,
            &file.file_name,
            total_files,
            1.0,
            completed,
        );
        completed.fetch_add(1, Ordering::Relaxed);
        return outcomes;
    }

    // Targets in order: first success wins the canonical URL, later
    // successes are recorded as mirrors.
    let mut results: Vec<(String, Result<crate::target::BlobReceipt, billproto::TargetError>)> =
        Vec::with_capacity(targets.len());
    for target in targets {
        let result = target
            .put_blob(&address, file.bytes.clone(), auth)
            .await;
        match &result {
            Ok(receipt) => {
                tracing::info!(
                    upload.file = %file.file_name,
                    upload.address = %address,
                    upload.target = target.name(),
                    upload.url = %receipt.url,
                    "blob accepted"
                );
                emit(
                    observer,
                    ProgressStep::BytesAcked,
                    index,
                    &file.file_name,
                    total_files,
                    0.5,
                    completed,
                );
            }
            Err(e) => {
                tracing::warn!(
                    upload.file = %file.file_name,
                    upload.address = %address,
                    upload.target = target.name(),
                    upload.error = %e,
                    "blob upload failed"
                );
            }
        }
        results.push((target.name().to_string(), result));
    }

    let mut successes = results
        .iter()
        .filter_map(|(name, r)| r.as_ref().ok().map(|receipt| (name, receipt)));
    let published = successes.next().map(|(_, first)| {
        let mut attachment =
            PublishedAttachment::new(metadata.clone(), first.url.clone(), (clock)())
                .with_display_order(index as u32);
        for (_, mirror) in successes {
            attachment = attachment.with_mirror(mirror.url.clone());
        }
        attachment
    });

    let any_success = published.is_some();
    let mut published = published;
    let outcomes: Vec<UploadOutcome> = results
        .into_iter()
        .map(|(target, result)| match result {
            Ok(_) => UploadOutcome::success(
                file.file_name.clone(),
                address.clone(),
                target,
                published.take(),
            ),
            Err(e) => UploadOutcome::failure(
                file.file_name.clone(),
                address.clone(),
                &target,
                UploadErrorKind::from_target(&target, e),
            ),
        })
        .collect();

    emit(
        observer,
        if any_success {
            ProgressStep::Completed
        } else {
            ProgressStep::Failed
        },
        index,
        &file.file_name,
        total_files,
        1.0,
        completed,
    );
    completed.fetch_add(1, Ordering::Relaxed);

    outcomes
}
