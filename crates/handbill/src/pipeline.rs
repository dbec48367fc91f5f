//! The end-to-end pipeline: validate, consent, authorize once, upload,
//! reconcile, publish.
//!
//! Pipeline state is passed by value between stages; the only shared value
//! is the issued credential, which is read-only. Dependencies (signer,
//! consent prompt, storage targets, progress observer) are injected so the
//! whole flow runs identically under a UI, headless, or in tests.

use crate::authorize::BatchAuthorizer;
use crate::consent::{ConsentGate, ConsentPrompt};
use crate::progress::ProgressObserver;
use crate::reconcile::reconcile;
use crate::signer::InteractiveSigner;
use crate::target::StorageTarget;
use crate::upload::UploadCoordinator;
use crate::validate::{validate, RejectedFile};
use billconf::HandbillConfig;
use billproto::{
    AttachmentEditPlan, AuthorizeError, ContentRevision, MediaFile, ReconcileError, UploadReport,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Hard failures of a publish or edit submission. Per-file validation and
/// upload problems are not here: they ride along in the report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("publish was cancelled before authorization")]
    Cancelled,

    #[error(transparent)]
    Authorize(#[from] AuthorizeError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// What a successful (possibly partially successful) submission produced.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// The new revision, ready for the external publish layer.
    pub revision: ContentRevision,
    /// Per-(file, target) outcomes. Present partial failure as
    /// `upload.summary()` ("N of M files uploaded"), never as full success.
    pub upload: UploadReport,
    /// Files the validator turned away, with every reason.
    pub rejected: Vec<RejectedFile>,
}

pub struct Pipeline {
    config: HandbillConfig,
    signer: Arc<dyn InteractiveSigner>,
    prompt: Arc<dyn ConsentPrompt>,
    targets: Vec<Arc<dyn StorageTarget>>,
    observer: Arc<dyn ProgressObserver>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        config: HandbillConfig,
        signer: Arc<dyn InteractiveSigner>,
        prompt: Arc<dyn ConsentPrompt>,
        targets: Vec<Arc<dyn StorageTarget>>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            config,
            signer,
            prompt,
            targets,
            observer,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token. Cancelling before authorization
    /// aborts with no side effects; cancelling during upload stops new
    /// uploads while letting in-flight ones finish.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Publish new content with attachments.
    ///
    /// Validation rejections don't stop the accepted subset from
    /// proceeding; they are returned in the report. An empty accepted set
    /// is an [`AuthorizeError::EmptyFileSet`].
    pub async fn publish(&self, files: Vec<MediaFile>) -> Result<PublishReport, PipelineError> {
        let validated = validate(&files, &self.config.policy);
        if validated.accepted.is_empty() {
            return Err(AuthorizeError::EmptyFileSet.into());
        }

        let upload = self.upload_accepted(&validated.accepted).await?;
        let attachments = reconcile(
            &[],
            &AttachmentEditPlan::default(),
            &upload.published_attachments(),
        )?;
        let revision = ContentRevision::first_publish(attachments);

        tracing::info!(
            publish.stable_id = %revision.stable_id,
            publish.attachments = revision.attachments.len(),
            publish.summary = %upload.summary(),
            "content published"
        );
        Ok(PublishReport {
            revision,
            upload,
            rejected: validated.rejected,
        })
    }

    /// Edit previously-published content.
    ///
    /// The caller must compute the plan's kept/removed sets from the FULL
    /// existing attachment set; the reconciler treats anything absent from
    /// both lists as kept. An edit that adds no files (title-only, or
    /// removal-only) performs no consent, signing, or network work at all.
    pub async fn update_content(
        &self,
        current: &ContentRevision,
        plan: AttachmentEditPlan,
    ) -> Result<PublishReport, PipelineError> {
        let validated = validate(&plan.added, &self.config.policy);

        let upload = if validated.accepted.is_empty() {
            UploadReport::new(Vec::new(), 0)
        } else {
            self.upload_accepted(&validated.accepted).await?
        };

        let attachments = reconcile(&current.attachments, &plan, &upload.published_attachments())?;
        let revision = current.next(attachments);

        tracing::info!(
            publish.stable_id = %revision.stable_id,
            publish.revision_id = %revision.revision_id,
            publish.attachments = revision.attachments.len(),
            "content revision published"
        );
        Ok(PublishReport {
            revision,
            upload,
            rejected: validated.rejected,
        })
    }

    /// Consent, single-sign, and upload for an accepted file set.
    async fn upload_accepted(&self, accepted: &[MediaFile]) -> Result<UploadReport, PipelineError> {
        // Cancellation before authorization aborts with nothing signed and
        // nothing sent.
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let gate = ConsentGate::new(
            self.prompt.clone(),
            self.config.upload.estimate_bytes_per_sec,
        );
        let consent = gate
            .request(accepted)
            .await
            .ok_or(PipelineError::Cancelled)?;

        let auth = BatchAuthorizer::new(self.config.auth.ttl_minutes)
            .authorize(accepted, &consent, &*self.signer)
            .await?;

        let report = UploadCoordinator::new(self.config.upload.concurrency)
            .upload(
                accepted,
                Arc::new(auth),
                &self.targets,
                self.observer.clone(),
                &self.cancel,
            )
            .await;
        Ok(report)
    }
}
