//! BatchAuthorizer: one interactive signing call per batch.
//!
//! Builds a single authorization request enumerating every accepted content
//! address with an explicit expiry and a human-readable summary, invokes the
//! interactive signer exactly once, and binds the resulting signature into a
//! [`BatchAuthorization`].
//!
//! A rejected signature is terminal for the attempt. The authorizer never
//! retries signing; the caller restarts the whole pipeline from consent if
//! the user wants another go.

use crate::consent::Consent;
use crate::signer::InteractiveSigner;
use billproto::{AuthorizationRequest, AuthorizeError, BatchAuthorization, MediaFile};
use chrono::{Duration, Utc};
use std::collections::BTreeSet;

pub struct BatchAuthorizer {
    ttl: Duration,
}

impl BatchAuthorizer {
    /// Authorizer issuing credentials valid for `ttl_minutes`.
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Produce one credential covering `files`, gated on `consent`.
    ///
    /// The consent must have been granted for exactly this file set,
    /// compared by content-address set. Invokes `signer.sign` exactly once.
    pub async fn authorize(
        &self,
        files: &[MediaFile],
        consent: &Consent,
        signer: &dyn InteractiveSigner,
    ) -> Result<BatchAuthorization, AuthorizeError> {
        if files.is_empty() {
            return Err(AuthorizeError::EmptyFileSet);
        }

        let addresses: BTreeSet<_> = files.iter().map(|f| f.metadata().address).collect();
        if !consent.covers_exactly(&addresses) {
            tracing::warn!(
                authorize.files = files.len(),
                "consent does not match the file set being authorized"
            );
            return Err(AuthorizeError::ConsentMismatch);
        }

        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        let summary = format!("{} files: {}", files.len(), names.join(", "));
        let request =
            AuthorizationRequest::new(addresses.iter().cloned(), Utc::now(), self.ttl, summary);

        tracing::info!(
            authorize.addresses = request.covered.len(),
            authorize.expires_at = %request.expires_at,
            "requesting one interactive signature for the batch"
        );

        // The single interactive call of the whole pipeline.
        let signature = signer.sign(&request).await?;

        let auth = BatchAuthorization::issue(&request, signature);
        tracing::info!(
            authorize.covered = auth.covered().len(),
            "batch authorization issued"
        );
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::{AutoAcceptPrompt, ConsentGate};
    use crate::testing::{CountingSigner, RejectingSigner, UnavailableSigner};
    use std::sync::Arc;

    fn files() -> Vec<MediaFile> {
        vec![
            MediaFile::new(&b"first"[..], "image/png", "a.png"),
            MediaFile::new(&b"second"[..], "image/png", "b.png"),
        ]
    }

    async fn consent_for(files: &[MediaFile]) -> Consent {
        ConsentGate::new(Arc::new(AutoAcceptPrompt), 1_000_000)
            .request(files)
            .await
            .expect("accepted")
    }

    #[tokio::test]
    async fn test_signs_exactly_once() {
        let files = files();
        let consent = consent_for(&files).await;
        let signer = CountingSigner::new([9u8; 32]);

        let auth = BatchAuthorizer::new(20)
            .authorize(&files, &consent, &signer)
            .await
            .unwrap();
        assert_eq!(signer.calls(), 1);
        assert_eq!(auth.covered().len(), 2);
    }

    #[tokio::test]
    async fn test_covers_exactly_the_accepted_set() {
        let files = files();
        let consent = consent_for(&files).await;
        let signer = CountingSigner::new([9u8; 32]);

        let auth = BatchAuthorizer::new(20)
            .authorize(&files, &consent, &signer)
            .await
            .unwrap();

        for f in &files {
            assert!(auth.covers(&f.metadata().address));
        }
        let uncovered = MediaFile::new(&b"not in batch"[..], "image/png", "x.png");
        assert!(!auth.covers(&uncovered.metadata().address));
    }

    #[tokio::test]
    async fn test_empty_file_set() {
        let consent = consent_for(&[]).await;
        let signer = CountingSigner::new([9u8; 32]);
        let err = BatchAuthorizer::new(20)
            .authorize(&[], &consent, &signer)
            .await
            .unwrap_err();
        assert_eq!(err, AuthorizeError::EmptyFileSet);
        assert_eq!(signer.calls(), 0);
    }

    #[tokio::test]
    async fn test_consent_mismatch() {
        let files = files();
        let other = vec![MediaFile::new(&b"other"[..], "image/png", "z.png")];
        let consent = consent_for(&other).await;
        let signer = CountingSigner::new([9u8; 32]);

        let err = BatchAuthorizer::new(20)
            .authorize(&files, &consent, &signer)
            .await
            .unwrap_err();
        assert_eq!(err, AuthorizeError::ConsentMismatch);
        // The signer is never reached with a mismatched consent
        assert_eq!(signer.calls(), 0);
    }

    #[tokio::test]
    async fn test_signer_rejected_is_terminal() {
        let files = files();
        let consent = consent_for(&files).await;
        let err = BatchAuthorizer::new(20)
            .authorize(&files, &consent, &RejectingSigner)
            .await
            .unwrap_err();
        assert_eq!(err, AuthorizeError::SignerRejected);
    }

    #[tokio::test]
    async fn test_signer_unavailable() {
        let files = files();
        let consent = consent_for(&files).await;
        let err = BatchAuthorizer::new(20)
            .authorize(&files, &consent, &UnavailableSigner)
            .await
            .unwrap_err();
        assert_eq!(err, AuthorizeError::SignerUnavailable);
    }

    #[tokio::test]
    async fn test_expiry_is_explicit() {
        let files = files();
        let consent = consent_for(&files).await;
        let signer = CountingSigner::new([9u8; 32]);
        let before = Utc::now();

        let auth = BatchAuthorizer::new(20)
            .authorize(&files, &consent, &signer)
            .await
            .unwrap();
        assert!(auth.expires_at > before + Duration::minutes(19));
        assert!(auth.expires_at < before + Duration::minutes(21));
    }
}
