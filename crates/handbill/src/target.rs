//! The storage target boundary.
//!
//! A target accepts a blob addressed by its content digest, verifies the
//! address is covered by the presented batch credential, and answers with
//! the URL the blob is now reachable at. [`HttpStorageTarget`] talks to
//! remote servers; the in-memory target for tests lives in
//! [`crate::testing`].

use async_trait::async_trait;
use base64::Engine;
use billproto::{BatchAuthorization, TargetError};
use bytes::Bytes;
use mediacas::ContentAddress;
use serde::Deserialize;

/// A server's answer to a successful put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobReceipt {
    /// URL the blob is reachable at on this target.
    pub url: String,
}

/// One storage server the coordinator can upload to.
#[async_trait]
pub trait StorageTarget: Send + Sync {
    /// Short name for logging and outcome records.
    fn name(&self) -> &str;

    /// Store `bytes` under `address`, presenting `auth` as proof the user
    /// approved this blob. Must reject blobs whose address the credential
    /// does not cover.
    async fn put_blob(
        &self,
        address: &ContentAddress,
        bytes: Bytes,
        auth: &BatchAuthorization,
    ) -> Result<BlobReceipt, TargetError>;
}

/// Blob descriptor returned by HTTP storage servers.
#[derive(Debug, Deserialize)]
struct BlobDescriptor {
    url: String,
}

/// A content-addressed storage server spoken to over HTTP.
///
/// `PUT {base_url}/upload` with the blob as the body, the hex address in
/// `x-content-address`, and the batch credential (canonical JSON, base64)
/// in the `Authorization` header. The server answers with a JSON blob
/// descriptor; if the body is not a descriptor, the URL is composed from
/// the base URL and the address.
pub struct HttpStorageTarget {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpStorageTarget {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn credential_header(auth: &BatchAuthorization) -> Result<String, TargetError> {
        let json = serde_json::to_vec(auth).map_err(|e| TargetError::Rejected {
            message: format!("credential serialization failed: {}", e),
        })?;
        Ok(format!(
            "Handbill {}",
            base64::engine::general_purpose::STANDARD.encode(json)
        ))
    }
}

#[async_trait]
impl StorageTarget for HttpStorageTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put_blob(
        &self,
        address: &ContentAddress,
        bytes: Bytes,
        auth: &BatchAuthorization,
    ) -> Result<BlobReceipt, TargetError> {
        let url = format!("{}/upload", self.base_url);
        let response = self
            .client
            .put(&url)
            .header("authorization", Self::credential_header(auth)?)
            .header("x-content-address", address.digest_hex())
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| TargetError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TargetError::NotCovered);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TargetError::Rejected {
                message: format!("{}: {}", status, message),
            });
        }

        let fallback = format!("{}/{}", self.base_url, address.digest_hex());
        let url = match response.json::<BlobDescriptor>().await {
            Ok(descriptor) => descriptor.url,
            Err(_) => fallback,
        };
        Ok(BlobReceipt { url })
    }
}
