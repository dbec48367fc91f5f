//! Minimal configuration loading for Handbill.
//!
//! Loads from a TOML file with environment-variable overrides, falling back
//! to defaults that work out of the box.
//!
//! Environment variables:
//! - `HANDBILL_CONFIG`: path to the config file (default: `~/.handbill/config.toml`)
//! - `HANDBILL_TARGETS`: comma-separated storage target base URLs (overrides the file)
//! - `HANDBILL_UPLOAD_CONCURRENCY`: max concurrent uploads (overrides the file)
//!
//! Example config file:
//! ```toml
//! [policy]
//! max_files = 10
//! max_file_bytes = 104857600
//! max_total_bytes = 524288000
//! allowed_types = ["image/*", "audio/*", "video/*"]
//!
//! [upload]
//! concurrency = 4
//! estimate_bytes_per_sec = 1048576
//!
//! [auth]
//! ttl_minutes = 20
//!
//! [[targets]]
//! name = "primary"
//! url = "https://media.example.com"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Limits applied to a candidate file set before any signing or network work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPolicy {
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    /// Allowed MIME patterns. A trailing `/*` matches any subtype.
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

fn default_max_files() -> usize {
    10
}

fn default_max_file_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_max_total_bytes() -> u64 {
    500 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/*".to_string(),
        "audio/*".to_string(),
        "video/*".to_string(),
    ]
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_bytes: default_max_file_bytes(),
            max_total_bytes: default_max_total_bytes(),
            allowed_types: default_allowed_types(),
        }
    }
}

impl MediaPolicy {
    /// Whether a MIME type matches the allowed patterns.
    pub fn allows(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        self.allowed_types.iter().any(|pattern| {
            let pattern = pattern.to_ascii_lowercase();
            match pattern.strip_suffix("/*") {
                Some(top) => mime.split('/').next() == Some(top),
                None => mime == pattern,
            }
        })
    }
}

/// Upload coordinator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Max concurrent (file, target) uploads.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Assumed transfer rate for the consent-time duration estimate.
    #[serde(default = "default_estimate_rate")]
    pub estimate_bytes_per_sec: u64,
}

fn default_concurrency() -> usize {
    4
}

fn default_estimate_rate() -> u64 {
    1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            estimate_bytes_per_sec: default_estimate_rate(),
        }
    }
}

/// Batch-authorization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Credential lifetime. Short-lived on purpose: the credential only
    /// needs to outlive the upload batch it authorizes.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,
}

fn default_ttl_minutes() -> i64 {
    20
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

/// One storage target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub url: String,
}

/// Top-level Handbill configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandbillConfig {
    #[serde(default)]
    pub policy: MediaPolicy,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// Default config file path (~/.handbill/config.toml).
fn default_config_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".handbill").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".handbill/config.toml"))
}

impl HandbillConfig {
    /// Load from the environment: reads `HANDBILL_CONFIG` (or the default
    /// path) if the file exists, then applies env overrides.
    pub fn from_env() -> Result<Self> {
        let path = env::var("HANDBILL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(targets) = env::var("HANDBILL_TARGETS") {
            self.targets = targets
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .enumerate()
                .map(|(i, url)| TargetConfig {
                    name: format!("target-{}", i),
                    url: url.trim().to_string(),
                })
                .collect();
        }
        if let Ok(concurrency) = env::var("HANDBILL_UPLOAD_CONCURRENCY") {
            self.upload.concurrency = concurrency
                .parse()
                .context("HANDBILL_UPLOAD_CONCURRENCY must be a positive integer")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HandbillConfig::default();
        assert_eq!(config.policy.max_files, 10);
        assert_eq!(config.upload.concurrency, 4);
        assert_eq!(config.auth.ttl_minutes, 20);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_policy_allows_wildcards() {
        let policy = MediaPolicy::default();
        assert!(policy.allows("image/png"));
        assert!(policy.allows("AUDIO/WAV"));
        assert!(policy.allows("video/mp4"));
        assert!(!policy.allows("application/pdf"));
        assert!(!policy.allows("text/plain"));
    }

    #[test]
    fn test_policy_exact_match() {
        let policy = MediaPolicy {
            allowed_types: vec!["image/png".to_string()],
            ..Default::default()
        };
        assert!(policy.allows("image/png"));
        assert!(!policy.allows("image/jpeg"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[policy]
max_files = 3

[upload]
concurrency = 2

[[targets]]
name = "primary"
url = "https://media.example.com"

[[targets]]
name = "mirror"
url = "https://mirror.example.com"
"#
        )
        .unwrap();

        let config = HandbillConfig::from_file(file.path()).unwrap();
        assert_eq!(config.policy.max_files, 3);
        // Unset fields fall back to serde defaults
        assert_eq!(config.policy.max_file_bytes, 100 * 1024 * 1024);
        assert_eq!(config.upload.concurrency, 2);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[1].name, "mirror");
    }

    #[test]
    fn test_from_file_missing() {
        let result = HandbillConfig::from_file(Path::new("/nonexistent/handbill.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        assert!(HandbillConfig::from_file(file.path()).is_err());
    }
}
