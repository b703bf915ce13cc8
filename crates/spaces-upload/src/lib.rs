//! # spaces-upload
//!
//! Upload a buffer to an S3-compatible bucket (DigitalOcean Spaces by
//! default) with a public-read ACL and get back its public URL.
//!
//! Only single-request `PUT` uploads are supported; there is no multipart
//! upload, listing or deletion. Requests are signed with AWS Signature
//! Version 4, which Spaces, MinIO and S3 all accept.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spaces_upload::{SpacesClient, SpacesConfig};
//!
//! # async fn run() -> Result<(), spaces_upload::SpacesError> {
//! let config = SpacesConfig::new("ACCESS", "SECRET").bucket("menus");
//! let client = SpacesClient::new(config)?;
//! let url = client.put_object("scans/1.png", vec![0u8; 4], "image/png").await?;
//! println!("{url}");
//! # Ok(())
//! # }
//! ```

pub mod sigv4;

use chrono::Utc;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

pub const DEFAULT_ENDPOINT: &str = "ams3.digitaloceanspaces.com";
pub const DEFAULT_REGION: &str = "ams3";
pub const DEFAULT_BUCKET: &str = "orderpay-public";
pub const PUBLIC_READ: &str = "public-read";

/// Errors returned by [`SpacesClient`].
#[derive(Debug, Error)]
pub enum SpacesError {
    #[error("Spaces credentials are missing: {0} is empty")]
    MissingCredentials(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to sign request for '{key}'")]
    Signing { key: String },

    #[error("Upload of '{key}' failed: {source}")]
    Transport {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upload of '{key}' rejected with HTTP {status}: {body}")]
    Rejected { key: String, status: u16, body: String },
}

/// Connection settings for one bucket.
#[derive(Clone)]
pub struct SpacesConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl SpacesConfig {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            timeout_secs: None,
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Virtual-hosted bucket host, e.g. `orderpay-public.ams3.digitaloceanspaces.com`.
    pub fn host(&self) -> String {
        let endpoint = self
            .endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        format!("{}.{}", self.bucket, endpoint)
    }

    /// Public URL an object under `key` is reachable at.
    pub fn object_url(&self, key: &str) -> String {
        format!("https://{}/{}", self.host(), sigv4::encode_key(key))
    }
}

impl fmt::Debug for SpacesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpacesConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Uploads objects to one bucket.
#[derive(Debug, Clone)]
pub struct SpacesClient {
    config: SpacesConfig,
    http: reqwest::Client,
}

impl SpacesClient {
    pub fn new(config: SpacesConfig) -> Result<Self, SpacesError> {
        if config.access_key.is_empty() {
            return Err(SpacesError::MissingCredentials("access key"));
        }
        if config.secret_key.is_empty() {
            return Err(SpacesError::MissingCredentials("secret key"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| SpacesError::Client(e.to_string()))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SpacesConfig {
        &self.config
    }

    /// Upload `body` under `key` with a public-read ACL and return its URL.
    pub async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SpacesError> {
        let host = self.config.host();
        let acl = [("x-amz-acl", PUBLIC_READ)];
        let signed = sigv4::sign(&sigv4::SigningInput {
            method: "PUT",
            host: &host,
            key,
            amz_headers: &acl,
            payload: &body,
            region: &self.config.region,
            service: "s3",
            access_key: &self.config.access_key,
            secret_key: &self.config.secret_key,
            timestamp: Utc::now(),
        })
        .map_err(|_| SpacesError::Signing {
            key: key.to_string(),
        })?;

        let url = self.config.object_url(key);
        debug!("PUT {} ({} bytes)", url, body.len());

        let response = self
            .http
            .put(&url)
            .header("authorization", signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header("x-amz-acl", PUBLIC_READ)
            .header("content-type", content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Upload of '{}' failed: {}", key, e);
                SpacesError::Transport {
                    key: key.to_string(),
                    source: e,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Upload of '{}' rejected: HTTP {} {}", key, status, body);
            return Err(SpacesError::Rejected {
                key: key.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_ams3() {
        let config = SpacesConfig::new("a", "b");
        assert_eq!(config.host(), "orderpay-public.ams3.digitaloceanspaces.com");
    }

    #[test]
    fn object_url_is_virtual_hosted() {
        let config = SpacesConfig::new("a", "b")
            .bucket("menus")
            .endpoint("https://fra1.digitaloceanspaces.com/");
        assert_eq!(
            config.object_url("scans/17.png"),
            "https://menus.fra1.digitaloceanspaces.com/scans/17.png"
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let config = SpacesConfig::new("AKID", "very-secret");
        let printed = format!("{config:?}");
        assert!(printed.contains("AKID"));
        assert!(!printed.contains("very-secret"));
    }

    #[test]
    fn empty_credentials_rejected() {
        let err = SpacesClient::new(SpacesConfig::new("", "x")).unwrap_err();
        assert!(matches!(err, SpacesError::MissingCredentials("access key")));
        let err = SpacesClient::new(SpacesConfig::new("x", "")).unwrap_err();
        assert!(matches!(err, SpacesError::MissingCredentials("secret key")));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let config = SpacesConfig::new("a", "b")
            .endpoint("127.0.0.1:9")
            .bucket("localhost")
            .timeout_secs(2);
        let client = SpacesClient::new(config).unwrap();
        let err = client
            .put_object("k.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, SpacesError::Transport { .. }), "got {err:?}");
    }
}
