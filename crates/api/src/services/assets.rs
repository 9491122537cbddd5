//! External asset store client.
//!
//! The marketplace never touches file contents beyond relaying bytes:
//! uploads go to an external blob store over HTTP, and downloads are
//! authorized here by minting HMAC-signed, time-limited URLs the store
//! validates on its side.

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use url::Url;

use crate::config::AssetStoreConfig;

type HmacSha256 = Hmac<Sha256>;

/// What an uploaded blob contains; the store segregates them by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Cover art or screenshot.
    Image,
    /// Trailer video.
    Video,
    /// Downloadable game build.
    Build,
}

impl AssetKind {
    /// Wire label for the store API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Build => "build",
        }
    }

    /// Parse an upload form label.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "build" => Some(Self::Build),
            _ => None,
        }
    }
}

/// Errors talking to the asset store.
#[derive(Debug, thiserror::Error)]
pub enum AssetStoreError {
    /// The configured base URL does not parse.
    #[error("invalid asset store URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// Transport-level failure.
    #[error("asset store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with something unusable.
    #[error("unexpected asset store response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Deserialize)]
struct StoreResponse {
    reference: String,
}

/// Client for the external blob store.
#[derive(Clone)]
pub struct AssetStore {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    signing_key: SecretString,
    link_ttl: Duration,
}

impl AssetStore {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AssetStoreError::InvalidBaseUrl` if the base URL is invalid,
    /// or `AssetStoreError::Http` if the HTTP client cannot be built.
    pub fn new(config: &AssetStoreConfig) -> Result<Self, AssetStoreError> {
        let base_url = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            signing_key: config.signing_key.clone(),
            link_ttl: Duration::seconds(i64::try_from(config.link_ttl_secs).unwrap_or(900)),
        })
    }

    /// Upload bytes, returning the store's opaque reference.
    ///
    /// # Errors
    ///
    /// Returns `AssetStoreError` if the upload fails; callers surface this
    /// as a dependency error, never silently.
    pub async fn store(
        &self,
        bytes: Vec<u8>,
        kind: AssetKind,
        filename: &str,
    ) -> Result<String, AssetStoreError> {
        let mut url = self.base_url.join("v1/objects")?;
        url.query_pairs_mut()
            .append_pair("kind", kind.as_str())
            .append_pair("filename", filename);

        let response = self
            .http
            .post(url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetStoreError::UnexpectedResponse(format!(
                "upload returned {status}"
            )));
        }

        let body: StoreResponse = response
            .json()
            .await
            .map_err(|e| AssetStoreError::UnexpectedResponse(e.to_string()))?;

        Ok(body.reference)
    }

    /// Mint a time-limited, signed download URL for a stored reference.
    ///
    /// The signature covers `reference:expires`, so neither can be swapped
    /// without invalidating the link. No network round-trip is needed.
    ///
    /// # Errors
    ///
    /// Returns `AssetStoreError::InvalidBaseUrl` if the reference produces
    /// an invalid URL.
    pub fn resolve(&self, reference: &str) -> Result<Url, AssetStoreError> {
        let expires = (Utc::now() + self.link_ttl).timestamp();
        let signature = sign(self.signing_key.expose_secret(), reference, expires);

        let mut url = self.base_url.join(&format!("v1/objects/{reference}"))?;
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("sig", &signature);

        Ok(url)
    }
}

/// HMAC-SHA256 over `reference:expires`, hex-encoded.
fn sign(key: &str, reference: &str, expires: i64) -> String {
    // HMAC accepts keys of any length
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("hmac accepts any key length");
    mac.update(reference.as_bytes());
    mac.update(b":");
    mac.update(expires.to_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_store() -> AssetStore {
        AssetStore::new(&AssetStoreConfig {
            base_url: "http://blobs.internal:9000".to_owned(),
            api_key: SecretString::from("k3y"),
            signing_key: SecretString::from("0123456789abcdef0123456789abcdef"),
            link_ttl_secs: 900,
        })
        .unwrap()
    }

    #[test]
    fn test_sign_is_deterministic() {
        let a = sign("key", "ref-1", 1_700_000_000);
        let b = sign("key", "ref-1", 1_700_000_000);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_sign_varies_with_inputs() {
        let base = sign("key", "ref-1", 1_700_000_000);
        assert_ne!(base, sign("key", "ref-2", 1_700_000_000));
        assert_ne!(base, sign("key", "ref-1", 1_700_000_001));
        assert_ne!(base, sign("other-key", "ref-1", 1_700_000_000));
    }

    #[test]
    fn test_resolve_shape() {
        let store = test_store();
        let url = store.resolve("games/42/build.zip").unwrap();

        assert!(url.path().ends_with("v1/objects/games/42/build.zip"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.iter().any(|(k, _)| k == "expires"));
        assert!(pairs.iter().any(|(k, v)| k == "sig" && v.len() == 64));
    }

    #[test]
    fn test_resolve_expiry_in_future() {
        let store = test_store();
        let url = store.resolve("r").unwrap();
        let expires: i64 = url
            .query_pairs()
            .find(|(k, _)| k == "expires")
            .map(|(_, v)| v.parse().unwrap())
            .unwrap();
        assert!(expires > Utc::now().timestamp());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = AssetStore::new(&AssetStoreConfig {
            base_url: "not a url".to_owned(),
            api_key: SecretString::from("k"),
            signing_key: SecretString::from("k"),
            link_ttl_secs: 900,
        });
        assert!(matches!(result, Err(AssetStoreError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_asset_kind_labels() {
        assert_eq!(AssetKind::parse("image"), Some(AssetKind::Image));
        assert_eq!(AssetKind::parse("video"), Some(AssetKind::Video));
        assert_eq!(AssetKind::parse("build"), Some(AssetKind::Build));
        assert_eq!(AssetKind::parse("executable"), None);
        assert_eq!(AssetKind::Build.as_str(), "build");
    }
}
