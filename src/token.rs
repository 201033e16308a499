//! Signed token issuance
//!
//! Two token shapes are needed by the providers:
//!
//! - a short-lived HS256 API token keyed by an API key/secret pair, sent
//!   directly as a bearer token
//! - an RS256 service-account assertion, exchanged at an OAuth token endpoint
//!   for a bearer access token
//!
//! Expiry is always computed from an explicit issue time so it can be tested
//! without touching the clock.

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::secret::Secret;

/// Default lifetime of an HS256 API token
pub const DEFAULT_API_TOKEN_TTL: Duration = Duration::from_secs(30);

/// Lifetime of a service-account assertion (the OAuth maximum)
pub const SERVICE_ACCOUNT_ASSERTION_TTL: Duration = Duration::from_secs(3600);

/// Google's OAuth token endpoint, used when a key file omits `token_uri`
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Errors raised while building or signing a token
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token lifetime must be positive")]
    ZeroTtl,
    #[error("token lifetime of {seconds}s is out of range")]
    TtlOutOfRange { seconds: u64 },
    #[error("failed to read service account key {path}: {source}")]
    ReadKey {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse service account key {path}: {source}")]
    ParseKey {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid signing key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),
    #[error("failed to encode token: {0}")]
    Encode(jsonwebtoken::errors::Error),
}

/// Unix timestamp at which a token issued at `issued_at` stops being valid
pub fn expiry_after(issued_at: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    if ttl.is_zero() {
        return Err(TokenError::ZeroTtl);
    }
    let seconds = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::TtlOutOfRange {
        seconds: ttl.as_secs(),
    })?;
    issued_at
        .timestamp()
        .checked_add(seconds)
        .ok_or(TokenError::TtlOutOfRange {
            seconds: ttl.as_secs(),
        })
}

/// Claims of an HS256 API token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTokenClaims {
    pub iss: String,
    pub exp: i64,
}

/// Issues HS256 tokens for a single API key/secret pair
#[derive(Debug, Clone)]
pub struct ApiTokenIssuer {
    api_key: String,
    api_secret: Secret,
    ttl: Duration,
}

impl ApiTokenIssuer {
    pub fn new(api_key: String, api_secret: Secret, ttl: Duration) -> Self {
        Self {
            api_key,
            api_secret,
            ttl,
        }
    }

    /// Sign a token valid from now
    pub fn issue(&self) -> Result<String, TokenError> {
        self.issue_at(Utc::now())
    }

    /// Sign a token as if issued at `now`
    pub fn issue_at(&self, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = ApiTokenClaims {
            iss: self.api_key.clone(),
            exp: expiry_after(now, self.ttl)?,
        };
        let key = EncodingKey::from_secret(self.api_secret.expose().as_bytes());
        let token =
            encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(TokenError::Encode)?;

        debug!(exp = claims.exp, "Issued API token");
        Ok(token)
    }
}

/// Fields of a service-account JSON key file that are needed for signing
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: Secret,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Claims of a service-account assertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl ServiceAccountKey {
    /// Read and parse a key file
    pub fn from_file(path: &Path) -> Result<Self, TokenError> {
        let raw = std::fs::read_to_string(path).map_err(|source| TokenError::ReadKey {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| TokenError::ParseKey {
            path: path.display().to_string(),
            source,
        })
    }

    /// Sign an assertion for the given scopes, optionally impersonating `subject`
    pub fn assertion(
        &self,
        scopes: &[String],
        subject: Option<&str>,
        audience: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scopes.join(" "),
            aud: audience.to_string(),
            sub: subject.map(str::to_string),
            iat: now.timestamp(),
            exp: expiry_after(now, SERVICE_ACCOUNT_ASSERTION_TTL)?,
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.expose().as_bytes())
            .map_err(TokenError::InvalidKey)?;
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let token = encode(&header, &claims, &key).map_err(TokenError::Encode)?;
        debug!(
            iss = %claims.iss,
            aud = %claims.aud,
            exp = claims.exp,
            "Signed service account assertion"
        );
        Ok(token)
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}
