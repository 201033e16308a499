//! # Error Handling
//!
//! Provider calls fail with one of a small set of error kinds. Each provider
//! logs its own failure and hands the error back so the orchestrator can keep
//! going and report every outcome.

use thiserror::Error;

/// Failure of a single provider call
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Credential loading, token signing or token exchange failed
    #[error("authentication failed: {details}")]
    Auth { details: String },

    /// The request never produced a usable HTTP response
    #[error("transport error: {details}")]
    Transport { details: String },

    /// The provider answered but refused the request, either with a non-2xx
    /// status or with an application-level rejection in a 2xx body
    #[error(
        "remote rejected request (HTTP {status}): {}",
        rejection_detail(.code.as_deref(), .body.as_deref())
    )]
    RemoteRejection {
        status: u16,
        code: Option<String>,
        body: Option<String>,
    },

    /// The response body could not be decoded
    #[error("failed to decode response: {details}")]
    Decode { details: String },
}

impl ProvisionError {
    pub fn auth<S: Into<String>>(details: S) -> Self {
        Self::Auth {
            details: details.into(),
        }
    }

    pub fn transport<S: Into<String>>(details: S) -> Self {
        Self::Transport {
            details: details.into(),
        }
    }

    pub fn decode<S: Into<String>>(details: S) -> Self {
        Self::Decode {
            details: details.into(),
        }
    }

    /// Non-2xx HTTP status with the response body, if any
    pub fn http_status(status: u16, body: Option<String>) -> Self {
        Self::RemoteRejection {
            status,
            code: None,
            body: body.filter(|b| !b.trim().is_empty()),
        }
    }

    /// Response whose body reports a logical failure code
    pub fn rejected<S: Into<String>>(status: u16, code: Option<S>) -> Self {
        Self::RemoteRejection {
            status,
            code: code.map(Into::into),
            body: None,
        }
    }

    /// Short label used as a structured log field
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Transport { .. } => "transport",
            Self::RemoteRejection { .. } => "remote_rejection",
            Self::Decode { .. } => "decode",
        }
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

fn rejection_detail(code: Option<&str>, body: Option<&str>) -> String {
    match (code, body) {
        (Some(code), _) => code.to_string(),
        (None, Some(body)) => body.to_string(),
        (None, None) => "no details".to_string(),
    }
}
