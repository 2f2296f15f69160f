//! Error types for the worker core.
//!
//! Per-cycle errors (`FetchError`, `TransformError`, `DeliveryError`) are
//! caught at the cycle boundary and logged; `ConfigError` is fatal and
//! raised before any loop starts.

use thiserror::Error;

/// The content or forecast source could not produce a usable batch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source was unreachable or answered with a transport error.
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// The source answered, but the payload could not be parsed.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The requested forecast hour is not present in the response.
    #[error("no entry for requested hour: {0}")]
    MissingEntry(String),
}

/// The summarization call failed or returned unusable output.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("summarizer call failed: {0}")]
    Request(String),

    #[error("summarizer returned unusable output: {0}")]
    EmptyOutput(String),
}

/// The notification transport failed to accept the message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery transport failed: {0}")]
    Transport(String),

    #[error("delivery rejected by gateway: {0}")]
    Rejected(String),
}

/// Required settings absent or invalid at startup. Fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", vars.join(", "))]
    MissingVars { vars: Vec<String> },

    #[error("invalid configuration: {field} = {value}")]
    Invalid { field: String, value: String },

    #[error("reading slots config {path}: {reason}")]
    SlotsFile { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_fetch_unreachable() {
        let err = FetchError::Unreachable("connection refused".into());
        assert_eq!(err.to_string(), "source unreachable: connection refused");
    }

    #[test]
    fn display_missing_vars_joins_names() {
        let err = ConfigError::MissingVars {
            vars: vec!["SMS_ACCOUNT_SID".into(), "SMS_AUTH_TOKEN".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing required environment variables: SMS_ACCOUNT_SID, SMS_AUTH_TOKEN"
        );
    }

    #[test]
    fn display_invalid_field() {
        let err = ConfigError::Invalid {
            field: "POLL_INTERVAL_SECS".into(),
            value: "7200".into(),
        };
        assert_eq!(err.to_string(), "invalid configuration: POLL_INTERVAL_SECS = 7200");
    }
}
