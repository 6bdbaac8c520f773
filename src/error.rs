//! Error types for workflow execution
//!
//! Errors are classified by how a run should react:
//! - Retryable: network issues, rate limits, transient upstream failures
//! - Fatal for the run: rejected credentials, malformed upstream responses
//! - Configuration: bad config file, holidays, cron expressions or timezones

use thiserror::Error;

use crate::types::WorkflowId;

/// Error types for workflow execution
#[derive(Debug, Error)]
pub enum ExecutionError {
    // Retryable errors
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API rate limit exceeded")]
    ApiRateLimit,

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    // Fatal for the run
    #[error("{service} rejected the configured credentials")]
    UpstreamAuth { service: &'static str },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("{} workflow is already running", .0.as_str())]
    AlreadyRunning(WorkflowId),

    #[error("Workflow task failed: {0}")]
    TaskFailed(String),

    // Configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to parse: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl ExecutionError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ExecutionError::NetworkError(_) | ExecutionError::ApiRateLimit => true,
            ExecutionError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get a recovery suggestion for logs and error envelopes
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ExecutionError::NetworkError(_) => "Check connectivity to Slack and Harvest.",
            ExecutionError::ApiRateLimit => "Increase the throttle interval and try again.",
            ExecutionError::Upstream { .. } => "The upstream service failed. Try again later.",
            ExecutionError::UpstreamAuth { .. } => "Check the API credentials in config.json.",
            ExecutionError::MalformedResponse(_) => "Check the upstream API version and token scopes.",
            ExecutionError::AlreadyRunning(_) => "Wait for the current run to finish.",
            ExecutionError::TaskFailed(_) => "Check the logs for a panic in the workflow.",
            ExecutionError::ConfigurationError(_) => "Check your configuration in ~/.timenag/config.json",
            ExecutionError::ParseError(_) => "Check the file format is correct.",
            ExecutionError::IoError(_) => "Check file permissions.",
        }
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(err: std::io::Error) -> Self {
        ExecutionError::IoError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ExecutionError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExecutionError::TaskFailed(err.to_string())
    }
}

impl From<reqwest::Error> for ExecutionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExecutionError::MalformedResponse(err.to_string())
        } else {
            ExecutionError::NetworkError(err.to_string())
        }
    }
}

/// Map a non-success HTTP status from an upstream API to an error.
pub fn status_error(service: &'static str, status: reqwest::StatusCode, body: String) -> ExecutionError {
    match status.as_u16() {
        401 | 403 => ExecutionError::UpstreamAuth { service },
        429 => ExecutionError::ApiRateLimit,
        code => ExecutionError::Upstream { status: code, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_upstream_auth() {
        let err = status_error("Harvest", reqwest::StatusCode::UNAUTHORIZED, String::new());
        assert!(matches!(err, ExecutionError::UpstreamAuth { service: "Harvest" }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        assert!(status_error("Slack", reqwest::StatusCode::TOO_MANY_REQUESTS, String::new())
            .is_retryable());
        assert!(status_error("Slack", reqwest::StatusCode::BAD_GATEWAY, String::new())
            .is_retryable());
        assert!(!status_error("Slack", reqwest::StatusCode::NOT_FOUND, String::new())
            .is_retryable());
    }
}
