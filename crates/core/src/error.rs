use std::time::Duration;

/// Failures of the injected HTTP GET capability.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },
}

/// Failures reaching the symptom checker.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("symptom checker request failed: {0}")]
    Http(#[from] HttpError),
    #[error("symptom checker did not answer within {0:?}")]
    Timeout(Duration),
    #[error("invalid diagnosis query: {0}")]
    InvalidQuery(String),
}

/// Failures reading a symptom checker response document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("diagnosis response malformed at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Failures delivering an outbound message.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("send request failed: {0}")]
    Transport(String),
    #[error("send API rejected message with status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("send API returned an unreadable response: {0}")]
    InvalidResponse(String),
    #[error("failed to serialise message: {0}")]
    Serialization(#[from] messenger::MessengerError),
}

/// Failures resolving startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
