use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Raindrop,
    WordPress,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Raindrop => write!(f, "raindrop"),
            Service::WordPress => write!(f, "wordpress"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(String),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure talking to one of the two remote services.
///
/// The `Display` output is what the trigger returns as its 500 body, so it
/// prefers the message the remote service put in its error payload.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },
    #[error("{}", status_message(.service, .status, .message))]
    Status {
        service: Service,
        status: StatusCode,
        message: Option<String>,
    },
    #[error("failed to decode {service} response: {source}")]
    Decode {
        service: Service,
        #[source]
        source: reqwest::Error,
    },
}

fn status_message(service: &Service, status: &StatusCode, message: &Option<String>) -> String {
    match message {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => format!("{} returned {}", service, status),
    }
}

impl UpstreamError {
    pub fn service(&self) -> Service {
        match self {
            UpstreamError::Transport { service, .. }
            | UpstreamError::Status { service, .. }
            | UpstreamError::Decode { service, .. } => *service,
        }
    }
}

/// Pulls a human readable message out of a remote error body.
///
/// WordPress answers `{"code": .., "message": ..}`; Raindrop answers
/// `{"result": false, "errorMessage": ..}`.
pub fn remote_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "errorMessage", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
