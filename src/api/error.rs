//! Errors raised by the registry API client

use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Shown when the server gives no usable message
pub const FALLBACK_MESSAGE: &str = "Erreur lors de l'enregistrement";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server answered {status}")]
    Status { status: u16, message: Option<String> },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error, probing the body for `message` then `msg`
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            message: server_message(body),
        }
    }

    /// The text to show the operator
    pub fn user_message(&self) -> String {
        self.user_message_or(FALLBACK_MESSAGE)
    }

    /// Server message, or `fallback` when the server gave none
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

fn server_message(body: &str) -> Option<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    ["message", "msg"]
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}
