use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::entry::EntryForm;

/// Everything a live view reacts to. Client actions and the timer tick share
/// one queue per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Submit(EntryForm),
    Clear,
    /// Manual pull of the latest entries (embedded component)
    Refresh,
    /// New configuration from the embedding host
    Update(HostConfig),
    /// Periodic timer; never sent by clients
    Tick,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("invalid payload for {action}: {source}")]
    InvalidPayload {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ViewEvent {
    /// Decode a client action. `payload` is `Value::Null` when the client
    /// sent no body.
    pub fn from_action(name: &str, payload: Value) -> Result<Self, EventError> {
        match name {
            "submit" => decode(payload, "submit").map(ViewEvent::Submit),
            "clear" => Ok(ViewEvent::Clear),
            "refresh" => Ok(ViewEvent::Refresh),
            "update" => decode(payload, "update").map(ViewEvent::Update),
            other => Err(EventError::UnknownAction(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewEvent::Submit(_) => "submit",
            ViewEvent::Clear => "clear",
            ViewEvent::Refresh => "refresh",
            ViewEvent::Update(_) => "update",
            ViewEvent::Tick => "tick",
        }
    }
}

fn decode<T>(payload: Value, action: &'static str) -> Result<T, EventError>
where
    T: DeserializeOwned + Default,
{
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload).map_err(|source| EventError::InvalidPayload { action, source })
}

/// Assigns supplied by an embedding host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Opaque instance identifier
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "hostApp")]
    pub host_app: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
}
