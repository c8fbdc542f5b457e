//! Wire messages exchanged with the host.
//!
//! Both directions use the same envelope, `{ "event": <name>, "data": <payload> }`.
//! Inbound commands are decoded leniently: anything without a string `event`,
//! with an unknown command name or with a payload of the wrong shape decodes to
//! `None` and is dropped by the manager. Outbound events are produced by the
//! manager and its proxies only, so they are plain serde-tagged enums.
//!
//! # Examples
//!
//! ```rust
//! use provider_worker::message::InboundMessage;
//! use serde_json::json;
//!
//! let message = InboundMessage::from_value(&json!({
//!     "event": "toggleFiltering",
//!     "data": { "enable": true }
//! }));
//! assert_eq!(message, Some(InboundMessage::ToggleFiltering { enable: true }));
//!
//! assert_eq!(InboundMessage::from_value(&json!({ "data": {} })), None);
//! assert_eq!(InboundMessage::from_value(&json!({ "event": "reboot" })), None);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::Result,
    fuzzy::FuzzyEvent,
    types::{ErrorCode, ImageContent, RetrieveRequest},
};

/// Commands accepted on the inbound channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Replace the fuzzy matcher's candidate list (`None` clears it)
    FuzzyList { list: Option<Vec<String>> },

    /// Create (or replace) the instance for `id` and start it
    RetrieveUrls(RetrieveRequest),

    /// Ask every registered instance to stop
    StopDownloads,

    /// Set the shared filter flag
    ToggleFiltering { enable: bool },
}

#[derive(Deserialize)]
struct FuzzyListData {
    #[serde(default)]
    list: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ToggleFilteringData {
    enable: bool,
}

impl InboundMessage {
    /// Decodes a command from its JSON envelope.
    ///
    /// Returns `None` when the message should be ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let event = value.get("event")?.as_str()?;
        let data = value.get("data").cloned().unwrap_or(Value::Null);

        match event {
            "fuzzyList" => {
                if data.is_null() {
                    return Some(InboundMessage::FuzzyList { list: None });
                }
                let data: FuzzyListData = serde_json::from_value(data).ok()?;
                Some(InboundMessage::FuzzyList { list: data.list })
            }
            "retrieveUrls" => serde_json::from_value(data)
                .ok()
                .map(InboundMessage::RetrieveUrls),
            "stopDownloads" => Some(InboundMessage::StopDownloads),
            "toggleFiltering" => {
                let data: ToggleFilteringData = serde_json::from_value(data).ok()?;
                Some(InboundMessage::ToggleFiltering {
                    enable: data.enable,
                })
            }
            _ => None,
        }
    }

    /// Decodes a command from JSON text.
    ///
    /// Invalid JSON is an error; valid JSON that is not a known command is
    /// `Ok(None)`.
    ///
    /// ```rust
    /// use provider_worker::message::InboundMessage;
    ///
    /// let message = InboundMessage::parse(r#"{"event":"stopDownloads"}"#).unwrap();
    /// assert_eq!(message, Some(InboundMessage::StopDownloads));
    /// assert!(InboundMessage::parse("{").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Wire name of the command.
    pub fn command(&self) -> &'static str {
        match self {
            InboundMessage::FuzzyList { .. } => "fuzzyList",
            InboundMessage::RetrieveUrls(_) => "retrieveUrls",
            InboundMessage::StopDownloads => "stopDownloads",
            InboundMessage::ToggleFiltering { .. } => "toggleFiltering",
        }
    }
}

/// Events emitted on the outbound channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Relabelled event from the fuzzy matcher
    FuzzyEvent(FuzzyEvent),

    /// A provider hit a rate limit and the cooldown was armed
    Timeout(TimeoutPayload),

    /// A provider reported a failure
    Error(ErrorPayload),

    /// A provider found an image
    Image(ImagePayload),

    /// A provider finished its request
    Completed(CompletedPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutPayload {
    pub provider: String,
    /// Cooldown length in seconds
    pub time: u64,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorCode,
    pub title: String,
    pub provider: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub content: ImageContent,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedPayload {
    pub title: String,
    pub id: String,
}

impl OutboundMessage {
    /// Wire name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundMessage::FuzzyEvent(_) => "fuzzyEvent",
            OutboundMessage::Timeout(_) => "timeout",
            OutboundMessage::Error(_) => "error",
            OutboundMessage::Image(_) => "image",
            OutboundMessage::Completed(_) => "completed",
        }
    }

    /// Request id the event belongs to, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            OutboundMessage::FuzzyEvent(_) => None,
            OutboundMessage::Timeout(p) => Some(&p.id),
            OutboundMessage::Error(p) => Some(&p.id),
            OutboundMessage::Image(p) => Some(&p.id),
            OutboundMessage::Completed(p) => Some(&p.id),
        }
    }

    /// Encodes the message as its `{event, data}` envelope.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Encodes the message as JSON text.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
