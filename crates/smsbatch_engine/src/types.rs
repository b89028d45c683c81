use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub type Ticket = u64;

/// JSON body of the remote send operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsSendRequest {
    pub tpl_id: String,
    pub data: BTreeMap<String, String>,
    pub mobile: Vec<String>,
    pub max_try: Option<u32>,
    /// `YYYY-MM-DD HH:MM:SS`, or null to send now.
    pub send_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tpl_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SendCompleted {
        ticket: Ticket,
        result: Result<SendReceipt, SendError>,
    },
    TemplatesLoaded {
        user_id: u64,
        result: Result<Vec<TemplateSummary>, SendError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SendError {
    pub kind: FailureKind,
    pub message: String,
}

impl SendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// The configured token cannot be sent as an HTTP header.
    InvalidAuthToken,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    /// The server answered but refused the request.
    Rejected { code: String, state: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidAuthToken => write!(f, "invalid auth token"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Rejected { code, state } => write!(f, "rejected ({code}/{state})"),
        }
    }
}

/// Response envelope shared by every API method.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope {
    pub result: ApiResult,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResult {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub message: String,
}

impl ApiResult {
    pub fn is_ok(&self) -> bool {
        self.code == "200" && self.state == "ok"
    }
}

/// Ids and codes arrive as strings from some handlers and as numbers from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
