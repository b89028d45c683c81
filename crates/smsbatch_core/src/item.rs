use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Literal format the send endpoint expects for scheduled sends.
pub const SEND_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    pub value: String,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SendSchedule {
    #[default]
    Now,
    /// Local wall-clock time, forwarded to the server as-is.
    At(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    Pending,
    Loading,
    Finished,
    Error,
}

/// One logical message dispatched to one or more destinations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SendItem {
    pub field_values: Vec<FieldValue>,
    pub destinations: Vec<String>,
    pub schedule: SendSchedule,
    pub max_retries: Option<u32>,
    pub status: ItemStatus,
    pub last_error: Option<String>,
}

impl SendItem {
    pub fn new(destinations: Vec<String>) -> Self {
        Self {
            destinations,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_values.push(FieldValue::new(name, value));
        self
    }

    pub fn with_schedule(mut self, schedule: SendSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// A retry count of zero is the same as leaving it unset.
    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries.filter(|n| *n > 0);
        self
    }

    pub fn send_immediately(&self) -> bool {
        matches!(self.schedule, SendSchedule::Now)
    }

    pub fn scheduled_time(&self) -> Option<NaiveDateTime> {
        match self.schedule {
            SendSchedule::Now => None,
            SendSchedule::At(time) => Some(time),
        }
    }

    /// `None` means "send now".
    pub fn send_time_literal(&self) -> Option<String> {
        self.scheduled_time()
            .map(|time| time.format(SEND_TIME_FORMAT).to_string())
    }

    pub fn is_finished(&self) -> bool {
        self.status == ItemStatus::Finished
    }

    /// Item as freshly added: editable fields kept, progress cleared.
    pub(crate) fn into_pending(self) -> Self {
        Self {
            status: ItemStatus::Pending,
            last_error: None,
            ..self
        }
    }
}
