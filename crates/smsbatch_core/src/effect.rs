use crate::{FieldValue, TemplateId, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send { ticket: Ticket, request: SendRequest },
    AbortSend { ticket: Ticket },
    RunStopped { reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every item was attempted.
    Exhausted,
    Cancelled,
}

/// Everything the remote send operation needs for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub item_index: usize,
    pub template_id: TemplateId,
    pub field_values: Vec<FieldValue>,
    pub destinations: Vec<String>,
    pub max_retries: Option<u32>,
    pub send_time: Option<String>,
}
