//! Smsbatch core: pure bulk-send state machine, bulk text parser and view-model helpers.
mod effect;
mod item;
mod msg;
mod parse;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, SendRequest, StopReason};
pub use item::{FieldValue, ItemStatus, SendItem, SendSchedule, SEND_TIME_FORMAT};
pub use msg::{Msg, SendOutcome};
pub use parse::{parse_bulk, validate_mobile, BulkParseError, ParseErrorKind};
pub use state::{BatchSnapshot, BatchState, InFlight, TemplateId, Ticket};
pub use update::update;
pub use view_model::{BatchViewModel, ItemRowView};
