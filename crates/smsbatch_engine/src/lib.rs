//! Smsbatch engine: remote API client, cancellable dispatch and persistence.
mod api;
mod engine;
mod persist;
mod types;

pub use api::{ApiSettings, ReqwestSmsApi, SmsApi};
pub use engine::{EngineError, EngineHandle};
pub use persist::{ensure_parent_dir, write_atomic, PersistError};
pub use types::{
    EngineEvent, FailureKind, SendError, SendReceipt, SmsSendRequest, TemplateSummary, Ticket,
};
