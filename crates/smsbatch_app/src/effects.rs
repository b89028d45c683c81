use std::collections::BTreeMap;
use std::time::Duration;

use batch_logging::{batch_debug, batch_info, batch_warn};
use smsbatch_core::{Effect, Msg, SendOutcome, SendRequest, StopReason};
use smsbatch_engine::{EngineEvent, EngineHandle, FailureKind, SendError, SmsSendRequest};

/// Executes core effects against the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Returns the stop reason if the effects end the run.
    pub fn apply(&self, effects: Vec<Effect>) -> Option<StopReason> {
        let mut stopped = None;
        for effect in effects {
            match effect {
                Effect::Send { ticket, request } => {
                    batch_info!(
                        "Send ticket={} item={} destinations={}",
                        ticket,
                        request.item_index,
                        request.destinations.len()
                    );
                    self.engine.send(ticket, to_wire(request));
                }
                Effect::AbortSend { ticket } => {
                    batch_info!("Abort ticket={}", ticket);
                    self.engine.abort(ticket);
                }
                Effect::RunStopped { reason } => {
                    batch_debug!("Run stopped: {:?}", reason);
                    stopped = Some(reason);
                }
            }
        }
        stopped
    }

    /// Waits up to `timeout` for the next engine event that maps to a message.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        match self.engine.recv_timeout(timeout)? {
            EngineEvent::SendCompleted { ticket, result } => Some(Msg::SendSettled {
                ticket,
                outcome: match result {
                    Ok(_) => SendOutcome::Accepted,
                    Err(err) => {
                        batch_warn!("Send ticket={} failed: {}", ticket, err);
                        SendOutcome::Rejected {
                            message: describe_failure(&err),
                        }
                    }
                },
            }),
            EngineEvent::TemplatesLoaded { user_id, .. } => {
                batch_debug!("Ignoring template list for user {} during a run", user_id);
                None
            }
        }
    }
}

/// Server refusals show the server's own message; transport failures name the failure.
pub(crate) fn describe_failure(err: &SendError) -> String {
    match err.kind {
        FailureKind::Rejected { .. } if !err.message.is_empty() => err.message.clone(),
        _ => err.to_string(),
    }
}

/// Duplicate field names keep the last value.
pub(crate) fn to_wire(request: SendRequest) -> SmsSendRequest {
    let data: BTreeMap<String, String> = request
        .field_values
        .into_iter()
        .map(|field| (field.name, field.value))
        .collect();
    SmsSendRequest {
        tpl_id: request.template_id.0,
        data,
        mobile: request.destinations,
        max_try: request.max_retries,
        send_time: request.send_time,
    }
}
