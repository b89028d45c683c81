use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use batch_logging::{batch_debug, batch_info};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiSettings, ReqwestSmsApi, SmsApi};
use crate::{EngineEvent, SendError, SmsSendRequest, Ticket};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to set up api client: {0}")]
    Client(#[from] SendError),
}

enum EngineCommand {
    Send {
        ticket: Ticket,
        request: SmsSendRequest,
    },
    Abort {
        ticket: Ticket,
    },
    ListTemplates {
        user_id: u64,
    },
}

type InFlightTokens = Arc<Mutex<HashMap<Ticket, CancellationToken>>>;

/// Runs API calls on a background tokio runtime.
///
/// Dropping the handle stops the runtime and abandons any outstanding call.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, EngineError> {
        let api = ReqwestSmsApi::new(settings)?;
        Self::with_api(Arc::new(api))
    }

    pub fn with_api(api: Arc<dyn SmsApi>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("smsbatch-io")
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("smsbatch-engine".to_string())
            .spawn(move || {
                let in_flight: InFlightTokens = Arc::default();
                while let Ok(command) = cmd_rx.recv() {
                    handle_command(&runtime, &api, &in_flight, command, &event_tx);
                }
                batch_debug!("engine command channel closed");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, ticket: Ticket, request: SmsSendRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Send { ticket, request });
    }

    /// Raises the abort signal for `ticket`; its response, if any, is dropped.
    pub fn abort(&self, ticket: Ticket) {
        let _ = self.cmd_tx.send(EngineCommand::Abort { ticket });
    }

    pub fn list_templates(&self, user_id: u64) {
        let _ = self.cmd_tx.send(EngineCommand::ListTemplates { user_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    api: &Arc<dyn SmsApi>,
    in_flight: &InFlightTokens,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Send { ticket, request } => {
            let token = CancellationToken::new();
            if let Ok(mut tokens) = in_flight.lock() {
                tokens.insert(ticket, token.clone());
            }
            let api = api.clone();
            let in_flight = in_flight.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    result = api.send(&request) => Some(result),
                };
                if let Ok(mut tokens) = in_flight.lock() {
                    tokens.remove(&ticket);
                }
                match result {
                    Some(result) => {
                        let _ = event_tx.send(EngineEvent::SendCompleted { ticket, result });
                    }
                    None => batch_info!("send {} aborted; response dropped", ticket),
                }
            });
        }
        EngineCommand::Abort { ticket } => {
            let token = in_flight
                .lock()
                .ok()
                .and_then(|mut tokens| tokens.remove(&ticket));
            match token {
                Some(token) => token.cancel(),
                None => batch_debug!("abort for settled send {}", ticket),
            }
        }
        EngineCommand::ListTemplates { user_id } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.list_templates(user_id).await;
                let _ = event_tx.send(EngineEvent::TemplatesLoaded { user_id, result });
            });
        }
    }
}
