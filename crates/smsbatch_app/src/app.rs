use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use batch_logging::{batch_debug, batch_info, batch_warn};
use smsbatch_core::{
    parse_bulk, update, validate_mobile, BatchSnapshot, BatchState, Msg, SendItem, StopReason,
    TemplateId, Ticket,
};
use smsbatch_engine::{EngineEvent, EngineHandle, TemplateSummary};

use crate::cli::SendArgs;
use crate::config::AppConfig;
use crate::effects::{describe_failure, EffectRunner};
use crate::persistence::{load_snapshot, save_snapshot};
use crate::report;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,
    pub finished: usize,
    pub failed: usize,
    pub left: usize,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.reason == StopReason::Exhausted && self.failed == 0 && self.left == 0
    }
}

pub fn load_items(input: &Path) -> anyhow::Result<Vec<SendItem>> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read input {}", input.display()))?;
    let items = parse_bulk(&text, validate_mobile)
        .with_context(|| format!("invalid input {}", input.display()))?;
    if items.is_empty() {
        bail!("input {} contains no records", input.display());
    }
    Ok(items)
}

pub fn run_send(
    config: &AppConfig,
    args: &SendArgs,
    interrupt: &mpsc::Receiver<()>,
) -> anyhow::Result<RunSummary> {
    let template = TemplateId::new(args.template.trim());
    if template.as_str().is_empty() {
        bail!("template id is empty");
    }
    let items = load_items(&args.input)?;
    let state_file: Option<PathBuf> = args.state_file.clone().or_else(|| config.state_file.clone());

    let previous = match (&state_file, args.resume) {
        (Some(path), true) => load_snapshot(path),
        _ => None,
    };
    let state = prepare_batch(template, items, previous);

    let engine = EngineHandle::new(config.api.to_settings())?;
    let runner = EffectRunner::new(engine);
    let (state, reason) = drive(state, &runner, interrupt, state_file.as_deref())?;

    print!("{}", report::render_batch(&state.view()));
    let view = state.view();
    Ok(RunSummary {
        reason,
        finished: view.finished_count,
        failed: view.error_count,
        left: view.pending_count,
    })
}

/// Imports `items` for `template`, then applies `previous` progress when it
/// describes the same records.
pub(crate) fn prepare_batch(
    template: TemplateId,
    items: Vec<SendItem>,
    previous: Option<BatchSnapshot>,
) -> BatchState {
    let (state, _) = update(BatchState::new(), Msg::TemplateSelected(template.clone()));
    let (state, _) = update(state, Msg::BulkImported(items.clone()));

    match previous {
        Some(snapshot) if describes_same_batch(&snapshot, &template, &items) => {
            let done = snapshot.items.iter().filter(|item| item.is_finished()).count();
            batch_info!("Resuming: {} of {} items already sent", done, items.len());
            update(state, Msg::RestoreBatch(snapshot)).0
        }
        Some(_) => {
            batch_warn!("Saved progress belongs to a different batch; starting over");
            state
        }
        None => state,
    }
}

fn describes_same_batch(snapshot: &BatchSnapshot, template: &TemplateId, items: &[SendItem]) -> bool {
    snapshot.template_id.as_ref() == Some(template)
        && snapshot.items.len() == items.len()
        && snapshot.items.iter().zip(items).all(|(saved, parsed)| {
            saved.field_values == parsed.field_values
                && saved.destinations == parsed.destinations
                && saved.schedule == parsed.schedule
                && saved.max_retries == parsed.max_retries
        })
}

/// Single-writer loop: every state change goes through `update` on this thread.
fn drive(
    state: BatchState,
    runner: &EffectRunner,
    interrupt: &mpsc::Receiver<()>,
    state_file: Option<&Path>,
) -> anyhow::Result<(BatchState, StopReason)> {
    let (mut state, effects) = update(state, Msg::StartClicked);
    let mut stopped = runner.apply(effects);
    if stopped.is_none() && !state.is_running() {
        bail!("batch could not be started");
    }

    while stopped.is_none() {
        let msg = if interrupt.try_recv().is_ok() {
            batch_info!("Interrupted; cancelling the run");
            Msg::CancelClicked
        } else {
            runner.next_msg(POLL_INTERVAL).unwrap_or(Msg::Tick)
        };
        let settled = matches!(msg, Msg::SendSettled { .. });
        if let Some(ticket) = late_settlement(&state, &msg) {
            batch_info!("Discarding late response for ticket {}", ticket);
        }

        let (next, effects) = update(state, msg);
        state = next;
        if state.consume_dirty() {
            batch_info!("{}", report::progress_line(&state.view()));
        }
        if settled {
            if let Some(path) = state_file {
                save_snapshot(path, &state.snapshot());
            }
        }
        stopped = runner.apply(effects);
    }

    if let Some(path) = state_file {
        save_snapshot(path, &state.snapshot());
    }
    let reason = stopped.unwrap_or(StopReason::Cancelled);
    batch_info!("Run ended: {:?}", reason);
    Ok((state, reason))
}

/// Ticket of a settlement the state will discard because it is not the in-flight send.
fn late_settlement(state: &BatchState, msg: &Msg) -> Option<Ticket> {
    match msg {
        Msg::SendSettled { ticket, .. }
            if !state.is_running()
                || state.in_flight().map(|flight| flight.ticket) != Some(*ticket) =>
        {
            Some(*ticket)
        }
        _ => None,
    }
}

pub fn list_templates(config: &AppConfig, user_id: u64) -> anyhow::Result<Vec<TemplateSummary>> {
    let engine = EngineHandle::new(config.api.to_settings())?;
    engine.list_templates(user_id);

    let wait = Duration::from_secs(
        config.api.connect_timeout_secs + config.api.request_timeout_secs + 1,
    );
    match engine.recv_timeout(wait) {
        Some(EngineEvent::TemplatesLoaded { result, .. }) => result
            .map_err(|err| anyhow!("cannot load templates: {}", describe_failure(&err))),
        Some(other) => bail!("unexpected engine event {other:?}"),
        None => bail!("template list did not answer within {wait:?}"),
    }
}

/// Forwards Ctrl-C presses; the receiver sees one `()` per press.
pub fn spawn_interrupt_listener() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("smsbatch-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    batch_warn!("Ctrl-C handling unavailable: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if tx.send(()).is_err() {
                        break;
                    }
                }
            });
            batch_debug!("signal listener stopped");
        });
    if let Err(err) = spawned {
        batch_warn!("Ctrl-C handling unavailable: {}", err);
    }
    rx
}
