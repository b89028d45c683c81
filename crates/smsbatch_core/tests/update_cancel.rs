use std::sync::Once;

use smsbatch_core::{
    update, BatchState, Effect, ItemStatus, Msg, SendItem, SendOutcome, StopReason, TemplateId,
    Ticket,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(batch_logging::initialize_for_tests);
}

fn running_batch(len: usize) -> (BatchState, Ticket) {
    let items = (0..len)
        .map(|n| SendItem::new(vec![format!("1380013800{n}")]))
        .collect();
    let (state, _) = update(BatchState::new(), Msg::TemplateSelected(TemplateId::new("3")));
    let (state, _) = update(state, Msg::BulkImported(items));
    let (state, effects) = update(state, Msg::StartClicked);
    let ticket = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Send { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("send effect");
    (state, ticket)
}

fn settle(state: BatchState, ticket: Ticket, outcome: SendOutcome) -> (BatchState, Vec<Effect>) {
    update(state, Msg::SendSettled { ticket, outcome })
}

fn next_ticket(effects: &[Effect]) -> Ticket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Send { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("send effect")
}

#[test]
fn cancel_while_loading_stops_and_leaves_later_items_untouched() {
    init_logging();
    let (state, ticket) = running_batch(3);
    let (state, effects) = settle(state, ticket, SendOutcome::Accepted);
    let loading = next_ticket(&effects);
    assert_eq!(state.items()[1].status, ItemStatus::Loading);

    let (state, effects) = update(state, Msg::CancelClicked);

    assert_eq!(
        effects,
        vec![
            Effect::AbortSend { ticket: loading },
            Effect::RunStopped {
                reason: StopReason::Cancelled
            },
        ]
    );
    assert!(!state.is_running());
    assert!(!state.is_locked());
    assert_eq!(state.cursor(), None);
    assert_eq!(state.in_flight(), None);
    assert!(state.items()[0].is_finished());
    assert_eq!(state.items()[1].status, ItemStatus::Pending);
    assert_eq!(state.items()[2].status, ItemStatus::Pending);
    assert_eq!(state.items()[2].last_error, None);
}

#[test]
fn cancel_is_idempotent() {
    init_logging();
    let (state, _) = running_batch(2);
    let (mut state, _) = update(state, Msg::CancelClicked);
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    let (_, effects) = update(BatchState::new(), Msg::CancelClicked);
    assert!(effects.is_empty());
}

#[test]
fn late_response_after_cancel_is_discarded() {
    init_logging();
    let (state, ticket) = running_batch(2);
    let (state, _) = update(state, Msg::CancelClicked);

    let (state, effects) = settle(state, ticket, SendOutcome::Accepted);
    assert!(effects.is_empty());
    assert!(!state.items()[0].is_finished());
    assert!(!state.is_running());
}

#[test]
fn late_response_from_previous_run_does_not_touch_current_run() {
    init_logging();
    let (state, stale) = running_batch(2);
    let (state, _) = update(state, Msg::CancelClicked);
    let (state, effects) = update(state, Msg::StartClicked);
    let current = next_ticket(&effects);
    assert_ne!(stale, current);

    let (state, effects) = settle(
        state,
        stale,
        SendOutcome::Rejected {
            message: "stale".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.items()[0].status, ItemStatus::Loading);
    assert_eq!(state.items()[0].last_error, None);

    let (state, effects) = settle(state, current, SendOutcome::Accepted);
    assert!(state.items()[0].is_finished());
    assert!(matches!(
        effects.as_slice(),
        [Effect::Send { request, .. }] if request.item_index == 1
    ));
}

#[test]
fn cancel_restores_previous_error() {
    init_logging();
    let (state, ticket) = running_batch(1);
    let (state, _) = settle(
        state,
        ticket,
        SendOutcome::Rejected {
            message: "invalid mobile".to_string(),
        },
    );
    let (state, _) = update(state, Msg::StartClicked);
    assert_eq!(state.items()[0].status, ItemStatus::Loading);

    let (state, _) = update(state, Msg::CancelClicked);
    assert_eq!(state.items()[0].status, ItemStatus::Error);
    assert_eq!(state.items()[0].last_error.as_deref(), Some("invalid mobile"));
}

#[test]
fn restart_after_cancel_rescans_from_start() {
    init_logging();
    let (state, ticket) = running_batch(3);
    let (state, effects) = settle(
        state,
        ticket,
        SendOutcome::Rejected {
            message: "later".to_string(),
        },
    );
    let second = next_ticket(&effects);
    let (state, _) = settle(state, second, SendOutcome::Accepted);
    let (state, _) = update(state, Msg::CancelClicked);

    let (state, effects) = update(state, Msg::StartClicked);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Send { request, .. }] if request.item_index == 0
    ));
    let (_, effects) = settle(state, next_ticket(&effects), SendOutcome::Accepted);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Send { request, .. }] if request.item_index == 2
    ));
}
