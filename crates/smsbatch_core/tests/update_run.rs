use std::sync::Once;

use pretty_assertions::assert_eq;
use smsbatch_core::{
    update, BatchState, Effect, ItemStatus, Msg, SendItem, SendOutcome, SendSchedule, StopReason,
    TemplateId, Ticket,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(batch_logging::initialize_for_tests);
}

fn batch_with(items: Vec<SendItem>) -> BatchState {
    let (state, _) = update(BatchState::new(), Msg::TemplateSelected(TemplateId::new("7")));
    let (state, _) = update(state, Msg::BulkImported(items));
    state
}

fn two_items() -> Vec<SendItem> {
    vec![
        SendItem::new(vec!["13800138000".to_string()]),
        SendItem::new(vec!["13800138001".to_string()]),
    ]
}

fn single_send(effects: &[Effect]) -> Option<(Ticket, usize)> {
    let sends: Vec<_> = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Send { ticket, request } => Some((*ticket, request.item_index)),
            _ => None,
        })
        .collect();
    assert!(sends.len() <= 1, "more than one send in flight: {sends:?}");
    sends.first().copied()
}

/// Drives a run to completion, answering each send with `respond(index)`.
/// Returns the final state and the item indexes in dispatch order.
fn run_to_end(
    state: BatchState,
    respond: impl Fn(usize) -> SendOutcome,
) -> (BatchState, Vec<usize>, Vec<Effect>) {
    let (mut state, mut effects) = update(state, Msg::StartClicked);
    let mut order = Vec::new();
    while let Some((ticket, index)) = single_send(&effects) {
        order.push(index);
        assert_eq!(state.in_flight().map(|f| f.index), Some(index));
        let (next, next_effects) = update(
            state,
            Msg::SendSettled {
                ticket,
                outcome: respond(index),
            },
        );
        state = next;
        effects = next_effects;
    }
    (state, order, effects)
}

#[test]
fn both_items_succeed() {
    init_logging();
    let (state, order, last) = run_to_end(batch_with(two_items()), |_| SendOutcome::Accepted);

    assert_eq!(order, vec![0, 1]);
    assert!(state.items().iter().all(SendItem::is_finished));
    assert!(!state.is_running());
    assert!(!state.is_locked());
    assert_eq!(state.cursor(), None);
    assert_eq!(
        last,
        vec![Effect::RunStopped {
            reason: StopReason::Exhausted
        }]
    );
}

#[test]
fn failed_item_records_error_and_batch_continues() {
    init_logging();
    let (state, order, _) = run_to_end(batch_with(two_items()), |index| {
        if index == 0 {
            SendOutcome::Rejected {
                message: "invalid mobile".to_string(),
            }
        } else {
            SendOutcome::Accepted
        }
    });

    assert_eq!(order, vec![0, 1]);
    let items = state.items();
    assert!(!items[0].is_finished());
    assert_eq!(items[0].status, ItemStatus::Error);
    assert_eq!(items[0].last_error.as_deref(), Some("invalid mobile"));
    assert!(items[1].is_finished());
    assert!(!state.is_running());
}

#[test]
fn every_item_is_finished_or_has_error_after_run() {
    init_logging();
    let items = (0..6)
        .map(|n| SendItem::new(vec![format!("1380013800{n}")]))
        .collect();
    let (state, order, _) = run_to_end(batch_with(items), |index| {
        if index % 3 == 1 {
            SendOutcome::Rejected {
                message: format!("rejected {index}"),
            }
        } else {
            SendOutcome::Accepted
        }
    });

    assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    for item in state.items() {
        assert!(item.is_finished() || item.last_error.is_some());
    }
}

#[test]
fn rerun_only_resends_unfinished_items() {
    init_logging();
    let (state, _, _) = run_to_end(batch_with(two_items()), |index| {
        if index == 0 {
            SendOutcome::Rejected {
                message: "busy".to_string(),
            }
        } else {
            SendOutcome::Accepted
        }
    });

    let (state, order, _) = run_to_end(state, |_| SendOutcome::Accepted);
    assert_eq!(order, vec![0]);
    assert!(state.items()[0].is_finished());
    assert_eq!(state.items()[0].last_error, None);
}

#[test]
fn rerun_of_finished_batch_sends_nothing() {
    init_logging();
    let (state, _, _) = run_to_end(batch_with(two_items()), |_| SendOutcome::Accepted);

    let (state, effects) = update(state, Msg::StartClicked);
    assert_eq!(
        effects,
        vec![Effect::RunStopped {
            reason: StopReason::Exhausted
        }]
    );
    assert!(!state.is_running());
    assert_eq!(state.cursor(), None);
}

#[test]
fn send_request_carries_item_fields() {
    init_logging();
    let when = chrono::NaiveDate::from_ymd_opt(2023, 11, 11)
        .and_then(|d| d.and_hms_opt(11, 11, 11))
        .unwrap();
    let item = SendItem::new(vec!["13800138000".to_string(), "13800138001".to_string()])
        .with_field("var1", "111")
        .with_field("var2", "222")
        .with_schedule(SendSchedule::At(when))
        .with_max_retries(Some(2));
    let (state, effects) = update(batch_with(vec![item]), Msg::StartClicked);

    let request = match effects.as_slice() {
        [Effect::Send { request, .. }] => request.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(request.template_id, TemplateId::new("7"));
    assert_eq!(request.field_values.len(), 2);
    assert_eq!(request.field_values[1].name, "var2");
    assert_eq!(request.destinations.len(), 2);
    assert_eq!(request.max_retries, Some(2));
    assert_eq!(request.send_time.as_deref(), Some("2023-11-11 11:11:11"));
    assert_eq!(state.items()[0].status, ItemStatus::Loading);
    assert_eq!(state.cursor(), Some(0));
}

#[test]
fn immediate_send_has_no_send_time() {
    init_logging();
    let (_, effects) = update(batch_with(two_items()), Msg::StartClicked);
    match effects.as_slice() {
        [Effect::Send { request, .. }] => assert_eq!(request.send_time, None),
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn start_requires_items_and_template() {
    init_logging();
    let (state, effects) = update(BatchState::new(), Msg::StartClicked);
    assert!(effects.is_empty());
    assert!(!state.is_running());

    let (state, _) = update(state, Msg::ItemAdded(SendItem::new(vec!["13800138000".into()])));
    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
    assert!(!state.is_running());
}

#[test]
fn start_while_running_is_ignored() {
    init_logging();
    let (state, _) = update(batch_with(two_items()), Msg::StartClicked);
    let before = state.in_flight();

    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
    assert_eq!(state.in_flight(), before);
}

#[test]
fn view_counts_follow_progress() {
    init_logging();
    let (mut state, effects) = update(batch_with(two_items()), Msg::StartClicked);
    assert!(state.consume_dirty());
    let view = state.view();
    assert!(view.running);
    assert!(view.locked);
    assert_eq!(view.pending_count, 2);
    assert_eq!(view.rows[0].status, ItemStatus::Loading);

    let (ticket, _) = single_send(&effects).unwrap();
    let (mut state, _) = update(
        state,
        Msg::SendSettled {
            ticket,
            outcome: SendOutcome::Rejected {
                message: "quota".to_string(),
            },
        },
    );
    assert!(state.consume_dirty());
    let view = state.view();
    assert_eq!(view.error_count, 1);
    assert_eq!(view.pending_count, 1);
    assert_eq!(view.rows[0].last_error.as_deref(), Some("quota"));
    assert_eq!(view.cursor, Some(1));
}
