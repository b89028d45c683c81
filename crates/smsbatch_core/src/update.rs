use crate::{BatchState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: BatchState, msg: Msg) -> (BatchState, Vec<Effect>) {
    let effects = match msg {
        Msg::TemplateSelected(template_id) => {
            state.select_template(template_id);
            Vec::new()
        }
        Msg::ItemAdded(item) => {
            state.add_item(item);
            Vec::new()
        }
        Msg::ItemEdited { index, item } => {
            state.edit_item(index, item);
            Vec::new()
        }
        Msg::ItemRemoved(index) => {
            state.remove_item(index);
            Vec::new()
        }
        Msg::BulkImported(items) => {
            state.import_items(items);
            Vec::new()
        }
        Msg::RestoreBatch(snapshot) => {
            state.restore(snapshot);
            Vec::new()
        }
        Msg::StartClicked => state.start(),
        Msg::CancelClicked => state.cancel(),
        Msg::SendSettled { ticket, outcome } => state.on_item_result(ticket, outcome),
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
