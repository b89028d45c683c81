#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a template; a different id clears the item list.
    TemplateSelected(crate::TemplateId),
    /// User added one item by hand.
    ItemAdded(crate::SendItem),
    /// User edited the fields of an item.
    ItemEdited { index: usize, item: crate::SendItem },
    /// User removed one item.
    ItemRemoved(usize),
    /// Bulk text was parsed; replaces the item list.
    BulkImported(Vec<crate::SendItem>),
    /// Restore a previously saved batch.
    RestoreBatch(crate::BatchSnapshot),
    /// User clicked Send.
    StartClicked,
    /// User clicked Cancel.
    CancelClicked,
    /// Engine settled the send identified by `ticket`.
    SendSettled {
        ticket: crate::Ticket,
        outcome: SendOutcome,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Accepted,
    Rejected { message: String },
}
