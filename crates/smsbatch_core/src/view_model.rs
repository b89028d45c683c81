use crate::{ItemStatus, TemplateId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchViewModel {
    pub template_id: Option<TemplateId>,
    pub running: bool,
    /// Edits are disabled while locked.
    pub locked: bool,
    pub cursor: Option<usize>,
    pub item_count: usize,
    pub finished_count: usize,
    pub error_count: usize,
    /// Pending plus loading.
    pub pending_count: usize,
    pub rows: Vec<ItemRowView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub index: usize,
    pub destinations: Vec<String>,
    pub send_time: Option<String>,
    pub status: ItemStatus,
    pub last_error: Option<String>,
}
