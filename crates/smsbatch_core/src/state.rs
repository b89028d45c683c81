use std::fmt;

use serde::{Deserialize, Serialize};

use crate::view_model::{BatchViewModel, ItemRowView};
use crate::{Effect, ItemStatus, SendItem, SendOutcome, SendRequest, StopReason};

/// Identifies one dispatch. Settlements carrying any other ticket are late and dropped.
pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub index: usize,
    pub ticket: Ticket,
    /// Status to restore if the dispatch is cancelled.
    previous: ItemStatus,
}

/// Persisted form of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub template_id: Option<TemplateId>,
    pub items: Vec<SendItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchState {
    items: Vec<SendItem>,
    template_id: Option<TemplateId>,
    running: bool,
    locked: bool,
    cursor: Option<usize>,
    in_flight: Option<InFlight>,
    next_ticket: Ticket,
    dirty: bool,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SendItem] {
        &self.items
    }

    pub fn template_id(&self) -> Option<&TemplateId> {
        self.template_id.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn view(&self) -> BatchViewModel {
        let rows = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| ItemRowView {
                index,
                destinations: item.destinations.clone(),
                send_time: item.send_time_literal(),
                status: item.status,
                last_error: item.last_error.clone(),
            })
            .collect::<Vec<_>>();
        let count = |status: ItemStatus| rows.iter().filter(|row| row.status == status).count();
        let finished_count = count(ItemStatus::Finished);
        let error_count = count(ItemStatus::Error);
        let pending_count = count(ItemStatus::Pending) + count(ItemStatus::Loading);

        BatchViewModel {
            template_id: self.template_id.clone(),
            running: self.running,
            locked: self.locked,
            cursor: self.cursor,
            item_count: rows.len(),
            finished_count,
            error_count,
            pending_count,
            rows,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            template_id: self.template_id.clone(),
            items: self.items.clone(),
        }
    }

    pub fn start(&mut self) -> Vec<Effect> {
        if self.running || self.items.is_empty() || self.template_id.is_none() {
            return Vec::new();
        }
        self.running = true;
        self.locked = true;
        self.cursor = None;
        self.dirty = true;
        self.advance()
    }

    pub fn cancel(&mut self) -> Vec<Effect> {
        let was_running = self.running;
        let mut effects = Vec::new();

        if let Some(flight) = self.in_flight.take() {
            if let Some(item) = self.items.get_mut(flight.index) {
                if item.status == ItemStatus::Loading {
                    item.status = flight.previous;
                }
            }
            effects.push(Effect::AbortSend {
                ticket: flight.ticket,
            });
        }

        if was_running || self.locked || self.cursor.is_some() {
            self.dirty = true;
        }
        self.running = false;
        self.locked = false;
        self.cursor = None;

        if was_running {
            effects.push(Effect::RunStopped {
                reason: StopReason::Cancelled,
            });
        }
        effects
    }

    pub fn on_item_result(&mut self, ticket: Ticket, outcome: SendOutcome) -> Vec<Effect> {
        let flight = match self.in_flight {
            Some(flight) if flight.ticket == ticket && self.running => flight,
            _ => return Vec::new(),
        };
        self.in_flight = None;

        if let Some(item) = self.items.get_mut(flight.index) {
            match outcome {
                SendOutcome::Accepted => {
                    item.status = ItemStatus::Finished;
                    item.last_error = None;
                }
                SendOutcome::Rejected { message } => {
                    item.status = ItemStatus::Error;
                    item.last_error = Some(message);
                }
            }
        }
        self.dirty = true;
        self.advance()
    }

    /// Dispatches the next non-finished item after the cursor, or ends the run.
    fn advance(&mut self) -> Vec<Effect> {
        if self.in_flight.is_some() {
            return Vec::new();
        }

        let from = self.cursor.map_or(0, |cursor| cursor + 1);
        let next = (from..self.items.len()).find(|&index| !self.items[index].is_finished());

        let Some(index) = next else {
            self.running = false;
            self.locked = false;
            self.cursor = None;
            self.dirty = true;
            return vec![Effect::RunStopped {
                reason: StopReason::Exhausted,
            }];
        };

        // Checked by `start`; a run never begins without a template.
        let Some(template_id) = self.template_id.clone() else {
            return Vec::new();
        };

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let item = &mut self.items[index];
        self.in_flight = Some(InFlight {
            index,
            ticket,
            previous: item.status,
        });
        item.status = ItemStatus::Loading;
        self.cursor = Some(index);
        self.dirty = true;

        let request = SendRequest {
            item_index: index,
            template_id,
            field_values: item.field_values.clone(),
            destinations: item.destinations.clone(),
            max_retries: item.max_retries,
            send_time: item.send_time_literal(),
        };
        vec![Effect::Send { ticket, request }]
    }

    pub(crate) fn select_template(&mut self, template_id: TemplateId) {
        if self.locked {
            return;
        }
        if self.template_id.as_ref() != Some(&template_id) {
            self.items.clear();
            self.template_id = Some(template_id);
            self.dirty = true;
        }
    }

    pub(crate) fn add_item(&mut self, item: SendItem) {
        if self.locked {
            return;
        }
        self.items.push(item.into_pending());
        self.dirty = true;
    }

    pub(crate) fn edit_item(&mut self, index: usize, edited: SendItem) {
        if self.locked {
            return;
        }
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        if item.is_finished() {
            return;
        }
        item.field_values = edited.field_values;
        item.destinations = edited.destinations;
        item.schedule = edited.schedule;
        item.max_retries = edited.max_retries.filter(|n| *n > 0);
        self.dirty = true;
    }

    pub(crate) fn remove_item(&mut self, index: usize) {
        if self.locked || index >= self.items.len() {
            return;
        }
        self.items.remove(index);
        self.dirty = true;
    }

    pub(crate) fn import_items(&mut self, items: Vec<SendItem>) {
        if self.locked {
            return;
        }
        self.items = items.into_iter().map(SendItem::into_pending).collect();
        self.dirty = true;
    }

    pub(crate) fn restore(&mut self, snapshot: BatchSnapshot) {
        if self.locked {
            return;
        }
        self.template_id = snapshot.template_id;
        self.items = snapshot
            .items
            .into_iter()
            .map(|mut item| {
                if item.status == ItemStatus::Loading {
                    item.status = if item.last_error.is_some() {
                        ItemStatus::Error
                    } else {
                        ItemStatus::Pending
                    };
                }
                item
            })
            .collect();
        self.cursor = None;
        self.dirty = true;
    }
}
