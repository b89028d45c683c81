use std::fs;
use std::path::Path;

use batch_logging::{batch_error, batch_info, batch_warn};
use serde::{Deserialize, Serialize};
use smsbatch_core::BatchSnapshot;
use smsbatch_engine::write_atomic;

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedState {
    version: u32,
    batch: BatchSnapshot,
}

/// Missing, unreadable or foreign state files all load as `None`.
pub(crate) fn load_snapshot(path: &Path) -> Option<BatchSnapshot> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return None;
        }
        Err(err) => {
            batch_warn!("Failed to read batch state from {:?}: {}", path, err);
            return None;
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            batch_warn!("Failed to parse batch state from {:?}: {}", path, err);
            return None;
        }
    };
    if state.version != STATE_VERSION {
        batch_warn!(
            "Ignoring batch state {:?} with version {}",
            path,
            state.version
        );
        return None;
    }

    batch_info!(
        "Loaded batch state from {:?} ({} items)",
        path,
        state.batch.items.len()
    );
    Some(state.batch)
}

pub(crate) fn save_snapshot(path: &Path, snapshot: &BatchSnapshot) {
    let state = PersistedState {
        version: STATE_VERSION,
        batch: snapshot.clone(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            batch_error!("Failed to serialize batch state: {}", err);
            return;
        }
    };

    if let Err(err) = write_atomic(path, &content) {
        batch_error!("Failed to write batch state to {:?}: {}", path, err);
    }
}
