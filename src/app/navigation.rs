use anyhow::Result;
use tracing::{debug, info};

use crate::store::KeyValueStore;

use super::progress::Progress;

/// Address-bar analogue: one `?id=<n>` entry per selection, with a cursor
/// for back/forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LocationHistory {
    entries: Vec<u32>,
    cursor: usize,
}

impl LocationHistory {
    pub(crate) fn current(&self) -> Option<u32> {
        self.entries.get(self.cursor).copied()
    }

    /// Drops the push when it would duplicate the current entry.
    pub(crate) fn push(&mut self, id: u32) -> bool {
        if self.current() == Some(id) {
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(id);
        self.cursor = self.entries.len() - 1;
        true
    }

    pub(crate) fn back(&mut self) -> Option<u32> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub(crate) fn forward(&mut self) -> Option<u32> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub(crate) fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub(crate) fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub(crate) fn query_string(&self) -> String {
        match self.current() {
            Some(id) => format!("?id={id}"),
            None => String::new(),
        }
    }
}

/// Extracts `id` from `?id=5`, `id=5&x=1` or a full URL carrying that query.
pub(crate) fn parse_location_id(raw: &str) -> Option<u32> {
    let query = match raw.split_once('?') {
        Some((_, query)) => query,
        None => raw,
    };
    let query = query.split('#').next().unwrap_or_default();
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() == "id" {
            value.trim().parse::<u32>().ok()
        } else {
            None
        }
    })
}

/// Requested id if it exists in the collection, otherwise the first episode.
pub(crate) fn resolve_selection(all_ids: &[u32], requested: Option<u32>) -> Option<u32> {
    match requested {
        Some(id) if all_ids.contains(&id) => Some(id),
        _ => all_ids.first().copied(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdvanceOutcome {
    pub(crate) completed: Option<u32>,
    pub(crate) moved_to: Option<u32>,
}

#[derive(Debug, Clone)]
pub(crate) struct Navigator {
    all_ids: Vec<u32>,
    order: Vec<u32>,
    selected: Option<u32>,
    progress: Progress,
    history: LocationHistory,
}

impl Navigator {
    pub(crate) fn new(all_ids: Vec<u32>, requested: Option<u32>, progress: Progress) -> Self {
        let selected = resolve_selection(&all_ids, requested);
        let mut history = LocationHistory::default();
        if let Some(id) = selected {
            history.push(id);
        }
        Self {
            order: all_ids.clone(),
            all_ids,
            selected,
            progress,
            history,
        }
    }

    pub(crate) fn selected(&self) -> Option<u32> {
        self.selected
    }

    pub(crate) fn progress(&self) -> &Progress {
        &self.progress
    }

    pub(crate) fn history(&self) -> &LocationHistory {
        &self.history
    }

    /// Replaces the navigation order with the searched episode ids.
    pub(crate) fn set_order(&mut self, order: Vec<u32>) {
        self.order = order;
    }

    fn position(&self) -> Option<usize> {
        let selected = self.selected?;
        self.order.iter().position(|id| *id == selected)
    }

    pub(crate) fn has_next(&self) -> bool {
        match self.position() {
            Some(idx) => idx + 1 < self.order.len(),
            None => !self.order.is_empty(),
        }
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.position().is_some_and(|idx| idx > 0)
    }

    pub(crate) fn select_episode(&mut self, id: u32) -> Option<u32> {
        self.selected = resolve_selection(&self.all_ids, Some(id));
        if let Some(id) = self.selected {
            if self.history.push(id) {
                debug!(location = %self.history.query_string(), "location pushed");
            }
        }
        self.selected
    }

    pub(crate) fn next(&mut self) -> Option<u32> {
        if !self.has_next() {
            return None;
        }
        let target = match self.position() {
            Some(idx) => self.order[idx + 1],
            None => self.order[0],
        };
        self.select_episode(target)
    }

    pub(crate) fn previous(&mut self) -> Option<u32> {
        if !self.has_previous() {
            return None;
        }
        let idx = self.position()?;
        self.select_episode(self.order[idx - 1])
    }

    pub(crate) fn toggle_favorite(&mut self, store: &dyn KeyValueStore, id: u32) -> Result<bool> {
        self.progress.toggle_favorite(store, id)
    }

    pub(crate) fn mark_completed(&mut self, store: &dyn KeyValueStore, id: u32) -> Result<bool> {
        self.progress.mark_completed(store, id)
    }

    /// Playback finished with auto-next on: complete the current episode and
    /// move on when there is somewhere to go.
    pub(crate) fn on_advance_request(&mut self, store: &dyn KeyValueStore) -> Result<AdvanceOutcome> {
        let completed = match self.selected {
            Some(id) => {
                self.mark_completed(store, id)?;
                Some(id)
            }
            None => None,
        };
        let moved_to = if self.has_next() { self.next() } else { None };
        info!(?completed, ?moved_to, "auto-next advance");
        Ok(AdvanceOutcome {
            completed,
            moved_to,
        })
    }

    /// Back/forward: restores the id without pushing a new location entry.
    pub(crate) fn history_back(&mut self) -> Option<u32> {
        let id = self.history.back()?;
        self.apply_location(id)
    }

    pub(crate) fn history_forward(&mut self) -> Option<u32> {
        let id = self.history.forward()?;
        self.apply_location(id)
    }

    fn apply_location(&mut self, id: u32) -> Option<u32> {
        if !self.all_ids.contains(&id) {
            return None;
        }
        self.selected = Some(id);
        self.selected
    }
}
