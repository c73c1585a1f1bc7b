//! Host history
//!
//! Stack of persisted [`RouteInformation`] entries, the way a browser keeps
//! back/forward history:
//! - pushing truncates forward entries
//! - replacing overwrites the current entry
//! - the oldest entries are dropped beyond the size limit
//!
//! Entries hold the location and encoded state produced by
//! [`RouteInformationParser::restore_route_information`], so going back
//! re-parses an entry and reproduces the imperative frames it had.
//!
//! [`RouteInformationParser::restore_route_information`]: crate::RouteInformationParser::restore_route_information

use crate::parser::RouteInformation;

pub const DEFAULT_MAX_SIZE: usize = 1000;

/// How the current entry changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Push,
    Replace,
    Back,
    Forward,
}

/// Report of one history operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    pub from: String,
    pub to: String,
    pub direction: HistoryDirection,
}

/// Back/forward stack of route information
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<RouteInformation>,
    current: usize,
    /// Maximum number of entries (0 = unlimited)
    max_size: usize,
}

impl History {
    pub fn new(initial: RouteInformation) -> Self {
        Self::with_max_size(initial, DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(initial: RouteInformation, max_size: usize) -> Self {
        Self {
            entries: vec![initial],
            current: 0,
            max_size,
        }
    }

    /// Current entry
    pub fn current(&self) -> &RouteInformation {
        &self.entries[self.current]
    }

    pub fn current_location(&self) -> &str {
        &self.current().location
    }

    /// Add an entry after the current one, dropping forward entries
    pub fn push(&mut self, entry: RouteInformation) -> HistoryEvent {
        let from = self.current_location().to_string();
        let to = entry.location.clone();

        self.entries.truncate(self.current + 1);
        self.entries.push(entry);
        self.current += 1;
        self.enforce_size_limit();

        HistoryEvent {
            from,
            to,
            direction: HistoryDirection::Push,
        }
    }

    /// Overwrite the current entry
    pub fn replace(&mut self, entry: RouteInformation) -> HistoryEvent {
        let from = self.current_location().to_string();
        let to = entry.location.clone();
        self.entries[self.current] = entry;

        HistoryEvent {
            from,
            to,
            direction: HistoryDirection::Replace,
        }
    }

    pub fn back(&mut self) -> Option<HistoryEvent> {
        if !self.can_go_back() {
            return None;
        }
        let from = self.current_location().to_string();
        self.current -= 1;
        Some(HistoryEvent {
            from,
            to: self.current_location().to_string(),
            direction: HistoryDirection::Back,
        })
    }

    pub fn forward(&mut self) -> Option<HistoryEvent> {
        if !self.can_go_forward() {
            return None;
        }
        let from = self.current_location().to_string();
        self.current += 1;
        Some(HistoryEvent {
            from,
            to: self.current_location().to_string(),
            direction: HistoryDirection::Forward,
        })
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Drop every entry and start over from `initial`
    pub fn clear(&mut self, initial: RouteInformation) {
        self.entries.clear();
        self.entries.push(initial);
        self.current = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history has at least one entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RouteInformation] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Replace the stack with entries saved by the host
    ///
    /// Ignored unless `current` points into a non-empty `entries`.
    pub fn restore(&mut self, entries: Vec<RouteInformation>, current: usize) {
        if current < entries.len() {
            self.entries = entries;
            self.current = current;
        }
    }

    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(RouteInformation::new("/"))
    }
}
