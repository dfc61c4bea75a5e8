//! Bounded undo/redo history.
//!
//! The history is generic over its payload; the designer keeps one for the
//! process definition and one for the form schema. Entries are deduplicated
//! through an injected signature function, and a short replay lock after
//! each undo/redo keeps the replayed state's own change notification from
//! being recorded as a fresh edit.

/// Maximum number of past (and future) states retained.
pub const HISTORY_CAP: usize = 40;
/// How long after an undo/redo incoming changes are treated as replay echo.
pub const REPLAY_LOCK_MS: u64 = 500;

pub struct History<T> {
    past: Vec<T>,
    future: Vec<T>,
    signature: Box<dyn Fn(&T) -> String>,
    replay_lock_until: u64,
}

impl<T: Clone> History<T> {
    pub fn new(signature: Box<dyn Fn(&T) -> String>) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            signature,
            replay_lock_until: 0,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Records the transition from `current` to `next`.
    ///
    /// Returns `false` without recording when the two states share a
    /// signature or when the replay lock is still active. Recording clears
    /// the redo stack and evicts the oldest entry past the cap.
    pub fn record(&mut self, current: &T, next: &T, now_ms: u64) -> bool {
        if now_ms < self.replay_lock_until {
            return false;
        }
        if (self.signature)(current) == (self.signature)(next) {
            return false;
        }
        self.past.push(current.clone());
        if self.past.len() > HISTORY_CAP {
            self.past.remove(0);
        }
        self.future.clear();
        true
    }

    /// Steps back, returning the state to restore.
    pub fn undo(&mut self, current: &T, now_ms: u64) -> Option<T> {
        let previous = self.past.pop()?;
        self.future.push(current.clone());
        if self.future.len() > HISTORY_CAP {
            self.future.remove(0);
        }
        self.replay_lock_until = now_ms + REPLAY_LOCK_MS;
        Some(previous)
    }

    /// Steps forward, returning the state to restore.
    pub fn redo(&mut self, current: &T, now_ms: u64) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push(current.clone());
        if self.past.len() > HISTORY_CAP {
            self.past.remove(0);
        }
        self.replay_lock_until = now_ms + REPLAY_LOCK_MS;
        Some(next)
    }
}

impl<T> std::fmt::Debug for History<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("past", &self.past.len())
            .field("future", &self.future.len())
            .field("replay_lock_until", &self.replay_lock_until)
            .finish()
    }
}

/// One field of the form schema, as tracked by the schema history.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FormField {
    pub key: String,
    #[serde(default)]
    pub label: String,
}
