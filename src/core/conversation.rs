//! In-memory conversation log for a single chat session.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::core::message::{Role, Turn};

/// Number of recent turns sent to the model when nothing else is configured.
pub const DEFAULT_CONTEXT_TURNS: usize = 10;

/// Per-role turn totals shown alongside the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub user: usize,
    pub assistant: usize,
}

/// Shared handle to an append-only turn log.
///
/// Clones point at the same log. Every operation takes the lock once, so a
/// `purge` is never observed half-done by a concurrent `window` or `turns`.
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    turns: Arc<RwLock<Vec<Turn>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Turn>> {
        self.turns.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Turn>> {
        self.turns.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a turn stamped with the current time and return a copy of it.
    pub fn append(&self, role: Role, content: impl Into<String>) -> Turn {
        let turn = Turn::new(role, content);
        self.write().push(turn.clone());
        turn
    }

    /// Last `k` turns in arrival order (fewer when the log is shorter).
    pub fn window(&self, k: usize) -> Vec<Turn> {
        let turns = self.read();
        let start = turns.len().saturating_sub(k);
        turns[start..].to_vec()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.read().clone()
    }

    pub fn purge(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn counts(&self) -> RoleCounts {
        self.read()
            .iter()
            .fold(RoleCounts::default(), |mut counts, turn| {
                match turn.role {
                    Role::User => counts.user += 1,
                    Role::Assistant => counts.assistant += 1,
                    Role::System => {}
                }
                counts
            })
    }
}
