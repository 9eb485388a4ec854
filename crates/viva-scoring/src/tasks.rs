//! Task-definition store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only table of task definitions keyed by session and task ID.
///
/// Loaded from configuration once before a batch starts, then shared across
/// agents behind an `Arc`. Task IDs carry their `t` prefix (`"t1"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDefinitionStore {
    sessions: BTreeMap<String, BTreeMap<String, String>>,
}

impl TaskDefinitionStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self { sessions: BTreeMap::new() }
    }

    /// Adds or replaces one task definition.
    pub fn insert(
        &mut self,
        session_id: impl Into<String>,
        task_id: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.sessions.entry(session_id.into()).or_default().insert(task_id.into(), text.into());
    }

    /// Looks up the definition text for a session/task pair.
    #[must_use]
    pub fn get(&self, session_id: &str, task_id: &str) -> Option<&str> {
        self.sessions.get(session_id)?.get(task_id).map(String::as_str)
    }

    /// Iterates sessions in ID order, each with its task table.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, String>)> {
        self.sessions.iter()
    }

    /// True when no definitions are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
