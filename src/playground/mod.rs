//! Playground transcript model and the streaming query session.
//!
//! A [`Transcript`] is the append-only record of one playground
//! conversation: user messages, terminal system answers, and the
//! in-progress processing entries that accumulate routing steps while a
//! query is in flight. [`session::QuerySession`] owns a transcript and
//! applies stream frames to it.

pub mod params;
pub mod session;

use std::fmt;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Entry identity and roles
// ---------------------------------------------------------------------------

/// Unique, monotonically assigned identifier for a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role tag for a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A message the user submitted.
    User,
    /// A terminal backend answer (or the greeting).
    System,
    /// The single in-progress entry for an outstanding query.
    Processing,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
            Self::Processing => write!(f, "processing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress steps
// ---------------------------------------------------------------------------

/// One labeled unit of backend-reported intermediate work.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub label: String,
    /// Opaque backend payload (metrics, candidate lists, …). Rendered
    /// verbatim, never interpreted.
    pub payload: Option<Value>,
}

impl StepRecord {
    pub fn new(label: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One transcript item.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: EntryId,
    pub role: Role,
    pub text: String,
    /// Which backend model produced this answer (system entries only).
    pub model: Option<String>,
    /// Routing steps in arrival order (processing entries only).
    pub steps: Vec<StepRecord>,
    /// Display flag: whether the step list is unfolded.
    pub expanded: bool,
    /// Set once the paired query reached its final answer.
    pub done: bool,
}

impl Entry {
    fn new(id: EntryId, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            model: None,
            steps: Vec::new(),
            expanded: false,
            done: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Append-only conversation transcript.
///
/// Entries are never removed or reordered; insertion order is display
/// order. The only wholesale mutation is [`Transcript::reset`].
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    fn alloc_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a user message.
    pub fn push_user(&mut self, text: impl Into<String>) -> EntryId {
        let id = self.alloc_id();
        self.entries.push(Entry::new(id, Role::User, text));
        id
    }

    /// Append a terminal system message with an optional model label.
    pub fn push_system(&mut self, text: impl Into<String>, model: Option<String>) -> EntryId {
        let id = self.alloc_id();
        let mut entry = Entry::new(id, Role::System, text);
        entry.model = model;
        self.entries.push(entry);
        id
    }

    /// Append an empty in-progress processing entry, unfolded by default so
    /// steps are visible as they stream in.
    pub fn push_processing(&mut self) -> EntryId {
        let id = self.alloc_id();
        let mut entry = Entry::new(id, Role::Processing, "");
        entry.expanded = true;
        self.entries.push(entry);
        id
    }

    /// Append a progress step to an entry. No-op for unknown ids.
    pub fn append_step(&mut self, id: EntryId, step: StepRecord) {
        if let Some(entry) = self.get_mut(id) {
            entry.steps.push(step);
        }
    }

    /// Mark an entry done. No-op for unknown ids.
    pub fn mark_done(&mut self, id: EntryId) {
        if let Some(entry) = self.get_mut(id) {
            entry.done = true;
        }
    }

    /// Flip an entry's expanded display flag. The step list is untouched.
    pub fn toggle_expanded(&mut self, id: EntryId) {
        if let Some(entry) = self.get_mut(id) {
            entry.expanded = !entry.expanded;
        }
    }

    /// Drop all entries. Identifiers keep advancing — an id is never reused
    /// within one transcript's lifetime.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let mut t = Transcript::new();
        let a = t.push_user("hi");
        let b = t.push_processing();
        let c = t.push_system("answer", None);
        assert!(a < b && b < c);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn insertion_order_is_display_order() {
        let mut t = Transcript::new();
        t.push_user("one");
        t.push_processing();
        t.push_system("two", Some("model-x".to_string()));
        let roles: Vec<Role> = t.entries().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Processing, Role::System]);
    }

    #[test]
    fn steps_append_in_arrival_order() {
        let mut t = Transcript::new();
        let id = t.push_processing();
        t.append_step(id, StepRecord::new("A", None));
        t.append_step(id, StepRecord::new("B", Some(serde_json::json!({"n": 1}))));
        let entry = t.get(id).unwrap();
        assert_eq!(entry.steps.len(), 2);
        assert_eq!(entry.steps[0].label, "A");
        assert_eq!(entry.steps[1].label, "B");
    }

    #[test]
    fn toggle_expanded_roundtrips_without_touching_steps() {
        let mut t = Transcript::new();
        let id = t.push_processing();
        t.append_step(id, StepRecord::new("A", None));
        let initial = t.get(id).unwrap().expanded;

        t.toggle_expanded(id);
        assert_eq!(t.get(id).unwrap().expanded, !initial);
        t.toggle_expanded(id);
        let entry = t.get(id).unwrap();
        assert_eq!(entry.expanded, initial);
        assert_eq!(entry.steps.len(), 1);
    }

    #[test]
    fn mutating_unknown_id_is_a_no_op() {
        let mut t = Transcript::new();
        let id = t.push_user("hi");
        t.reset();
        t.append_step(id, StepRecord::new("ghost", None));
        t.mark_done(id);
        assert!(t.is_empty());
    }

    #[test]
    fn reset_never_reuses_ids() {
        let mut t = Transcript::new();
        let before = t.push_user("first");
        t.reset();
        let after = t.push_user("second");
        assert!(after > before);
    }
}
