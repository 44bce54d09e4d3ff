use tracing::debug;

use crate::services::history::LoginRecord;
use crate::services::profile::Profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Command,
    Output,
    Info,
    Error,
    Component,
}

impl EntryKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Command => "command",
            EntryKind::Output => "output",
            EntryKind::Info => "info",
            EntryKind::Error => "error",
            EntryKind::Component => "component",
        }
    }
}

/// Renderable block carried by a component entry.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DataBlock {
    Profile(Profile),
    LoginTable(Vec<LoginRecord>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EntryPayload {
    Command(String),
    // Preformatted text. Nothing emits it yet but the renderer supports it.
    #[allow(dead_code)]
    Output(String),
    Info(String),
    Error(String),
    Component(DataBlock),
}

impl EntryPayload {
    pub(crate) fn kind(&self) -> EntryKind {
        match self {
            EntryPayload::Command(_) => EntryKind::Command,
            EntryPayload::Output(_) => EntryKind::Output,
            EntryPayload::Info(_) => EntryKind::Info,
            EntryPayload::Error(_) => EntryKind::Error,
            EntryPayload::Component(_) => EntryKind::Component,
        }
    }

    pub(crate) fn text(&self) -> Option<&str> {
        match self {
            EntryPayload::Command(text)
            | EntryPayload::Output(text)
            | EntryPayload::Info(text)
            | EntryPayload::Error(text) => Some(text),
            EntryPayload::Component(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TranscriptEntry {
    pub(crate) id: u64,
    pub(crate) payload: EntryPayload,
}

impl TranscriptEntry {
    pub(crate) fn kind(&self) -> EntryKind {
        self.payload.kind()
    }
}

/// Append-only session log. Ids follow insertion order and are never reused.
#[derive(Debug, Default)]
pub(crate) struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
}

impl Transcript {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, payload: EntryPayload) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, kind = payload.kind().as_str(), "transcript entry appended");
        self.entries.push(TranscriptEntry { id, payload });
        id
    }

    pub(crate) fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }
}
