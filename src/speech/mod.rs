//! Agent-to-agent speech broadcast.
//!
//! [`SpeechBus`] is an explicit shared object handed to every agent at
//! construction time — not a hidden process-wide singleton. `publish` appends
//! to every named inbox except the speaker's own; expired entries are pruned
//! lazily when an inbox is read, never eagerly by the bus.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// One spoken utterance. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Speech {
    pub speaker: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Speech {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            created: Utc::now(),
        }
    }
}

type InboxEntries = Arc<Mutex<Vec<Speech>>>;

/// Fan-out channel for spoken utterances
#[derive(Clone, Default)]
pub struct SpeechBus {
    inboxes: Arc<DashMap<String, InboxEntries>>,
}

impl SpeechBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-attach to) the inbox for `name`
    pub fn subscribe(&self, name: impl Into<String>) -> SpeechInbox {
        let name = name.into();
        let entries = self
            .inboxes
            .entry(name.clone())
            .or_default()
            .clone();
        SpeechInbox { name, entries }
    }

    /// Deliver an utterance to every subscriber except the speaker
    pub fn publish(&self, speaker: &str, text: &str) {
        let speech = Speech::new(speaker, text);
        for entry in self.inboxes.iter() {
            if entry.key() == speaker {
                continue;
            }
            entry.value().lock().unwrap().push(speech.clone());
        }
        debug!(speaker = %speaker, "Speech published");
    }

    pub fn subscriber_count(&self) -> usize {
        self.inboxes.len()
    }
}

/// Time-bounded per-subscriber inbox
#[derive(Clone)]
pub struct SpeechInbox {
    name: String,
    entries: InboxEntries,
}

impl SpeechInbox {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Format the not-yet-expired entries as `- <speaker>: <text>` lines in
    /// insertion order, purging expired entries as a side effect.
    pub fn digest(&self, window: Duration, now: DateTime<Utc>) -> String {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|speech| now.signed_duration_since(speech.created) < window);

        let mut out = String::new();
        for speech in entries.iter() {
            out.push_str(&format!("- {}: {}\n", speech.speaker, speech.text));
        }
        out
    }
}
