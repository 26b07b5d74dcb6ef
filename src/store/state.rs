use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{
    core::{
        aggregate::find_duplicate,
        normalize::{display_name, normalize},
    },
    store::{
        entities::{JournalEntry, Session},
        kv::KvStore,
    },
};

pub const SESSIONS_SLOT: &str = "sessions";
pub const LAST_DATE_SLOT: &str = "lastDate";
pub const JOURNAL_SLOT: &str = "journal";
pub const ACTIVITY_USAGE_SLOT: &str = "activityUsage";
pub const ACTIVITY_NAMES_SLOT: &str = "activityNames";

/// Upper bound on a single logged duration. A day has 1440 minutes.
pub const MAX_MINUTES: u32 = 1440;

/// Rejections surfaced to the user before any state is touched. The input in
/// question is left for the user to correct; nothing is mutated or persisted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("activity name cannot be empty")]
    EmptyActivity,
    #[error("duration must be between 1 and {MAX_MINUTES} minutes, got {0}")]
    MinutesOutOfRange(u32),
    #[error("cannot log an activity on a future date ({0})")]
    FutureDate(NaiveDate),
    #[error("\"{existing}\" is already logged for {date}; one session per activity per day")]
    DuplicateForDate { existing: String, date: NaiveDate },
}

/// In-memory application state plus the key-value store it mirrors into.
///
/// Every persisted slot has exactly one synchronization function, called after
/// each operation that mutates the corresponding collection. Writes are
/// best-effort: a failed sync leaves the in-memory state authoritative for the
/// rest of the process and is only logged.
pub struct AppState<S> {
    store: S,
    sessions: Vec<Session>,
    journal: Vec<JournalEntry>,
    usage: HashMap<String, i64>,
    names: HashMap<String, String>,
    last_date: Option<NaiveDate>,
}

impl<S: KvStore + Sync> AppState<S> {
    /// Reads every slot. Missing or corrupt slots fall back to the empty
    /// collection; load never fails.
    pub async fn load(store: S) -> Self {
        let sessions = read_slot(&store, SESSIONS_SLOT).await;
        let journal = read_slot(&store, JOURNAL_SLOT).await;
        let usage = read_slot(&store, ACTIVITY_USAGE_SLOT).await;
        let names = read_slot(&store, ACTIVITY_NAMES_SLOT).await;
        let last_date = match store.get(LAST_DATE_SLOT).await {
            Ok(raw) => raw.and_then(|s| s.trim().parse().ok()),
            Err(e) => {
                warn!("Failed to read slot {LAST_DATE_SLOT}: {e}");
                None
            }
        };

        Self {
            store,
            sessions,
            journal,
            usage,
            names,
            last_date,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn usage(&self) -> &HashMap<String, i64> {
        &self.usage
    }

    pub fn names(&self) -> &HashMap<String, String> {
        &self.names
    }

    /// Date of the most recent successful log, used as the default reference
    /// date for read commands.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    /// Validates and inserts one session. At most one session may exist per
    /// (canonical activity, date) pair; a collision names the display name it
    /// collided with. On success the display-name map is overwritten with the
    /// latest-typed casing and the usage timestamp is refreshed.
    pub async fn add_session(
        &mut self,
        activity: &str,
        minutes: u32,
        date: NaiveDate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Session, ValidationError> {
        let trimmed = activity.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyActivity);
        }
        if minutes == 0 || minutes > MAX_MINUTES {
            return Err(ValidationError::MinutesOutOfRange(minutes));
        }
        if date > today {
            return Err(ValidationError::FutureDate(date));
        }
        if let Some(existing) = find_duplicate(&self.sessions, trimmed, date) {
            return Err(ValidationError::DuplicateForDate {
                existing: display_name(&existing.canonical(), &self.names).to_string(),
                date,
            });
        }

        let session = Session {
            id: Uuid::new_v4().to_string().into(),
            activity: trimmed.into(),
            minutes,
            date,
        };
        let key = session.canonical();
        self.sessions.push(session.clone());
        // Last write wins for the displayed casing.
        self.names.insert(key.clone(), trimmed.to_string());
        self.usage.insert(key, now.timestamp_millis());
        self.last_date = Some(date);

        self.sync_sessions().await;
        self.sync_names().await;
        self.sync_usage().await;
        self.sync_last_date().await;
        Ok(session)
    }

    /// Removes an activity from one date: its session and every journal entry
    /// attached to the same canonical-activity+date pair. Both collections are
    /// updated before control returns. Returns (sessions, journal entries)
    /// removed.
    pub async fn delete_activity_on(&mut self, activity: &str, date: NaiveDate) -> (usize, usize) {
        let key = normalize(activity);

        let sessions_before = self.sessions.len();
        self.sessions
            .retain(|s| !(s.date == date && s.canonical() == key));
        let journal_before = self.journal.len();
        self.journal
            .retain(|e| !(e.date == date && e.canonical() == key));

        let removed = (
            sessions_before - self.sessions.len(),
            journal_before - self.journal.len(),
        );
        if removed.0 > 0 {
            self.sync_sessions().await;
        }
        if removed.1 > 0 {
            self.sync_journal().await;
        }
        removed
    }

    /// Removes every session and journal entry for one calendar day.
    pub async fn delete_date(&mut self, date: NaiveDate) -> (usize, usize) {
        let sessions_before = self.sessions.len();
        self.sessions.retain(|s| s.date != date);
        let journal_before = self.journal.len();
        self.journal.retain(|e| e.date != date);

        let removed = (
            sessions_before - self.sessions.len(),
            journal_before - self.journal.len(),
        );
        if removed.0 > 0 {
            self.sync_sessions().await;
        }
        if removed.1 > 0 {
            self.sync_journal().await;
        }
        removed
    }

    /// Appends a journal entry. No dedup: several notes on the same
    /// activity+date are fine.
    pub async fn add_journal(
        &mut self,
        word: &str,
        text: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<JournalEntry, ValidationError> {
        let trimmed = word.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyActivity);
        }

        let entry = JournalEntry {
            id: Uuid::new_v4().to_string().into(),
            word: trimmed.into(),
            text: text.to_string(),
            date,
            timestamp: now,
        };
        self.journal.push(entry.clone());
        self.sync_journal().await;
        Ok(entry)
    }

    /// Replaces the text and refreshes the timestamp of the matching entry.
    /// No-op when the id is absent; returns whether anything changed.
    pub async fn update_journal(&mut self, id: &str, new_text: &str, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.journal.iter_mut().find(|e| &*e.id == id) else {
            return false;
        };
        entry.text = new_text.to_string();
        entry.timestamp = now;
        self.sync_journal().await;
        true
    }

    pub async fn delete_journal(&mut self, id: &str) -> bool {
        let before = self.journal.len();
        self.journal.retain(|e| &*e.id != id);
        let changed = self.journal.len() != before;
        if changed {
            self.sync_journal().await;
        }
        changed
    }

    /// Journal entries for one activity whose date satisfies the predicate.
    /// The activity link is case-insensitive, mirroring session aggregation.
    pub fn journal_for(
        &self,
        activity: &str,
        predicate: impl Fn(NaiveDate) -> bool,
    ) -> Vec<&JournalEntry> {
        let key = normalize(activity);
        self.journal
            .iter()
            .filter(|e| e.canonical() == key && predicate(e.date))
            .collect()
    }

    async fn sync_sessions(&self) {
        write_slot(&self.store, SESSIONS_SLOT, &self.sessions).await;
    }

    async fn sync_journal(&self) {
        write_slot(&self.store, JOURNAL_SLOT, &self.journal).await;
    }

    async fn sync_usage(&self) {
        write_slot(&self.store, ACTIVITY_USAGE_SLOT, &self.usage).await;
    }

    async fn sync_names(&self) {
        write_slot(&self.store, ACTIVITY_NAMES_SLOT, &self.names).await;
    }

    async fn sync_last_date(&self) {
        match self.last_date {
            Some(date) => {
                let iso = crate::core::timerange::to_iso_date(date);
                if let Err(e) = self.store.set(LAST_DATE_SLOT, &iso).await {
                    warn!("Failed to persist slot {LAST_DATE_SLOT}: {e}");
                }
            }
            None => {
                if let Err(e) = self.store.remove(LAST_DATE_SLOT).await {
                    warn!("Failed to clear slot {LAST_DATE_SLOT}: {e}");
                }
            }
        }
    }
}

/// Reads one JSON slot, substituting the empty collection for anything that is
/// missing or does not parse. Corrupt state is logged, never surfaced.
async fn read_slot<S: KvStore, T: DeserializeOwned + Default>(store: &S, key: &str) -> T {
    match store.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Slot {key} holds malformed JSON, starting empty: {e}");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!("Failed to read slot {key}, starting empty: {e}");
            T::default()
        }
    }
}

/// Best-effort write of one JSON slot. Quota or serialization failures leave
/// the in-memory state authoritative for this run.
async fn write_slot<S: KvStore, T: Serialize>(store: &S, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            if let Err(e) = store.set(key, &json).await {
                warn!("Failed to persist slot {key}: {e}");
            }
        }
        Err(e) => warn!("Failed to serialize slot {key}: {e}"),
    }
}
