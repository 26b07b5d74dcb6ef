use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::normalize::normalize;

/// One logged (activity, duration, date) fact. Immutable after creation; removal
/// only happens in bulk by canonical-activity+date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Arc<str>,
    /// Activity name with the casing the user typed.
    pub activity: Arc<str>,
    pub minutes: u32,
    #[serde(rename = "dateISO")]
    pub date: NaiveDate,
}

impl Session {
    pub fn canonical(&self) -> String {
        normalize(&self.activity)
    }
}

/// Free-text note attached to an activity+date pair. The link to sessions is by
/// case-insensitive comparison of `word`, never by session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Arc<str>,
    pub word: Arc<str>,
    pub text: String,
    #[serde(rename = "dateISO")]
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

impl JournalEntry {
    pub fn canonical(&self) -> String {
        normalize(&self.word)
    }
}
