use serde::{Deserialize, Serialize};

use crate::utils::deserialize_helper;

/// A "notify me when the session starts" record created from the app.
/// The scheduler only ever flips `user_notified` from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    #[serde(rename = "_id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "deserialize_helper")]
    #[serde(default)]
    pub _id: Option<String>,
    pub user_id: String,
    pub topic: String,
    pub speaker_name: String,
    /// local time of the session, e.g. "11:00 AM"
    pub time: String,
    /// calendar date of the session, e.g. "2024-06-01"
    pub date: String,
    pub user_notified: bool,
}

/// Process-local dedup key for an armed reminder. Not persisted, lost on
/// restart; armed reminders are re-derived from the store on the next pass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduledKey {
    user_id: String,
    event_ts: i64,
}

impl ScheduledKey {
    pub fn new(user_id: &str, event_ts: i64) -> Self {
        Self {
            user_id: user_id.to_owned(),
            event_ts,
        }
    }
}
