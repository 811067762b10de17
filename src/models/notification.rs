use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::{deserialize_helper, get_epoch_ts};

/// Append-only log entry written after every successful push delivery
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationHistoryEntry {
    #[serde(rename = "_id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "deserialize_helper")]
    #[serde(default)]
    _id: Option<String>,
    user_id: String,
    title: String,
    body: String,
    is_read: bool,
    timestamp: Option<u64>,
}

impl NotificationHistoryEntry {
    pub fn new(user_id: &str, title: &str, body: &str) -> Self {
        let ts = get_epoch_ts();
        Self {
            _id: None,
            user_id: user_id.to_owned(),
            title: title.to_owned(),
            body: body.to_owned(),
            is_read: false,
            timestamp: Some(ts),
        }
    }
}
