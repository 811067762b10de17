use serde::{Deserialize, Serialize};

/// Bookkeeping document read by startup recovery. The `lastChecked`
/// document holds the epoch seconds of the last completed check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(rename = "_id")]
    pub _id: String,
    pub timestamp: i64,
}
