use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::fcm::BatchItemResult;

/// response schema for file upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadRes {
    pub success: bool,
    pub message: String,
    pub image_url: String,
    pub filename: String,
    pub size: usize,
}

/// response schema for sending a single push notification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendNotiRes {
    pub success: bool,
    pub message: String,
}

/// response schema for sending a batch of push notifications
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendBatchNotiRes {
    pub success: bool,
    pub message: String,
    pub total_sent: usize,
    pub results: Vec<BatchItemResult>,
}
