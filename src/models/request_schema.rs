use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// request body schema for sending a single push notification
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotiReq {
    #[validate(length(min = 1))]
    pub token: String,

    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(length(min = 1, max = 500))]
    pub body: String,

    #[validate(length(min = 1))]
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub image_url: Option<String>,
}

/// request body schema for sending a batch of push notifications
///
/// `tokens` and `userIds` are parallel arrays and must have the same length
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendBatchNotiReq {
    pub tokens: Vec<String>,

    pub user_ids: Vec<String>,

    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(length(min = 1, max = 500))]
    pub body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub image_url: Option<String>,
}
