use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::constants::*;

pub mod google_auth_token;

use google_auth_token::GoogleAuthToken;

#[cfg(test)]
use mockall::automock;

/// Title/body/optional image of a push notification, shared by the single
/// and batch send paths
#[derive(Debug, Clone, PartialEq)]
pub struct PushNote {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
}

impl PushNote {
    pub fn new(title: &str, body: &str, image_url: Option<String>) -> Self {
        Self {
            title: title.to_owned(),
            body: body.to_owned(),
            image_url,
        }
    }
}

/// Outcome of one item of a batch send, failures are isolated per item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub user_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct PushNotification {
    title: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Serialize)]
struct PushAndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    click_action: String,
    sound: String,
    channel_id: String,
}

#[derive(Debug, Serialize)]
struct PushAndroid {
    priority: String,
    notification: PushAndroidNotification,
}

#[derive(Debug, Serialize)]
struct ApnsHeaders {
    #[serde(rename = "apns-priority")]
    apns_priority: String,
}

#[derive(Debug, Serialize)]
struct ApnsAlert {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct ApnsAps {
    alert: ApnsAlert,
    #[serde(rename = "mutable-content")]
    mutable_content: u8,
    sound: String,
}

#[derive(Debug, Serialize)]
struct ApnsPayload {
    aps: ApnsAps,
    #[serde(rename = "media-url")]
    #[serde(skip_serializing_if = "Option::is_none")]
    media_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PushApns {
    headers: ApnsHeaders,
    payload: ApnsPayload,
}

#[derive(Debug, Serialize)]
struct PushWebpushNotification {
    title: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(rename = "requireInteraction")]
    require_interaction: bool,
}

#[derive(Debug, Serialize)]
struct WebpushFcmOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

#[derive(Debug, Serialize)]
struct PushWebpush {
    notification: PushWebpushNotification,
    fcm_options: WebpushFcmOptions,
}

#[derive(Debug, Serialize)]
struct PushMessageData {
    title: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    click_action: String,
}

#[derive(Debug, Serialize)]
struct PushMessage {
    token: String,
    notification: PushNotification,
    android: PushAndroid,
    apns: PushApns,
    webpush: PushWebpush,
    data: PushMessageData,
}

#[derive(Debug, Serialize)]
struct PushPayload {
    message: PushMessage,
}

impl PushPayload {
    fn new(device: &str, note: &PushNote) -> Self {
        let notification = PushNotification {
            title: note.title.to_owned(),
            body: note.body.to_owned(),
            image: note.image_url.clone(),
        };
        let android = PushAndroid {
            priority: "high".to_string(),
            notification: PushAndroidNotification {
                image: note.image_url.clone(),
                click_action: PUSH_CLICK_ACTION.to_string(),
                sound: "default".to_string(),
                channel_id: PUSH_ANDROID_CHANNEL_ID.to_string(),
            },
        };
        let apns = PushApns {
            headers: ApnsHeaders {
                apns_priority: "10".to_string(),
            },
            payload: ApnsPayload {
                aps: ApnsAps {
                    alert: ApnsAlert {
                        title: note.title.to_owned(),
                        body: note.body.to_owned(),
                    },
                    mutable_content: 1,
                    sound: "default".to_string(),
                },
                media_url: note.image_url.clone(),
            },
        };
        let webpush = PushWebpush {
            notification: PushWebpushNotification {
                title: note.title.to_owned(),
                body: note.body.to_owned(),
                image: note.image_url.clone(),
                require_interaction: true,
            },
            fcm_options: WebpushFcmOptions {
                link: note.image_url.clone(),
            },
        };
        let data = PushMessageData {
            title: note.title.to_owned(),
            body: note.body.to_owned(),
            image: note.image_url.clone(),
            click_action: PUSH_CLICK_ACTION.to_string(),
        };
        let message = PushMessage {
            token: device.to_string(),
            notification,
            android,
            apns,
            webpush,
            data,
        };
        Self { message }
    }
}

/// Client for the FCM HTTP v1 send endpoint. Holds the cached OAuth2
/// access token behind a mutex so concurrent senders share one refresh.
pub struct FcmClient {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Mutex<GoogleAuthToken>,
}

#[cfg_attr(test, automock)]
impl FcmClient {
    pub fn new() -> anyhow::Result<Self> {
        let project_id = std::env::var("FIREBASE_PROJECT_ID")?;
        let endpoint = format!("{FCM_ENDPOINT_BASE}/{project_id}/messages:send");
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            auth_token: Mutex::new(GoogleAuthToken::default()),
        })
    }

    pub async fn send_push(&self, device: &str, note: &PushNote) -> anyhow::Result<()> {
        let access_token = {
            let mut auth_token = self.auth_token.lock().await;
            auth_token.get_access_token().await?.to_string()
        };
        let bearer_token = format!("Bearer {}", access_token);
        let payload = PushPayload::new(device, note);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_token.as_str().parse()?);
        headers.insert(CONTENT_TYPE, "application/json".parse()?);
        let res = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("push message request failed with status {status}: {body}");
        }
        Ok(())
    }

    /// Sends the same note to every token in `tokens`; `user_ids` is the
    /// parallel array of recipients. One item failing never affects the rest.
    pub async fn send_batch(
        &self,
        tokens: &[String],
        user_ids: &[String],
        note: &PushNote,
    ) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(tokens.len());
        for (device, user_id) in tokens.iter().zip(user_ids.iter()) {
            match self.send_push(device, note).await {
                Ok(()) => results.push(BatchItemResult {
                    user_id: user_id.to_owned(),
                    success: true,
                    error: None,
                }),
                Err(err) => {
                    tracing::debug!("batch push failed for user {}: {:?}", user_id, err);
                    results.push(BatchItemResult {
                        user_id: user_id.to_owned(),
                        success: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        results
    }
}
