use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    app::AppState,
    auth::ApiKey,
    constants::*,
    fcm::PushNote,
    models::*,
    utils::{AppError, ValidatedBody},
};

/// Send a push notification to a single device
///
/// Delivers the notification through FCM and appends an entry to the
/// user's notification history
#[utoipa::path(
    post,
    path = "/api/v1/notification/send",
    params(("x-api-key" = String, Header, description = "API key")),
    security(("x-api-key" = [])),
    request_body = SendNotiReq,
    responses(
        (status = StatusCode::OK, description = "Notification sent", body = SendNotiRes),
        (status = StatusCode::BAD_REQUEST, description = "Bad request", body = GenericResponse),
    ),
    tag = "Notification API"
)]
pub async fn send_noti_handler(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    ValidatedBody(body): ValidatedBody<SendNotiReq>,
) -> Result<Json<SendNotiRes>, AppError> {
    let note = PushNote::new(&body.title, &body.body, body.image_url.clone());
    state.fcm.send_push(&body.token, &note).await.map_err(|err| {
        tracing::debug!("error sending notification: {:?}", err);
        AppError::AnyError(err)
    })?;
    let entry = NotificationHistoryEntry::new(&body.user_id, &body.title, &body.body);
    state
        .db
        .insert_one::<NotificationHistoryEntry>(DB_NAME, COLL_NOTIFICATION_HISTORY, &entry, None)
        .await?;
    let res = SendNotiRes {
        success: true,
        message: "Notification sent and stored successfully".to_owned(),
    };
    Ok(Json(res))
}
