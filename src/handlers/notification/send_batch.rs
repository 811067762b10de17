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

/// Send the same push notification to a batch of devices
///
/// `tokens` and `userIds` are parallel arrays; each item succeeds or fails
/// independently of the others and gets its own entry in the result list
#[utoipa::path(
    post,
    path = "/api/v1/notification/sendBatch",
    params(("x-api-key" = String, Header, description = "API key")),
    security(("x-api-key" = [])),
    request_body = SendBatchNotiReq,
    responses(
        (status = StatusCode::OK, description = "Batch processed", body = SendBatchNotiRes),
        (status = StatusCode::BAD_REQUEST, description = "Bad request", body = GenericResponse),
    ),
    tag = "Notification API"
)]
pub async fn send_batch_noti_handler(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    ValidatedBody(body): ValidatedBody<SendBatchNotiReq>,
) -> Result<Json<SendBatchNotiRes>, AppError> {
    validate_batch_request(&body)?;
    let note = PushNote::new(&body.title, &body.body, body.image_url.clone());
    let results = state
        .fcm
        .send_batch(&body.tokens, &body.user_ids, &note)
        .await;
    for item in results.iter().filter(|item| item.success) {
        let entry = NotificationHistoryEntry::new(&item.user_id, &body.title, &body.body);
        let inserted = state
            .db
            .insert_one::<NotificationHistoryEntry>(DB_NAME, COLL_NOTIFICATION_HISTORY, &entry, None)
            .await;
        if let Err(err) = inserted {
            tracing::debug!("not able to store history for user {}: {:?}", item.user_id, err);
        }
    }
    let total_sent = results.iter().filter(|item| item.success).count();
    let res = SendBatchNotiRes {
        success: true,
        message: "Batch notifications sent and stored successfully".to_owned(),
        total_sent,
        results,
    };
    Ok(Json(res))
}

fn validate_batch_request(body: &SendBatchNotiReq) -> Result<(), AppError> {
    if body.tokens.is_empty() {
        let err = "At least one token and userId pair is required";
        return Err(AppError::BadRequestErr(err.into()));
    }
    if body.tokens.len() != body.user_ids.len() {
        let err = "The number of tokens and userIds must be the same";
        return Err(AppError::BadRequestErr(err.into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::{body::Body, http::Request, routing::post, Router};
    use mockall::predicate::always;
    use mockall_double::double;
    use tower::ServiceExt; // for `oneshot` and `ready`

    use super::*;
    use crate::fcm::BatchItemResult;

    #[double]
    use crate::database::AppDatabase;

    #[double]
    use crate::fcm::FcmClient;

    fn build_req(body: &str) -> Request<Body> {
        Request::builder()
            .uri("/sendBatch")
            .method("POST")
            .header("x-api-key", DEFAULT_API_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn build_app(db: AppDatabase, fcm: FcmClient) -> Router {
        let state = Arc::new(AppState {
            db: Arc::new(db),
            fcm: Arc::new(fcm),
        });
        Router::new()
            .route("/sendBatch", post(send_batch_noti_handler))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_batch_empty_tokens_rejected() {
        let mut mock_fcm = FcmClient::default();
        mock_fcm.expect_send_batch().times(0);
        let app = build_app(AppDatabase::default(), mock_fcm);
        let body = r#"{"tokens": [], "userIds": [], "title": "hello", "body": "world"}"#;
        let res = app.oneshot(build_req(body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_length_mismatch_rejected() {
        let mut mock_fcm = FcmClient::default();
        mock_fcm.expect_send_batch().times(0);
        let app = build_app(AppDatabase::default(), mock_fcm);
        let body =
            r#"{"tokens": ["t1", "t2"], "userIds": ["u1"], "title": "hello", "body": "world"}"#;
        let res = app.oneshot(build_req(body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_stores_history_only_for_successful_items() {
        let mut mock_fcm = FcmClient::default();
        mock_fcm
            .expect_send_batch()
            .with(always(), always(), always())
            .times(1)
            .returning(|_, _, _| {
                vec![
                    BatchItemResult {
                        user_id: "u1".to_owned(),
                        success: true,
                        error: None,
                    },
                    BatchItemResult {
                        user_id: "u2".to_owned(),
                        success: false,
                        error: Some("transport error".to_owned()),
                    },
                ]
            });
        let mut mock_db = AppDatabase::default();
        mock_db
            .expect_insert_one::<NotificationHistoryEntry>()
            .times(1)
            .returning(|_, _, _, _| Ok("646e3c7a2f9b960007a1c002".to_owned()));
        let app = build_app(mock_db, mock_fcm);
        let body =
            r#"{"tokens": ["t1", "t2"], "userIds": ["u1", "u2"], "title": "hello", "body": "world"}"#;
        let res = app.oneshot(build_req(body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        let res: SendBatchNotiRes = serde_json::from_slice(&body).unwrap();
        assert_eq!(res.success, true);
        assert_eq!(res.total_sent, 1);
        assert_eq!(res.results.len(), 2);
        assert_eq!(res.results[1].success, false);
    }
}
