use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, get_service, post, IntoMakeService};
use axum::{BoxError, Json, Router};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::constants::*;
use crate::handlers::*;
use crate::models::GenericResponse;
use crate::swagger::ApiDoc;
use crate::utils::get_uploads_dir;

#[cfg(test)]
use mockall_double::double;

#[cfg_attr(test, double)]
use crate::database::AppDatabase;

#[cfg_attr(test, double)]
use crate::fcm::FcmClient;

/// Shared state handed to every handler
pub struct AppState {
    pub db: Arc<AppDatabase>,
    pub fcm: Arc<FcmClient>,
}

pub fn build_app(state: Arc<AppState>) -> IntoMakeService<Router> {
    tracing::debug!("Initializing the app");
    let api_routes = Router::new()
        .route("/ping", get(ping_handler))
        .route("/upload", post(upload_image_handler))
        .route("/notification/send", post(send_noti_handler))
        .route("/notification/sendBatch", post(send_batch_noti_handler));
    let uploads_service =
        get_service(ServeDir::new(get_uploads_dir())).handle_error(handle_static_error);
    let app = Router::new()
        .route("/", get(default_route_handler))
        .nest("/api/v1", api_routes)
        .nest_service("/uploads", uploads_service)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(global_404_handler)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
        .with_state(state);
    app.into_make_service()
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, Json<GenericResponse>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        let response = GenericResponse {
            success: false,
            message: "Request timed out".to_owned(),
        };
        (StatusCode::REQUEST_TIMEOUT, Json(response))
    } else {
        let response = GenericResponse {
            success: false,
            message: format!("Unhandled internal error: {err}"),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(response))
    }
}

async fn handle_static_error(err: io::Error) -> (StatusCode, Json<GenericResponse>) {
    tracing::debug!("error serving static file: {:?}", err);
    let response = GenericResponse {
        success: false,
        message: "Error serving file".to_owned(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(response))
}
