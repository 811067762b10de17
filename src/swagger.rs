use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::ping::ping_handler,
        crate::handlers::default::default_route_handler,
        crate::handlers::upload::image::upload_image_handler,
        crate::handlers::notification::send::send_noti_handler,
        crate::handlers::notification::send_batch::send_batch_noti_handler,
    ),
    components(
        schemas(
            crate::models::SendNotiReq,
            crate::models::SendBatchNotiReq,

            crate::models::GenericResponse,
            crate::models::SendNotiRes,
            crate::models::SendBatchNotiRes,
            crate::models::FileUploadRes,

            crate::models::NotificationHistoryEntry,
            crate::fcm::BatchItemResult,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Debugging API", description = "API for debugging purposes"),
        (name = "Upload API", description = "API for image uploads"),
        (name = "Notification API", description = "API for push notifications")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "x-api-key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
            )
        }
    }
}
