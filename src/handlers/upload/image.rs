use axum::{extract::Multipart, Json};
use std::path::Path;

use crate::{
    auth::ApiKey,
    models::*,
    utils::{get_upload_url, get_uploads_dir, AppError},
};

/// Upload an image
///
/// Stores the file on local disk under a unique name and returns the
/// public url it is served from
#[utoipa::path(
    post,
    path = "/api/v1/upload",
    params(("x-api-key" = String, Header, description = "API key")),
    security(("x-api-key" = [])),
    responses(
        (status = StatusCode::OK, description = "upload successful", body = FileUploadRes),
        (status = StatusCode::BAD_REQUEST, description = "Bad request", body = GenericResponse),
    ),
    tag = "Upload API"
)]
pub async fn upload_image_handler(
    _key: ApiKey,
    mut files: Multipart,
) -> Result<Json<FileUploadRes>, AppError> {
    let file = files
        .next_field()
        .await?
        .ok_or(AppError::BadRequestErr("No file uploaded.".into()))?;
    let content_type = file.content_type().unwrap_or_default().to_string();
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequestErr("Only image files are allowed!".into()));
    }
    let file_name = file
        .file_name()
        .ok_or(AppError::BadRequestErr("unable to read file name".into()))?
        .to_string();
    let data = file.bytes().await.map_err(|err| {
        tracing::debug!("{:?}", err);
        AppError::BadRequestErr("unable to read file content".into())
    })?;
    let key = super::uniq_file_name(&file_name);
    let dir = get_uploads_dir();
    tokio::fs::create_dir_all(&dir).await?;
    let path = Path::new(&dir).join(&key);
    let size = data.len();
    tokio::fs::write(&path, &data).await?;
    tracing::debug!("stored uploaded file {} ({} bytes)", key, size);
    let url = get_upload_url(&key);
    let res = FileUploadRes {
        success: true,
        message: "File uploaded successfully!".to_owned(),
        image_url: url,
        filename: key,
        size,
    };
    Ok(Json(res))
}
