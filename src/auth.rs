use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{constants::DEFAULT_API_KEY, utils::AppError};

/// Extractor guarding the API routes with the `x-api-key` header.
/// The expected key comes from the API_KEY env variable.
pub struct ApiKey;

#[async_trait]
impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Auth("Missing API key".into()))?;
        let expected = std::env::var("API_KEY").unwrap_or(DEFAULT_API_KEY.to_owned());
        if key != expected {
            return Err(AppError::Auth("Invalid API key".into()));
        }
        Ok(ApiKey)
    }
}
