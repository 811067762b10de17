use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod job_status;
pub mod notification;
pub mod reminder;
pub mod request_schema;
pub mod response_schema;
pub mod user;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenericResponse {
    pub success: bool,
    pub message: String,
}

pub use job_status::*;
pub use notification::*;
pub use reminder::*;
pub use request_schema::*;
pub use response_schema::*;
pub use user::*;
