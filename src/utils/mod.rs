pub(crate) mod error_handler;
pub(crate) mod misc;
pub(crate) mod validation;

pub(crate) use error_handler::AppError;
pub(crate) use misc::*;
pub(crate) use validation::ValidatedBody;
