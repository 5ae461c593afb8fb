use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    web, HttpRequest,
};

use crate::core::AppError;

/// Body size limit for JSON payloads (batch submissions are the largest)
const JSON_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// JSON extractor config that reports malformed bodies in the standard
/// `{"error": {...}}` shape instead of actix's plain-text default
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(json_error_handler)
}

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected JSON payload");
    AppError::validation(format!("Invalid request body: {}", err)).into()
}

/// Query string extractor config with the same error envelope
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected query string");
    AppError::validation(format!("Invalid query string: {}", err)).into()
}
