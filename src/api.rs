use std::fmt::Display;

use rocket::response::content::Json;
use serde_json::json;


pub type JsonResult = Result<Json<String>, ApiError>;


#[derive(Responder)]
pub enum ApiError {
    #[response(status = 400)]
    Validation(Json<String>),
    #[response(status = 429)]
    RateLimited(Json<String>),
    #[response(status = 500)]
    Internal(Json<String>),
}


pub fn make_json_result(json: String) -> JsonResult {
    Ok(Json(json))
}

pub fn validation_error(msg: &str) -> ApiError {
    ApiError::Validation(Json(json!({
        "error": msg,
    }).to_string()))
}

pub fn rate_limit_error(retry_after_secs: u64) -> ApiError {
    ApiError::RateLimited(Json(json!({
        "error": "Too many reports, slow down",
        "retryAfter": retry_after_secs,
    }).to_string()))
}

/// Logs the failure detail server-side and hides it from the response.
pub fn internal_error<E: Display>(err: E) -> ApiError {
    error!("Internal error: {}", err);

    ApiError::Internal(Json(json!({
        "error": "Internal server error",
    }).to_string()))
}
