use crate::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

/// Route-level error. Full detail goes to the log; callers get a sanitized
/// message plus a trace id to correlate with it.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<crate::session::StoreError> for ApiError {
    fn from(err: crate::session::StoreError) -> Self {
        Self(Error::Store(err))
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>, field: &str) -> Self {
        Self(Error::validation_with_context(
            message,
            crate::ErrorContext::new()
                .with_field_path(field)
                .with_source("http_route"),
        ))
    }

    /// Message that is safe to hand back to the browser.
    fn public_message(&self) -> String {
        match &self.0 {
            Error::Validation { message, .. } | Error::Configuration { message, .. } => {
                message.clone()
            }
            Error::RateLimited { model, .. } => format!(
                "Model \"{}\" has reached its quota or rate limit. Please switch to a different model.",
                model
            ),
            Error::EmptyResponse { .. } => {
                "No text could be extracted from the model response.".to_string()
            }
            Error::DeadlineExceeded { .. } => "The request took too long to complete.".to_string(),
            Error::Store(crate::session::StoreError::NotFound(what)) => format!("{} not found", what),
            Error::Provider { status, .. } => match status {
                Some(code) => format!("Model provider error: {}. Please try a different model.", code),
                None => "Model provider error. Please try a different model.".to_string(),
            },
            _ => "An error occurred processing your request. Please try a different model."
                .to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let status = self.0.http_status();
        let kind = self.0.kind();
        let attempted = self.0.attempted_models().join(",");

        if status >= 500 {
            error!(error = %self.0, error_kind = kind, attempted = %attempted, trace_id = %trace_id, "request failed");
        } else {
            warn!(error = %self.0, error_kind = kind, attempted = %attempted, trace_id = %trace_id, "request rejected");
        }

        let mut detail = serde_json::json!({
            "type": kind,
            "message": self.public_message(),
            "status": status,
        });
        if let Error::RateLimited { model, .. } = &self.0 {
            detail["model"] = serde_json::Value::String(model.clone());
        }

        let body = serde_json::json!({
            "success": false,
            "error": detail,
            "trace_id": trace_id,
        });
        let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(body)).into_response()
    }
}
