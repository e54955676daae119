//! 请求校验：在选择任何候选模型之前检查调用方输入。
//!
//! Request validation, run once before candidate resolution.

use crate::request::GenerateRequest;
use crate::{Error, ErrorContext, Result};

pub(crate) fn validate_request(request: &GenerateRequest) -> Result<()> {
    if request.message.trim().is_empty() && request.attachments.is_empty() {
        return Err(Error::validation_with_context(
            "Message or file is required",
            ErrorContext::new()
                .with_field_path("message")
                .with_source("request_validator"),
        ));
    }

    for (field, value) in [
        ("model", request.model.as_deref()),
        ("preferred_model", request.preferred_model.as_deref()),
    ] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(Error::validation_with_context(
                format!("{} must not be blank", field),
                ErrorContext::new()
                    .with_field_path(field)
                    .with_source("request_validator"),
            ));
        }
    }

    if let Some(t) = request.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(Error::validation_with_context(
                format!("temperature {} is outside 0.0..=2.0", t),
                ErrorContext::new()
                    .with_field_path("temperature")
                    .with_source("request_validator"),
            ));
        }
    }

    for (i, attachment) in request.attachments.iter().enumerate() {
        if attachment.data.is_empty() {
            return Err(Error::validation_with_context(
                format!("Attachment {} is empty", attachment.file_name),
                ErrorContext::new()
                    .with_field_path(format!("attachments[{}]", i))
                    .with_source("request_validator"),
            ));
        }
    }

    Ok(())
}
