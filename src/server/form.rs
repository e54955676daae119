//! Request bodies that arrive either as multipart uploads or as JSON.

use super::error::ApiError;
use crate::types::Attachment;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const DEFAULT_UPLOAD_MIME: &str = "application/octet-stream";

/// Text fields plus uploaded files, regardless of how the client encoded them.
#[derive(Debug, Default)]
pub struct RequestForm {
    pub fields: Map<String, Value>,
    /// `(field name, file)` in upload order.
    pub files: Vec<(String, Attachment)>,
}

impl RequestForm {
    /// Non-blank string field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Typed field. Multipart sends structured values as JSON strings.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        let parsed = match self.fields.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(None),
            Some(Value::String(raw)) => serde_json::from_str(raw)
                .or_else(|_| serde_json::from_value(Value::String(raw.clone()))),
            Some(other) => serde_json::from_value(other.clone()),
        };
        parsed
            .map(Some)
            .map_err(|e| ApiError::validation(format!("Invalid field {}: {}", name, e), name))
    }

    /// Files uploaded under `name` or `name[]`.
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attachment> + 'a {
        self.files
            .iter()
            .filter(move |(field, _)| field == name || field.strip_suffix("[]") == Some(name))
            .map(|(_, file)| file)
    }

    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

impl<S> FromRequest<S> for RequestForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut form = RequestForm::default();

        if !is_multipart(&req) {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation(e.body_text(), "body"))?;
            return match value {
                Value::Object(fields) => {
                    form.fields = fields;
                    Ok(form)
                }
                _ => Err(ApiError::validation("Request body must be a JSON object", "body")),
            };
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text(), "body"))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(e.body_text(), "body"))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let mime = field
                        .content_type()
                        .unwrap_or(DEFAULT_UPLOAD_MIME)
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::validation(e.body_text(), &name))?;
                    form.files.push((name, Attachment::new(file_name, mime, data.to_vec())));
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(e.body_text(), &name))?;
                    form.fields.insert(name, Value::String(text));
                }
            }
        }
        Ok(form)
    }
}
