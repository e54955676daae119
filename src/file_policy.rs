//! 文件策略：根据模型 id 判断某种 MIME 类型的附件是否可以发送给该模型。
//!
//! File policy evaluation.
//!
//! Whether a model accepts a file is derived purely from its id: ids matching
//! a vision pattern accept common image types, ids matching a PDF pattern
//! accept `application/pdf`. Office documents and RTF are blocked for every
//! model, and a block always wins over an allow.
//!
//! ```rust
//! use pen2pdf_ai::file_policy::is_file_allowed;
//!
//! assert!(is_file_allowed("gpt-4o", "image/png"));
//! assert!(is_file_allowed("gemini-2.5-pro", "application/pdf"));
//! assert!(!is_file_allowed("gpt-3.5-turbo", "image/png"));
//! ```

use serde::Serialize;
use std::collections::BTreeSet;

pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

pub const PDF_MIME_TYPE: &str = "application/pdf";

pub const BLOCKED_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/rtf",
];

const VISION_PATTERNS: &[&str] = &["gpt-4o", "gpt-4-turbo", "llama-3.2", "gemini", "phi-3.5-moe", "phi-4"];

const PDF_PATTERNS: &[&str] = &["gemini", "gpt-4o", "o1-mini", "llama-3.2", "phi-4"];

/// Lower-cased MIME essence, without parameters such as `; charset=...`.
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn matches_any(model_id: &str, patterns: &[&str]) -> bool {
    let id = model_id.to_ascii_lowercase();
    patterns.iter().any(|p| id.contains(p))
}

pub fn is_vision_capable(model_id: &str) -> bool {
    matches_any(model_id, VISION_PATTERNS)
}

pub fn is_pdf_capable(model_id: &str) -> bool {
    matches_any(model_id, PDF_PATTERNS)
}

/// File acceptance rules for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePolicy {
    pub allows_files: bool,
    pub allowed_mime_types: BTreeSet<String>,
    pub blocked_mime_types: BTreeSet<String>,
}

impl FilePolicy {
    pub fn for_model(model_id: &str) -> Self {
        let mut allowed = BTreeSet::new();
        if is_vision_capable(model_id) {
            allowed.extend(ALLOWED_IMAGE_MIME_TYPES.iter().map(|m| m.to_string()));
        }
        if is_pdf_capable(model_id) {
            allowed.insert(PDF_MIME_TYPE.to_string());
        }
        Self {
            allows_files: !allowed.is_empty(),
            allowed_mime_types: allowed,
            blocked_mime_types: BLOCKED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn allows(&self, mime: &str) -> bool {
        let mime = normalize_mime(mime);
        if self.blocked_mime_types.contains(&mime) {
            return false;
        }
        self.allows_files && self.allowed_mime_types.contains(&mime)
    }
}

/// Deny if blocked, deny if the model takes no files, else allow only listed types.
pub fn is_file_allowed(model_id: &str, mime: &str) -> bool {
    FilePolicy::for_model(model_id).allows(mime)
}
