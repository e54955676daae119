//! Uploaded files carried along with a single request.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Raw bytes plus the declared MIME type and source filename.
///
/// On the wire the bytes travel as base64 under `fileData`; a `data:` URL
/// prefix is accepted and stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub file_name: String,
    #[serde(rename = "fileType", alias = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "fileData", with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build from base64 text, with or without a `data:<mime>;base64,` prefix.
    pub fn from_base64(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        encoded: &str,
    ) -> std::result::Result<Self, base64::DecodeError> {
        Ok(Self::new(file_name, mime_type, base64_bytes::decode(encoded)?))
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn decode(encoded: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        let payload = match encoded.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };
        base64::engine::general_purpose::STANDARD.decode(payload.trim())
    }

    pub fn serialize<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        decode(&encoded).map_err(serde::de::Error::custom)
    }
}
