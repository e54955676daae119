//! Model descriptors and the id heuristics that derive them.

use crate::file_policy::{is_pdf_capable, is_vision_capable, FilePolicy};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire endpoint family that serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Gemini,
    GithubModels,
    Longcat,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Gemini, Backend::GithubModels, Backend::Longcat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini",
            Backend::GithubModels => "github_models",
            Backend::Longcat => "longcat",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gemini" => Some(Backend::Gemini),
            "github_models" | "github-models" | "github" => Some(Backend::GithubModels),
            "longcat" => Some(Backend::Longcat),
            _ => None,
        }
    }

    /// Backend for an id that is not in any catalog list.
    pub fn infer(model_id: &str) -> Self {
        let id = model_id.to_ascii_lowercase();
        if id.starts_with("longcat") {
            Backend::Longcat
        } else if id.starts_with("gemini") {
            Backend::Gemini
        } else {
            Backend::GithubModels
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor that trained the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenAi,
    Anthropic,
    Google,
    Meta,
    Mistral,
    Cohere,
    Ai21,
    Microsoft,
    LongCat,
    Unknown,
}

impl ModelProvider {
    /// First matching family fragment wins.
    pub fn infer(model_id: &str) -> Self {
        let id = model_id.to_ascii_lowercase();
        if id.contains("gpt") {
            Self::OpenAi
        } else if id.contains("claude") {
            Self::Anthropic
        } else if id.contains("gemini") {
            Self::Google
        } else if id.contains("llama") {
            Self::Meta
        } else if id.contains("mistral") {
            Self::Mistral
        } else if id.contains("cohere") {
            Self::Cohere
        } else if id.contains("ai21") || id.contains("jamba") {
            Self::Ai21
        } else if id.contains("phi") {
            Self::Microsoft
        } else if id.contains("longcat") {
            Self::LongCat
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub text: bool,
    pub images: bool,
    pub pdf: bool,
}

static VENDOR_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(openai/|anthropic/|meta/|google/|mistral/)").expect("vendor prefix pattern")
});

/// `openai/gpt-4o-mini` -> `Gpt 4o Mini`
pub fn prettify_model_name(model_id: &str) -> String {
    let bare = VENDOR_PREFIX.replace(model_id, "");
    bare.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Immutable description of one candidate model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub provider: ModelProvider,
    pub backend: Backend,
    pub capabilities: Capabilities,
    pub file_policy: FilePolicy,
    /// Position within its candidate list; lower is tried first.
    pub priority: usize,
}

impl ModelDescriptor {
    pub fn from_id(id: &str, backend: Backend, priority: usize) -> Self {
        let file_policy = FilePolicy::for_model(id);
        Self {
            id: id.to_string(),
            display_name: prettify_model_name(id),
            provider: ModelProvider::infer(id),
            backend,
            capabilities: Capabilities {
                text: true,
                images: is_vision_capable(id),
                pdf: is_pdf_capable(id),
            },
            file_policy,
            priority,
        }
    }
}
