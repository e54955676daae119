//! Text extraction from provider response bodies.
//!
//! Response shapes differ across backends and SDK generations. Each known
//! shape has one extractor; they are tried in a fixed order and the first one
//! yielding non-blank text wins.

use super::UsageInfo;
use serde_json::Value;

/// Which response shape the text was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// `text` or `response.text`
    DirectText(String),
    /// `candidates[0].content.parts[*].text`, optionally under `response`
    NestedCandidates(String),
    /// `choices[0].message.content`
    ChatChoices(String),
    /// `output[0].content[0].text`
    OutputItems(String),
}

impl ExtractionResult {
    pub fn text(&self) -> &str {
        match self {
            Self::DirectText(t)
            | Self::NestedCandidates(t)
            | Self::ChatChoices(t)
            | Self::OutputItems(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::DirectText(t)
            | Self::NestedCandidates(t)
            | Self::ChatChoices(t)
            | Self::OutputItems(t) => t,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::DirectText(_) => "direct_text",
            Self::NestedCandidates(_) => "nested_candidates",
            Self::ChatChoices(_) => "chat_choices",
            Self::OutputItems(_) => "output_items",
        }
    }
}

type Extractor = fn(&Value) -> Option<ExtractionResult>;

const EXTRACTORS: &[Extractor] = &[direct_text, nested_candidates, chat_choices, output_items];

/// Run the extractors in order; `None` means the body holds no usable text.
pub fn extract_text(body: &Value) -> Option<ExtractionResult> {
    EXTRACTORS
        .iter()
        .filter_map(|extract| extract(body))
        .find(|r| !r.text().trim().is_empty())
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn direct_text(body: &Value) -> Option<ExtractionResult> {
    body.get("text")
        .or_else(|| body.pointer("/response/text"))
        .and_then(Value::as_str)
        .and_then(non_empty)
        .map(ExtractionResult::DirectText)
}

fn join_parts(parts: &Value) -> Option<String> {
    let text: String = parts
        .as_array()?
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    non_empty(&text)
}

fn nested_candidates(body: &Value) -> Option<ExtractionResult> {
    body.pointer("/candidates/0/content/parts")
        .or_else(|| body.pointer("/response/candidates/0/content/parts"))
        .and_then(join_parts)
        .map(ExtractionResult::NestedCandidates)
}

fn chat_choices(body: &Value) -> Option<ExtractionResult> {
    let content = body.pointer("/choices/0/message/content")?;
    let text = match content {
        Value::String(s) => non_empty(s),
        Value::Array(_) => join_parts(content),
        _ => None,
    };
    text.map(ExtractionResult::ChatChoices)
}

fn output_items(body: &Value) -> Option<ExtractionResult> {
    body.pointer("/output/0/content/0/text")
        .and_then(Value::as_str)
        .and_then(non_empty)
        .map(ExtractionResult::OutputItems)
}

/// Token usage from either `usageMetadata` (Gemini) or `usage` (chat completions).
pub fn extract_usage(body: &Value) -> Option<UsageInfo> {
    if let Some(meta) = body.get("usageMetadata") {
        let prompt = meta.get("promptTokenCount").and_then(Value::as_u64).unwrap_or(0);
        let completion = meta
            .get("candidatesTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let total = meta
            .get("totalTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or(prompt + completion);
        return Some(UsageInfo {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: total,
        });
    }
    let usage = body.get("usage")?;
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| usage.get(*n).and_then(Value::as_u64))
            .unwrap_or(0)
    };
    let prompt = field(&["prompt_tokens", "input_tokens"]);
    let completion = field(&["completion_tokens", "output_tokens"]);
    let total = usage
        .get("total_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(prompt + completion);
    Some(UsageInfo {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total,
    })
}
