//! 模型目录：每个后端的候选模型列表、能力标记与文件策略，以及每个任务的候选优先级列表。
//!
//! Model catalog.
//!
//! The catalog is an injected value built once at startup. It holds:
//!
//! - one model id list per [`Backend`], which discovery may swap atomically,
//! - one ordered candidate list per [`Task`].
//!
//! Descriptors are derived from ids on demand, so capability flags and file
//! policy never drift from the id heuristics.
//!
//! Task list entries may carry a backend prefix (`longcat/LongCat-Flash-Chat`,
//! `github_models/gpt-4o`); unprefixed ids are routed by catalog membership
//! first and by [`Backend::infer`] otherwise.

mod descriptor;

pub use descriptor::{prettify_model_name, Backend, Capabilities, ModelDescriptor, ModelProvider};

use crate::types::Task;
use crate::{Error, ErrorContext, Result};
use arc_swap::ArcSwap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-2.5-pro-latest",
    "gemini-2.5-flash-latest",
    "gemini-2.5-pro-002",
    "gemini-2.5-flash-002",
    "gemini-2.0-flash-exp",
    "gemini-2.0-flash-lite",
];

pub const DEFAULT_GITHUB_MODELS: &[&str] = &[
    "gpt-5",
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
    "claude-3-5-sonnet-4.5",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-sonnet",
    "claude-3-opus-20240229",
    "claude-3-opus",
    "claude-3-sonnet-20240229",
    "claude-3-sonnet",
    "claude-3-haiku-20240307",
    "claude-3-haiku",
    "llama-3.3-70b-instruct",
    "llama-3.2-90b-vision-instruct",
    "llama-3.2-11b-vision-instruct",
    "llama-3.1-405b-instruct",
    "llama-3.1-70b-instruct",
    "llama-3.1-8b-instruct",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "mistral-large-2411",
    "mistral-large",
    "mistral-small",
    "mistral-nemo",
    "cohere-command-r-plus",
    "cohere-command-r",
    "ai21-jamba-1.5-large",
    "ai21-jamba-1.5-mini",
    "phi-4",
    "phi-3.5-moe-instruct",
    "phi-3.5-mini-instruct",
    "phi-3-medium-instruct",
    "phi-3-small-instruct",
    "phi-3-mini-instruct",
];

pub const DEFAULT_LONGCAT_MODELS: &[&str] = &["LongCat-Flash-Chat", "LongCat-Flash-Thinking"];

pub const DEFAULT_TEXT_EXTRACTION_CANDIDATES: &[&str] =
    &["gemini-2.5-pro", "gemini-2.5-flash", "gemini-2.0-flash"];

pub const DEFAULT_NOTES_CANDIDATES: &[&str] = &[
    "gemini-2.5-pro-latest",
    "gemini-2.5-flash-latest",
    "gemini-2.5-pro-002",
    "gemini-2.5-flash-002",
    "gemini-2.0-flash-exp",
    "gemini-2.0-flash-lite",
];

pub const DEFAULT_CHAT_CANDIDATES: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"];

fn to_owned_list(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Per-backend model lists plus per-task candidate priority lists.
pub struct ModelCatalog {
    models: HashMap<Backend, ArcSwap<Vec<String>>>,
    tasks: HashMap<Task, Vec<String>>,
}

impl std::fmt::Debug for ModelCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCatalog")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new()
            .with_models(Backend::Gemini, to_owned_list(DEFAULT_GEMINI_MODELS))
            .with_models(Backend::GithubModels, to_owned_list(DEFAULT_GITHUB_MODELS))
            .with_models(Backend::Longcat, to_owned_list(DEFAULT_LONGCAT_MODELS))
            .with_task(Task::TextExtraction, to_owned_list(DEFAULT_TEXT_EXTRACTION_CANDIDATES))
            .with_task(Task::NotesGeneration, to_owned_list(DEFAULT_NOTES_CANDIDATES))
            .with_task(Task::Chat, to_owned_list(DEFAULT_CHAT_CANDIDATES))
    }
}

impl ModelCatalog {
    /// An empty catalog; every backend list starts empty.
    pub fn new() -> Self {
        let models = Backend::ALL
            .iter()
            .map(|b| (*b, ArcSwap::from_pointee(Vec::new())))
            .collect();
        Self {
            models,
            tasks: HashMap::new(),
        }
    }

    pub fn with_models(self, backend: Backend, ids: Vec<String>) -> Self {
        if let Some(slot) = self.models.get(&backend) {
            slot.store(Arc::new(ids));
        }
        self
    }

    pub fn with_task(mut self, task: Task, candidates: Vec<String>) -> Self {
        self.tasks.insert(task, candidates);
        self
    }

    /// Ordered descriptors for one backend.
    pub fn list_models(&self, backend: Backend) -> Vec<ModelDescriptor> {
        self.model_ids(backend)
            .iter()
            .enumerate()
            .map(|(i, id)| ModelDescriptor::from_id(id, backend, i))
            .collect()
    }

    pub fn model_ids(&self, backend: Backend) -> Arc<Vec<String>> {
        self.models
            .get(&backend)
            .map(|slot| slot.load_full())
            .unwrap_or_default()
    }

    /// Ordered descriptors for a task, without repeats. An empty list is a
    /// configuration error.
    pub fn candidates(&self, task: Task) -> Result<Vec<ModelDescriptor>> {
        let entries = self.tasks.get(&task).map(Vec::as_slice).unwrap_or(&[]);
        if entries.is_empty() {
            return Err(Error::configuration_with_context(
                format!("no candidate models configured for task {}", task),
                ErrorContext::new()
                    .with_field_path(format!("tasks.{}.candidates", task.as_str().replace('-', "_")))
                    .with_source("model_catalog"),
            ));
        }
        let mut seen = HashSet::new();
        Ok(entries
            .iter()
            .map(|entry| self.describe(entry, 0))
            .filter(|d| seen.insert((d.id.clone(), d.backend)))
            .enumerate()
            .map(|(i, mut d)| {
                d.priority = i;
                d
            })
            .collect())
    }

    /// Task candidates with `preferred` moved to the front (added if absent).
    pub fn candidates_preferring(&self, task: Task, preferred: &str) -> Result<Vec<ModelDescriptor>> {
        let mut list = self.candidates(task)?;
        let wanted = self.resolve(preferred);
        let first = match list
            .iter()
            .position(|d| d.id == wanted.id && d.backend == wanted.backend)
        {
            Some(pos) => list.remove(pos),
            None => wanted,
        };
        list.insert(0, first);
        for (i, d) in list.iter_mut().enumerate() {
            d.priority = i;
        }
        Ok(list)
    }

    /// Descriptor for an explicitly requested model, synthesized if unknown.
    pub fn resolve(&self, model_id: &str) -> ModelDescriptor {
        self.describe(model_id, 0)
    }

    pub fn contains(&self, backend: Backend, model_id: &str) -> bool {
        self.model_ids(backend).iter().any(|id| id == model_id)
    }

    /// Replace a backend list with discovered ids. Empty results are ignored.
    pub fn refresh(&self, backend: Backend, discovered: Vec<String>) -> bool {
        if discovered.is_empty() {
            return false;
        }
        match self.models.get(&backend) {
            Some(slot) => {
                info!(backend = backend.as_str(), count = discovered.len(), "model list refreshed");
                slot.store(Arc::new(discovered));
                true
            }
            None => false,
        }
    }

    fn describe(&self, entry: &str, priority: usize) -> ModelDescriptor {
        if let Some((prefix, id)) = entry.split_once('/') {
            if let Some(backend) = Backend::parse(prefix) {
                return ModelDescriptor::from_id(id, backend, priority);
            }
        }
        let backend = Backend::ALL
            .iter()
            .copied()
            .find(|b| self.contains(*b, entry) && *b == Backend::infer(entry))
            .or_else(|| Backend::ALL.iter().copied().find(|b| self.contains(*b, entry)))
            .unwrap_or_else(|| Backend::infer(entry));
        ModelDescriptor::from_id(entry, backend, priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists() {
        let catalog = ModelCatalog::default();
        assert_eq!(catalog.model_ids(Backend::GithubModels).len(), 38);
        let notes = catalog.candidates(Task::NotesGeneration).unwrap();
        assert_eq!(notes[0].id, "gemini-2.5-pro-latest");
        assert_eq!(notes.last().map(|d| d.id.as_str()), Some("gemini-2.0-flash-lite"));
        assert!(notes.iter().all(|d| d.backend == Backend::Gemini));
        assert!(notes.windows(2).all(|w| w[0].priority < w[1].priority));
    }

    #[test]
    fn test_empty_task_list_is_configuration_error() {
        let catalog = ModelCatalog::new().with_task(Task::Chat, vec![]);
        let err = catalog.candidates(Task::Chat).unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
        assert!(catalog.candidates(Task::TextExtraction).is_err());
    }

    #[test]
    fn test_backend_prefix_in_task_entry() {
        let catalog = ModelCatalog::new().with_task(
            Task::Chat,
            vec!["longcat/LongCat-Flash-Chat".into(), "github_models/gemini-1.5-pro".into()],
        );
        let list = catalog.candidates(Task::Chat).unwrap();
        assert_eq!(list[0].id, "LongCat-Flash-Chat");
        assert_eq!(list[0].backend, Backend::Longcat);
        assert_eq!(list[1].id, "gemini-1.5-pro");
        assert_eq!(list[1].backend, Backend::GithubModels);
    }

    #[test]
    fn test_unknown_explicit_model_is_synthesized() {
        let catalog = ModelCatalog::default();
        let d = catalog.resolve("gemini-3.0-ultra");
        assert_eq!(d.backend, Backend::Gemini);
        assert_eq!(d.priority, 0);
        assert_eq!(catalog.resolve("gpt-4o").backend, Backend::GithubModels);
    }

    #[test]
    fn test_refresh_keeps_list_when_empty() {
        let catalog = ModelCatalog::default();
        assert!(!catalog.refresh(Backend::Gemini, vec![]));
        assert_eq!(catalog.model_ids(Backend::Gemini).len(), DEFAULT_GEMINI_MODELS.len());
        assert!(catalog.refresh(Backend::Gemini, vec!["gemini-exp".into()]));
        assert_eq!(catalog.list_models(Backend::Gemini)[0].id, "gemini-exp");
    }

    #[test]
    fn test_preferred_model_goes_first() {
        let catalog = ModelCatalog::default();
        let list = catalog
            .candidates_preferring(Task::NotesGeneration, "gemini-2.5-pro-002")
            .unwrap();
        assert_eq!(list[0].id, "gemini-2.5-pro-002");
        assert_eq!(list.len(), DEFAULT_NOTES_CANDIDATES.len());
        assert_eq!(list[1].id, "gemini-2.5-pro-latest");
        assert_eq!(list[1].priority, 1);
    }

    #[test]
    fn test_prefixed_preference_does_not_repeat() {
        let catalog = ModelCatalog::new().with_task(
            Task::Chat,
            vec!["gemini-2.5-pro".into(), "longcat/LongCat-Flash-Chat".into()],
        );
        let list = catalog
            .candidates_preferring(Task::Chat, "longcat/LongCat-Flash-Chat")
            .unwrap();
        let ids: Vec<&str> = list.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["LongCat-Flash-Chat", "gemini-2.5-pro"]);
        assert_eq!(list[0].backend, Backend::Longcat);
        assert_eq!(list[1].priority, 1);
    }

    #[test]
    fn test_same_id_on_another_backend_is_distinct() {
        let catalog = ModelCatalog::new()
            .with_task(Task::Chat, vec!["gemini/gemini-1.5-pro".into()]);
        let list = catalog
            .candidates_preferring(Task::Chat, "github_models/gemini-1.5-pro")
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].backend, Backend::GithubModels);
        assert_eq!(list[1].backend, Backend::Gemini);
    }

    #[test]
    fn test_repeated_task_entries_are_collapsed() {
        let catalog = ModelCatalog::new().with_task(
            Task::Chat,
            vec!["m1".into(), "m1".into(), "m2".into(), "github_models/m1".into()],
        );
        let list = catalog.candidates(Task::Chat).unwrap();
        let ids: Vec<&str> = list.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(list[1].priority, 1);
    }
}
