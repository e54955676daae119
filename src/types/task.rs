use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a generation request performs. Each task has its own
/// candidate list and system instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    TextExtraction,
    NotesGeneration,
    Chat,
}

impl Task {
    pub const ALL: [Task; 3] = [Task::TextExtraction, Task::NotesGeneration, Task::Chat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::TextExtraction => "text-extraction",
            Task::NotesGeneration => "notes-generation",
            Task::Chat => "chat",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
