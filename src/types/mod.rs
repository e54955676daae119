//! 类型模块：会话消息、附件、上下文笔记与任务类型。
//!
//! # Types Module
//!
//! Plain data shared by the request builder, the adapters and the session store.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConversationTurn`] | One chat turn with role, text and attachments |
//! | [`Role`] | user, assistant or system |
//! | [`Attachment`] | Uploaded bytes with declared MIME type |
//! | [`ContextNote`] | Titled note prepended to a chat message |
//! | [`Task`] | text-extraction, notes-generation or chat |

pub mod attachment;
pub mod message;
pub mod task;

pub use attachment::Attachment;
pub use message::{ContextNote, ConversationTurn, Role};
pub use task::Task;
