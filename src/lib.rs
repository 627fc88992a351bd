pub mod adapter;
pub mod chat;
pub mod completion;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod error;
pub mod persona;
pub mod web_server;

pub use adapter::{ConversationAdapter, Reply};
pub use completion::{CompletionBackend, CompletionClient, CompletionRequest};
pub use config::CoachConfig;
pub use conversation::{Conversation, HistoryEntry, Speaker, Turn};
pub use error::{CompletionError, FailureKind};
pub use persona::{instruction_for, instruction_for_label, Mode};
