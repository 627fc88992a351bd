use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::completion::{CompletionBackend, CompletionRequest};
use crate::conversation::{Conversation, Speaker, Turn};
use crate::error::FailureKind;
use crate::persona::{instruction_for, Mode};

/// Outcome of one [`ConversationAdapter::respond`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The caller's history extended with the new exchange.
    pub history: Conversation,
    /// New value for the input box; always cleared.
    pub input: String,
    /// Set when the assistant turn holds an error message instead of an answer.
    pub failure: Option<FailureKind>,
}

impl Reply {
    /// Text of the most recent assistant turn.
    pub fn latest_reply(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|turn| turn.speaker == Speaker::Assistant)
            .map(|turn| turn.text.as_str())
    }
}

/// Turns a conversation plus a new message into one completion call.
///
/// Holds no conversation state of its own; callers that allow overlapping
/// submissions must serialize them to keep appends in order.
#[derive(Clone)]
pub struct ConversationAdapter {
    backend: Arc<dyn CompletionBackend>,
}

impl ConversationAdapter {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, user_text, history, mode), fields(mode = %mode, turns = history.len()))]
    pub async fn respond(&self, user_text: &str, history: &[Turn], mode: Mode, temperature: f32) -> Reply {
        if user_text.trim().is_empty() {
            return Reply {
                history: history.to_vec(),
                input: String::new(),
                failure: None,
            };
        }

        let mut turns = history.to_vec();
        turns.push(Turn::user(user_text));
        let request = CompletionRequest {
            instruction: instruction_for(mode).to_string(),
            turns,
            temperature,
        };

        let (reply, failure) = match self.backend.complete(&request).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "Completion failed; showing error inline");
                (e.to_string(), Some(e.kind()))
            }
        };

        let mut updated = request.turns;
        updated.push(Turn::assistant(reply));
        info!(turns = updated.len(), failed = failure.is_some(), "Conversation updated");

        Reply {
            history: updated,
            input: String::new(),
            failure,
        }
    }
}
