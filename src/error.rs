use serde::Serialize;
use thiserror::Error;

/// Why a completion call produced no reply.
///
/// The `Display` text is what the chat transcript shows in place of the
/// assistant's answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("Request timed out. Please try again.")]
    Timeout,
    #[error("An error occurred: {0}")]
    Transport(String),
    #[error("Error {status}: {body}")]
    Remote { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Transport,
    Remote,
}

impl CompletionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompletionError::Timeout => FailureKind::Timeout,
            CompletionError::Transport(_) => FailureKind::Transport,
            CompletionError::Remote { .. } => FailureKind::Remote,
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Transport(describe_chain(&err))
        }
    }
}

// reqwest's own Display stops at the outermost layer; the cause (refused
// connection, DNS failure, TLS) is only reachable through `source()`.
fn describe_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
