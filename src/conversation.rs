use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn role(self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(rename = "role")]
    pub speaker: Speaker,
    #[serde(rename = "content")]
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Chronological turns of one chat session, owned by whoever renders it.
pub type Conversation = Vec<Turn>;

/// A history entry as received from a client.
///
/// Clients send either role/content records or legacy `[user, assistant]`
/// pairs where either side may be null. Anything else lands in `Other` so one
/// odd entry cannot reject the whole request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    // Listed first: untagged structs also accept sequences.
    LegacyPair(Option<String>, Option<String>),
    Structured {
        role: String,
        #[serde(default)]
        content: Option<String>,
    },
    Other(serde_json::Value),
}

/// Flattens client history into turns. Unknown roles, unrecognised entries
/// and absent or empty legacy sides are dropped.
pub fn normalize_history<I>(entries: I) -> Conversation
where
    I: IntoIterator<Item = HistoryEntry>,
{
    let mut turns = Vec::new();
    for entry in entries {
        match entry {
            HistoryEntry::Structured { role, content } => {
                let Some(text) = content else { continue };
                match role.as_str() {
                    "user" => turns.push(Turn::user(text)),
                    "assistant" => turns.push(Turn::assistant(text)),
                    _ => {}
                }
            }
            HistoryEntry::LegacyPair(user, assistant) => {
                if let Some(text) = user.filter(|t| !t.is_empty()) {
                    turns.push(Turn::user(text));
                }
                if let Some(text) = assistant.filter(|t| !t.is_empty()) {
                    turns.push(Turn::assistant(text));
                }
            }
            HistoryEntry::Other(value) => {
                debug!(entry = %value, "Skipping unrecognised history entry");
            }
        }
    }
    turns
}

/// One role-tagged message on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> From<&'a Turn> for ChatMessage<'a> {
    fn from(turn: &'a Turn) -> Self {
        Self {
            role: turn.speaker.role(),
            content: &turn.text,
        }
    }
}
