// Terminal chat session.
// Same flow as the web page: one Conversation held here, every line sent
// through the adapter, slash commands for the page's controls.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::adapter::ConversationAdapter;
use crate::constants::clamp_temperature;
use crate::conversation::Conversation;
use crate::persona::Mode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatSettings {
    pub mode: Mode,
    pub temperature: f32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            temperature: crate::constants::DEFAULT_TEMPERATURE,
        }
    }
}

enum Command<'a> {
    Quit,
    Reset,
    Modes,
    SetMode(&'a str),
    SetTemperature(&'a str),
    Unknown(&'a str),
    Say(&'a str),
}

fn parse_line(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Say(line.trim_end_matches(['\r', '\n']));
    };
    let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    match name {
        "quit" | "exit" => Command::Quit,
        "reset" => Command::Reset,
        "modes" => Command::Modes,
        "mode" => Command::SetMode(arg.trim()),
        "temp" | "temperature" => Command::SetTemperature(arg.trim()),
        _ => Command::Unknown(name),
    }
}

/// Runs an interactive session until `/quit` or end of input and returns
/// the conversation as it stood at the end.
///
/// Input is read asynchronously; pass `tokio::io::stdin()` wrapped in a
/// `BufReader` rather than a locked std handle.
pub async fn run_chat<R, W>(
    adapter: &ConversationAdapter,
    mut settings: ChatSettings,
    input: R,
    mut out: W,
) -> Result<Conversation>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    info!(mode = %settings.mode, temperature = settings.temperature, "Starting chat session");
    writeln!(
        out,
        "IELTS & PTE Coach. Focus mode: {}. Type /modes, /mode <name>, /temp <0.1-1.0>, /reset or /quit.",
        settings.mode
    )?;

    let mut conversation = Conversation::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Command::Quit => break,
            Command::Reset => {
                conversation.clear();
                writeln!(out, "Conversation reset.")?;
            }
            Command::Modes => {
                for mode in Mode::ALL {
                    let marker = if mode == settings.mode { "*" } else { " " };
                    writeln!(out, "{} {}", marker, mode)?;
                }
            }
            Command::SetMode(label) => {
                settings.mode = Mode::from_label(label);
                writeln!(out, "Focus mode: {}", settings.mode)?;
            }
            Command::SetTemperature(value) => match value.parse::<f32>() {
                Ok(t) => {
                    settings.temperature = clamp_temperature(t);
                    writeln!(out, "Creativity: {:.1}", settings.temperature)?;
                }
                Err(_) => writeln!(out, "Not a number: {}", value)?,
            },
            Command::Unknown(name) => writeln!(out, "Unknown command: /{}", name)?,
            Command::Say(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                let reply = adapter
                    .respond(text, &conversation, settings.mode, settings.temperature)
                    .await;
                conversation = reply.history;
                if let Some(answer) = conversation.last() {
                    writeln!(out, "Coach: {}", answer.text)?;
                }
            }
        }
        out.flush()?;
    }

    debug!(turns = conversation.len(), "Chat session finished");
    Ok(conversation)
}
