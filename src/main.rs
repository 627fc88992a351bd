use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use ielts_coach::chat::{self, ChatSettings};
use ielts_coach::config::{ApiArgs, CoachConfig};
use ielts_coach::constants::{self, clamp_temperature};
use ielts_coach::web_server::{self, AppState};
use ielts_coach::{CompletionClient, ConversationAdapter, Mode};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    api: ApiArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct PersonaArgs {
    /// Focus mode, e.g. "Writing Task" or "speaking". Unknown names mean General Help.
    #[arg(long, default_value = "General Help", value_parser = parse_mode_arg)]
    mode: Mode,
    /// Sampling temperature, clamped to 0.1..=1.0.
    #[arg(long, default_value_t = constants::DEFAULT_TEMPERATURE)]
    temperature: f32,
}

// Command-line shorthand on top of the exact labels the registry accepts.
fn parse_mode_arg(value: &str) -> Result<Mode, Infallible> {
    let wanted = value.trim();
    if let Some(mode) = Mode::ALL
        .into_iter()
        .find(|mode| mode.label().eq_ignore_ascii_case(wanted))
    {
        return Ok(mode);
    }
    Ok(match wanted.to_ascii_lowercase().as_str() {
        "writing" => Mode::WritingTask,
        "speaking" => Mode::SpeakingPractice,
        "reading" | "listening" => Mode::ReadingListening,
        _ => Mode::default(),
    })
}

impl From<PersonaArgs> for ChatSettings {
    fn from(args: PersonaArgs) -> Self {
        ChatSettings {
            mode: args.mode,
            temperature: clamp_temperature(args.temperature),
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the chat page and its JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1", help = "Address to bind.")]
        host: IpAddr,
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
    },
    /// Chat with the coach in the terminal.
    Chat {
        #[command(flatten)]
        persona: PersonaArgs,
    },
    /// Ask a single question and print the reply.
    Ask {
        message: String,
        #[command(flatten)]
        persona: PersonaArgs,
    },
    /// List the available focus modes.
    Modes,
}

fn build_adapter(api: ApiArgs) -> Result<ConversationAdapter> {
    let config = CoachConfig::from(api);
    info!(?config, "Using completion endpoint");
    let client = CompletionClient::new(config).context("Failed to create completion client")?;
    Ok(ConversationAdapter::new(Arc::new(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for GROQ_API_KEY and friends)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,ielts_coach=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            let adapter = build_adapter(cli.api)?;
            let state = AppState::new(adapter)?;
            let addr = SocketAddr::new(host, port);

            let mut server = tokio::spawn(web_server::start_web_server(addr, state));

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down...");
                    server.abort();
                }
                res = &mut server => {
                    match res {
                        Ok(Ok(())) => info!("Web server task completed unexpectedly."),
                        Ok(Err(e)) => {
                            error!("Web server failed: {:?}", e);
                            return Err(e);
                        }
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { persona } => {
            let adapter = build_adapter(cli.api)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let conversation = chat::run_chat(&adapter, persona.into(), stdin, std::io::stdout())
                .await
                .context("Chat session failed")?;
            info!(turns = conversation.len(), "Chat session finished.");
        }
        Commands::Ask { message, persona } => {
            let adapter = build_adapter(cli.api)?;
            let settings = ChatSettings::from(persona);
            let reply = adapter
                .respond(&message, &[], settings.mode, settings.temperature)
                .await;
            if let Some(text) = reply.latest_reply() {
                println!("{}", text);
            }
            if let Some(kind) = reply.failure {
                bail!("completion failed ({:?})", kind);
            }
        }
        Commands::Modes => {
            for mode in Mode::ALL {
                println!("{}", mode);
            }
        }
    }

    Ok(())
}
