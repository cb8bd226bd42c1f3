//! DebateView CLI - Streamed AI Debate Viewer
//!
//! A terminal client for a debate server: starts a session, renders each
//! turn as it streams in, and advances turns automatically or on Enter.

use clap::Parser;
use colored::{ColoredString, Colorize};
use debateview_core::{
    export, Command, Config, ControllerOptions, DebateApi, DebateController, HttpDebateApi, Role,
    ViewEvent,
};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "debateview",
    version,
    about = "Watch AI debates stream in from a debate server",
    long_about = "A terminal client that streams a moderated AI debate turn by turn, \
                  either automatically or advancing on Enter."
)]
struct Cli {
    /// The topic to debate
    #[arg(value_name = "TOPIC")]
    topic: Option<String>,

    /// Model name (defaults to the first model the server advertises)
    #[arg(short, long, value_name = "MODEL")]
    model: Option<String>,

    /// Model provider
    #[arg(short, long, default_value = "ollama", value_name = "PROVIDER")]
    provider: String,

    /// Debate server base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Wait for Enter between turns instead of auto-playing
    #[arg(long)]
    manual: bool,

    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List the models the server advertises and exit
    #[arg(long)]
    list_models: bool,

    /// Save the transcript to this markdown file when the debate ends
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Print a previously saved transcript and exit
    #[arg(long, value_name = "FILE")]
    load: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Replaying a saved transcript needs no server at all.
    if let Some(path) = &cli.load {
        let content = std::fs::read_to_string(path)?;
        let imported = export::from_markdown(&content);
        if let Some(topic) = &imported.topic {
            println!("{} {}", "Topic:".bold(), topic.bright_white());
        }
        for message in imported.transcript.messages() {
            println!();
            println!("{}", role_heading(message.role));
            println!("{}", format_content(&message.content));
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let server_url = cli.server.unwrap_or(config.server.url);
    let api = HttpDebateApi::new(&server_url)?;

    if cli.list_models {
        for model in api.fetch_models().await? {
            println!("{} {}", model.name.bright_cyan(), format!("({})", model.provider).dimmed());
        }
        return Ok(());
    }

    let topic = match cli.topic {
        Some(topic) => topic,
        None => {
            eprintln!("{} No topic given.", "Error:".red().bold());
            eprintln!("Usage: debateview \"<topic>\" [-m model] [-p provider]");
            std::process::exit(1);
        }
    };

    let (model, provider) = match cli.model {
        Some(model) => (model, cli.provider),
        None => {
            let models = api.fetch_models().await?;
            match models.into_iter().next() {
                Some(model) => {
                    println!(
                        "{}",
                        format!("No model given; using {} ({})", model.name, model.provider)
                            .dimmed()
                    );
                    (model.name, model.provider)
                }
                None => {
                    eprintln!(
                        "{} The server advertises no models. Pass one with --model.",
                        "Error:".red().bold()
                    );
                    std::process::exit(1);
                }
            }
        }
    };

    let credential = env::var("GOOGLE_API_KEY").ok().filter(|key| !key.is_empty());
    if provider == "google" && credential.is_none() {
        eprintln!(
            "{}",
            "Warning: GOOGLE_API_KEY not set. The server may reject the session.".yellow()
        );
    }

    let auto_play = !cli.manual && config.playback.auto_play;

    // Print header
    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!("{}", format!("  {}", "DebateView".bold()).bright_blue().bold());
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!("{} {}", "Topic:".bold(), topic.bright_white());
    println!(
        "{} {} {}",
        "Model:".bold(),
        model.bright_cyan(),
        format!("({})", provider).dimmed()
    );
    if auto_play {
        println!("{} auto-play", "Mode:".bold());
    } else {
        println!(
            "{} manual {}",
            "Mode:".bold(),
            "([Enter] next turn · [a] auto-play · [q] quit)".dimmed()
        );
    }
    println!("{}", "─".repeat(70).dimmed());

    let (tx, rx) = mpsc::unbounded_channel();

    // Keyboard loop: Enter advances, 'a' toggles auto-play, 'q' stops.
    let stdin_tx = tx.clone();
    let mut shadow_auto = auto_play;
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.trim() {
                "" => {
                    let _ = stdin_tx.send(Command::Advance);
                }
                "a" => {
                    shadow_auto = !shadow_auto;
                    let _ = stdin_tx.send(Command::SetAutoPlay(shadow_auto));
                }
                "q" | "quit" => {
                    let _ = stdin_tx.send(Command::Stop);
                    break;
                }
                _ => {}
            }
        }
    });

    let ctrlc_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrlc_tx.send(Command::Stop);
        }
    });

    let options = ControllerOptions {
        auto_play,
        turn_delay: config.playback.turn_delay(),
    };
    let mut controller = DebateController::new(Box::new(api.clone()), options)
        .with_callback(create_console_callback());

    if let Err(e) = controller.start(&topic, &model, &provider, credential).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    controller.run(rx).await;

    println!();
    println!("{}", "═".repeat(70).bright_blue());

    if let Some(path) = &cli.save {
        let messages = controller.transcript().messages();
        if messages.is_empty() {
            eprintln!("{}", "Nothing to save; transcript is empty.".yellow());
        } else {
            std::fs::write(path, export::to_markdown(&topic, messages))?;
            println!("{} {}", "Transcript saved to".bold(), path.display());
        }
    }

    Ok(())
}

/// Create a callback that renders view events to the console as they
/// arrive, printing token fragments incrementally.
fn create_console_callback() -> Box<dyn Fn(ViewEvent) + Send + Sync> {
    Box::new(move |event| match event {
        ViewEvent::Thinking => {
            print!("{}", "  … thinking".dimmed());
            let _ = std::io::stdout().flush();
        }
        ViewEvent::ThinkingCleared => {
            print!("\r{}\r", " ".repeat(16));
            let _ = std::io::stdout().flush();
        }
        ViewEvent::MessageStarted { role, .. } => {
            println!();
            println!("{}", role_heading(role));
        }
        ViewEvent::MessageDelta { fragment, .. } => {
            print!("{}", format_content(&fragment));
            let _ = std::io::stdout().flush();
        }
        ViewEvent::TurnEnded { .. } => {}
        ViewEvent::AwaitingAdvance => {
            println!();
            println!();
            println!(
                "{}",
                "[Enter] next turn · [a] auto-play · [q] quit".dimmed()
            );
        }
        ViewEvent::DebateEnded => {
            println!();
            println!();
            println!("{}", "  Debate concluded.".bright_green().bold());
        }
        ViewEvent::Notice(text) => {
            println!();
            println!("{}", text.yellow());
        }
    })
}

fn role_heading(role: Role) -> ColoredString {
    let heading = format!("▶ {}", role.display_name());
    match role {
        Role::Moderator => heading.bright_yellow().bold(),
        Role::Proponent => heading.bright_green().bold(),
        Role::Opponent => heading.bright_red().bold(),
    }
}

/// Render `**bold**` spans as terminal bold. Pure transform applied at
/// render time; assembled transcript content is never mutated.
fn format_content(text: &str) -> String {
    let parts: Vec<&str> = text.split("**").collect();
    let balanced = parts.len() % 2 == 1;
    let mut output = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 1 {
            if balanced || i + 1 < parts.len() {
                output.push_str(&part.bold().to_string());
            } else {
                // Unpaired trailing marker; keep it literal.
                output.push_str("**");
                output.push_str(part);
            }
        } else {
            output.push_str(part);
        }
    }
    output
}
