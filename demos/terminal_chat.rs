//! Terminal chat client.
//!
//! Reads a display name, joins a room and relays stdin lines as chat
//! messages. History and status lines are printed as they arrive.
//!
//! Usage:
//!
//! ```text
//! cargo run --example terminal_chat -- [--endpoint host:port] [--room name] [--debug]
//! ```
//!
//! Commands: `/join` rejoins with a new name, `/quit` leaves.

// ============================================================================
// Imports
// ============================================================================

use simplechat_client::{ChatSession, Endpoint, EntryKind, Health, RenderCommand, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    endpoint: Option<String>,
    room: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            endpoint: value_of("--endpoint"),
            room: value_of("--room"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "simplechat_client=debug"
    } else {
        "simplechat_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Print render commands until the session is dropped.
async fn render(mut commands: mpsc::UnboundedReceiver<RenderCommand>) {
    while let Some(command) = commands.recv().await {
        match command {
            RenderCommand::Append(entry) => {
                let marker = match entry.kind() {
                    EntryKind::System => "*",
                    EntryKind::Peer | EntryKind::Own => ">",
                    EntryKind::Error => "!",
                };
                println!("{marker} [{}] {}", entry.label(), entry.text());
            }
            RenderCommand::Status(update) => {
                let light = match update.health {
                    Health::Ok => "+",
                    Health::Bad => "-",
                    Health::Idle => "~",
                };
                println!("({light}) {}", update.text);
            }
        }
    }
}

/// Prompt for a name and join until it succeeds or stdin ends.
async fn join_loop(
    session: &ChatSession,
    room: &str,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    loop {
        println!("Your name:");
        let Some(name) = input.next_line().await? else {
            return Ok(false);
        };

        match session.join(&name, room).await {
            Ok(()) => return Ok(true),
            Err(e) if e.is_recoverable() => println!("{}", e.hint()),
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let endpoint: Endpoint = match args.endpoint.as_deref() {
        Some(address) => address.parse()?,
        None => Endpoint::default(),
    };

    let (sink, commands) = mpsc::unbounded_channel();
    tokio::spawn(render(commands));

    let mut builder = ChatSession::builder().endpoint(endpoint).sink(sink);
    if let Some(room) = args.room {
        builder = builder.room(room);
    }
    let session = builder.build()?;
    let room = session.options().room.clone();

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if !join_loop(&session, &room, &mut input).await? {
        return Ok(());
    }

    while let Some(line) = input.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/join" => {
                if !join_loop(&session, &room, &mut input).await? {
                    break;
                }
            }
            text => {
                // Refusals already show up as a history entry.
                let _ = session.send_text(text);
            }
        }
    }

    session.leave();
    Ok(())
}
