//! Terminal client for the roundtable discussion platform.
//!
//! Lists and creates chatrooms through the Directory Service and opens a
//! live discussion view over the chatroom's WebSocket. Inside a view, type
//! `start [seed]`, `continue`, `stop`, or `quit`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin roundtable -- list
//! cargo run --bin roundtable -- open <chatroom-id>
//! ```

use std::io::Write;

use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use roundtable_client::connection::SocketEvent;
use roundtable_client::directory::{Directory, DirectoryClient};
use roundtable_client::display::MessageFormatter;
use roundtable_client::error::ClientError;
use roundtable_client::logger::setup_logger;
use roundtable_client::session::{SessionManager, UiEvent};

const PROMPT: &str = "roundtable> ";

#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(about = "Terminal client for multi-agent roundtable discussions", long_about = None)]
struct Args {
    /// Directory Service base URL
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List chatrooms
    List,
    /// Create a chatroom
    Create {
        /// Discussion topic
        #[arg(short, long)]
        topic: String,
        /// Participating agent ids
        #[arg(short, long, required = true)]
        agents: Vec<String>,
    },
    /// Open a chatroom and watch the live discussion
    Open {
        /// Chatroom id
        chatroom_id: String,
    },
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let result = match args.command {
        CliCommand::List => list_chatrooms(&args.base_url).await,
        CliCommand::Create { topic, agents } => {
            create_chatroom(&args.base_url, &topic, &agents).await
        }
        CliCommand::Open { chatroom_id } => watch_chatroom(&args.base_url, &chatroom_id).await,
    };

    if let Err(e) = result {
        tracing::error!("client error: {}", e);
        std::process::exit(1);
    }
}

async fn list_chatrooms(base_url: &str) -> Result<(), ClientError> {
    let directory = DirectoryClient::new(base_url);
    let rooms = directory.list_chatrooms().await?;
    if rooms.is_empty() {
        println!("No chatrooms yet.");
        return Ok(());
    }
    for room in rooms {
        println!(
            "{}  [{}]  {} ({} agents)",
            room.id,
            room.status,
            MessageFormatter::display_topic(&room.topic),
            room.agent_count
        );
    }
    Ok(())
}

async fn create_chatroom(
    base_url: &str,
    topic: &str,
    agents: &[String],
) -> Result<(), ClientError> {
    let directory = DirectoryClient::new(base_url);
    let room = directory.create_chatroom(topic, agents).await?;
    println!(
        "Created chatroom {} ({})",
        room.id,
        MessageFormatter::display_topic(&room.topic)
    );
    Ok(())
}

/// One turn of the watch loop: either a socket event or a typed line
enum LoopInput {
    Socket(SocketEvent),
    Line(String),
    Done,
}

async fn watch_chatroom(base_url: &str, chatroom_id: &str) -> Result<(), ClientError> {
    let directory = DirectoryClient::new(base_url);
    let mut manager = SessionManager::with_system_clock(directory);

    let events = manager.open_chatroom(chatroom_id).await?;
    if let Some(session) = manager.session() {
        print!(
            "{}",
            MessageFormatter::format_room_header(
                &session.topic,
                &session.status,
                &session.participants
            )
        );
    }
    render_all(&events);

    // Spawn a blocking thread for rustyline (synchronous readline)
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    loop {
        let input = tokio::select! {
            event = manager.next_socket_event() => match event {
                Some(event) => LoopInput::Socket(event),
                None => LoopInput::Done,
            },
            line = input_rx.recv() => match line {
                Some(line) => LoopInput::Line(line),
                None => LoopInput::Done,
            },
        };

        match input {
            LoopInput::Socket(event) => {
                let events = manager.handle_socket_event(event);
                render_all(&events);
            }
            LoopInput::Line(line) => {
                let events = match line.as_str() {
                    "start" => manager.start(None).await?,
                    command if command.starts_with("start ") => {
                        manager
                            .start(Some(command["start ".len()..].to_string()))
                            .await?
                    }
                    "continue" => manager.continue_discussion().await?,
                    "stop" => manager.stop().await?,
                    "quit" | "exit" => break,
                    _ => {
                        println!("commands: start [seed], continue, stop, quit");
                        redisplay_prompt();
                        continue;
                    }
                };
                render_all(&events);
            }
            LoopInput::Done => break,
        }
    }

    let events = manager.close();
    render_all(&events);
    Ok(())
}

fn render_all(events: &[UiEvent]) {
    if events.is_empty() {
        return;
    }
    for event in events {
        render(event);
    }
    redisplay_prompt();
}

fn render(event: &UiEvent) {
    match event {
        UiEvent::StatusChanged { status, controls } => {
            print!(
                "{}",
                MessageFormatter::format_status_change(status, controls)
            );
        }
        UiEvent::MessageAppended(message) => {
            print!("{}", MessageFormatter::format_message(message));
        }
        UiEvent::SessionClosed => {
            println!("\n(session closed)");
        }
        UiEvent::Notice { severity, text } => {
            print!("{}", MessageFormatter::format_notice(*severity, text));
        }
    }
}

/// Redisplay the prompt after asynchronous output
fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
