//! Interactive command-line client for the chat relay
//!
//! Sends each typed line to `<base>/chat` and prints the reply. `--test-mode`
//! sends one fixed message and reports success through the exit status.

use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_MESSAGE_LENGTH: usize = 1000;
const TEST_MESSAGE: &str = "Hello, this is a test message";
const FAREWELL: &str = "Goodbye!";

// ============================================================
// Arguments and commands
// ============================================================

#[derive(Debug, PartialEq, Eq)]
struct Args {
    test_mode: bool,
    api_url: String,
}

fn parse_args<I>(args: I, default_url: String) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args {
        test_mode: false,
        api_url: default_url,
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--test-mode" => parsed.test_mode = true,
            "--url" => {
                parsed.api_url = args
                    .next()
                    .ok_or_else(|| "--url requires a value".to_string())?;
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    Ok(parsed)
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Exit,
    Help,
    Clear,
    NewSession,
    Empty,
    TooLong(usize),
    Message(String),
}

fn parse_command(line: &str) -> Command {
    let input = line.trim();
    match input.to_lowercase().as_str() {
        "exit" => Command::Exit,
        "help" => Command::Help,
        "clear" => Command::Clear,
        "new" => Command::NewSession,
        "" => Command::Empty,
        _ => {
            let len = input.chars().count();
            if len > MAX_MESSAGE_LENGTH {
                Command::TooLong(len)
            } else {
                Command::Message(input.to_string())
            }
        }
    }
}

// ============================================================
// HTTP client
// ============================================================

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: Option<String>,
}

/// Result of sending one message
#[derive(Debug, PartialEq, Eq)]
enum SendOutcome {
    Answered(String),
    NoResponse,
    HttpError { status: u16, body: String },
    TimedOut,
    ConnectionFailed,
    Failed(String),
}

impl SendOutcome {
    fn is_success(&self) -> bool {
        matches!(self, SendOutcome::Answered(_))
    }

    fn render(&self) -> String {
        match self {
            SendOutcome::Answered(text) => text.clone(),
            SendOutcome::NoResponse => "No response received".to_string(),
            SendOutcome::HttpError { status, body } => format!("Error: {status} - {body}"),
            SendOutcome::TimedOut => "Request timed out. Please try again.".to_string(),
            SendOutcome::ConnectionFailed => {
                "Connection error. Please check your internet connection.".to_string()
            }
            SendOutcome::Failed(msg) => format!("Unexpected error: {msg}"),
        }
    }
}

struct ChatClient {
    agent: ureq::Agent,
    chat_url: String,
    session_id: String,
}

impl ChatClient {
    fn new(api_url: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            chat_url: format!("{}/chat", api_url.trim_end_matches('/')),
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    fn short_session(&self) -> &str {
        self.session_id.get(..8).unwrap_or(&self.session_id)
    }

    fn new_session(&mut self) {
        self.session_id = uuid::Uuid::new_v4().to_string();
    }

    fn send(&self, message: &str) -> SendOutcome {
        tracing::debug!(url = %self.chat_url, session_id = %self.session_id, "Sending message");
        let result = self
            .agent
            .post(&self.chat_url)
            .set("Content-Type", "application/json")
            .send_json(serde_json::json!({
                "message": message,
                "session_id": self.session_id,
            }));

        match result {
            Ok(response) if response.status() == 200 => match response.into_json::<ChatReply>() {
                Ok(ChatReply {
                    response: Some(text),
                }) => SendOutcome::Answered(text),
                Ok(ChatReply { response: None }) => SendOutcome::NoResponse,
                Err(e) => SendOutcome::Failed(format!("Invalid response body: {e}")),
            },
            Ok(response) => {
                let status = response.status();
                SendOutcome::HttpError {
                    status,
                    body: response.into_string().unwrap_or_default(),
                }
            }
            Err(ureq::Error::Status(status, response)) => SendOutcome::HttpError {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            Err(ureq::Error::Transport(transport)) => classify_transport(&transport),
        }
    }
}

fn classify_transport(transport: &ureq::Transport) -> SendOutcome {
    match transport.kind() {
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed => SendOutcome::ConnectionFailed,
        ureq::ErrorKind::Io if transport.to_string().contains("timed out") => SendOutcome::TimedOut,
        _ => SendOutcome::Failed(transport.to_string()),
    }
}

// ============================================================
// Modes
// ============================================================

fn show_help() {
    println!("\nAvailable commands:");
    println!("  help  - Show this help message");
    println!("  clear - Clear the screen");
    println!("  new   - Start a new session");
    println!("  exit  - Exit the application");
    println!();
}

fn clear_screen() {
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)) {
        tracing::warn!(error = %e, "Failed to clear screen");
    }
}

fn run_interactive(mut client: ChatClient) {
    println!("ChatBot CLI");
    println!("{}", "=".repeat(40));
    println!("Type 'exit' to quit, 'help' for commands");
    println!("Session ID: {}...", client.short_session());
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                println!("Error: {e}");
                continue;
            }
            // EOF (Ctrl-D)
            None => {
                println!("\n{FAREWELL}");
                break;
            }
        };

        match parse_command(&line) {
            Command::Exit => {
                println!("{FAREWELL}");
                break;
            }
            Command::Help => show_help(),
            Command::Clear => clear_screen(),
            Command::NewSession => {
                client.new_session();
                println!("Started new session: {}...", client.short_session());
                println!();
            }
            Command::Empty => println!("Please enter a message."),
            Command::TooLong(len) => println!(
                "Message too long ({len} characters, max {MAX_MESSAGE_LENGTH})."
            ),
            Command::Message(message) => {
                println!("Thinking...");
                let outcome = client.send(&message);
                println!("Bot: {}", outcome.render());
                println!();
            }
        }
    }
}

/// Print the farewell on its own line after an interrupted prompt.
fn write_interrupt_farewell(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n{FAREWELL}")?;
    out.flush()
}

fn run_test_mode(client: &ChatClient) -> ExitCode {
    let outcome = client.send(TEST_MESSAGE);
    if outcome.is_success() {
        println!("CLI test passed");
        ExitCode::SUCCESS
    } else {
        println!("CLI test failed: {}", outcome.render());
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay_cli=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let default_url = std::env::var("API_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let args = match parse_args(std::env::args().skip(1), default_url) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: chat-relay-cli [--test-mode] [--url <base-url>]");
            return ExitCode::FAILURE;
        }
    };

    let client = ChatClient::new(&args.api_url);
    if args.test_mode {
        run_test_mode(&client)
    } else {
        if let Err(e) = ctrlc::set_handler(|| {
            let _ = write_interrupt_farewell(&mut io::stdout());
            std::process::exit(0);
        }) {
            tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        }
        run_interactive(client);
        ExitCode::SUCCESS
    }
}
