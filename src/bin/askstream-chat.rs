//! Interactive chat application for a streaming question/answer service.
//!
//! This binary provides a REPL that asks questions, streams the answers as
//! they arrive, and manages history threads and cached accounts.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! askstream-chat
//!
//! # Point at another service and ask with the pro tier
//! askstream-chat --base-url https://ask.example.com/api/v1/ --tier pro
//!
//! # Disable colors (useful for piping output)
//! askstream-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/new` - Start a new conversation
//! - `/history` - List chat threads
//! - `/login <email> <name> <token>` - Add an account
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use askstream::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use askstream::{Client, ContextMode, FileSessionStore};

/// Main entry point for the askstream-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("askstream-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    let client = Client::with_options(config.base_url.clone(), Some(config.timeout))?;
    let store = Arc::new(FileSessionStore::new(config.store_path.clone()));
    let mut session = ChatSession::open(store, Arc::new(client.clone()), &config).await?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut renderer =
        PlainTextRenderer::with_color(config.use_color).with_interrupt(interrupted.clone());
    let mut rl = DefaultEditor::new()?;

    println!("askstream chat ({})", client.base_url());
    match session.active_account() {
        Some(account) => println!("Signed in as {} <{}>", account.name, account.email),
        None => println!("Asking as a guest; /login to keep history"),
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    if !run_command(cmd, &mut session, &mut renderer, &mut rl).await {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                if let Err(err) = session.ask(line, &mut renderer).await {
                    renderer.print_error(&err.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Runs one slash command.  Returns false when the user asked to quit.
async fn run_command(
    cmd: ChatCommand,
    session: &mut ChatSession,
    renderer: &mut PlainTextRenderer,
    rl: &mut DefaultEditor,
) -> bool {
    match cmd {
        ChatCommand::Quit => return false,
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::New => {
            session.new_conversation();
            renderer.print_info("Started a new conversation.");
        }
        ChatCommand::History => {
            session.refresh_history().await;
            print_history(session);
        }
        ChatCommand::Open(thread) => {
            let result = match session.resolve(&thread) {
                Ok(chat_id) => session.open_thread(&chat_id).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => print_thread(session),
                Err(err) => renderer.print_error(&format!("Failed to open thread: {err}")),
            }
        }
        ChatCommand::Rename(thread, title) => {
            let result = match session.resolve(&thread) {
                Ok(chat_id) => session.rename_thread(&chat_id, &title).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(true) => renderer.print_info(&format!("Renamed to: {title}")),
                Ok(false) => {}
                Err(err) => renderer.print_error(&format!("Failed to rename thread: {err}")),
            }
        }
        ChatCommand::Delete(thread) => {
            let result = match session.resolve(&thread) {
                Ok(chat_id) => {
                    let mut confirm = |prompt: &str| ask_yes_no(rl, prompt);
                    session.delete_thread(&chat_id, &mut confirm).await
                }
                Err(err) => Err(err),
            };
            match result {
                Ok(true) => renderer.print_info("Thread deleted."),
                Ok(false) => {}
                Err(err) => renderer.print_error(&format!("Failed to delete thread: {err}")),
            }
        }
        ChatCommand::ClearHistory => {
            let mut confirm = |prompt: &str| ask_yes_no(rl, prompt);
            if session.clear_all_history(&mut confirm).await {
                renderer.print_info("History cleared.");
            }
        }
        ChatCommand::Login(account) => match session.login(account).await {
            Ok(()) => print_identity(session, renderer),
            Err(err) => renderer.print_error(&format!("Login failed: {err}")),
        },
        ChatCommand::Switch(email) => match session.switch_account(&email).await {
            Ok(()) => print_identity(session, renderer),
            Err(err) => renderer.print_error(&err.to_string()),
        },
        ChatCommand::Logout => match session.logout().await {
            Ok(_) => print_identity(session, renderer),
            Err(err) => renderer.print_error(&format!("Logout failed: {err}")),
        },
        ChatCommand::Accounts => print_accounts(session),
        ChatCommand::Tier(tier) => {
            session.set_tier(tier);
            renderer.print_info(&format!("Tier set to {tier}"));
        }
        ChatCommand::Context(context) => {
            session.set_context(context);
            match context {
                ContextMode::WithHistory => renderer.print_info("Earlier turns will be sent."),
                ContextMode::QuestionOnly => renderer.print_info("Only the question will be sent."),
            }
        }
        ChatCommand::Thread => print_thread(session),
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
    true
}

fn ask_yes_no(rl: &mut DefaultEditor, prompt: &str) -> bool {
    match rl.readline(&format!("{prompt} [y/N] ")) {
        Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn print_identity(session: &ChatSession, renderer: &mut PlainTextRenderer) {
    match session.active_account() {
        Some(account) => renderer.print_info(&format!("Now signed in as {}", account.email)),
        None => renderer.print_info("Signed out; asking as a guest."),
    }
}

fn print_accounts(session: &ChatSession) {
    let identity = session.identity();
    match identity.active() {
        Some(active) => println!("    * {} ({})", active.email, active.name),
        None => println!("    (guest)"),
    }
    for account in identity.other_accounts() {
        println!("      {} ({})", account.email, account.name);
    }
}

fn print_history(session: &ChatSession) {
    let summaries = session.summaries();
    if summaries.is_empty() {
        println!("    (no history)");
        return;
    }
    for (i, summary) in summaries.iter().enumerate() {
        let marker = if summary.chat_id().is_some() && summary.chat_id() == session.chat_id() {
            '*'
        } else {
            ' '
        };
        println!("  {marker} {:>4} {}", format!("#{}", i + 1), summary.display_question);
    }
}

fn print_thread(session: &ChatSession) {
    let thread = session.thread();
    if thread.is_empty() {
        println!("    (empty conversation)");
        return;
    }
    for (index, message) in thread.messages().iter().enumerate() {
        println!("You: {}", message.question);
        let answer = session.engine().answer_view(index);
        if message.is_pending() {
            if !answer.is_empty() {
                println!("    {answer}");
            }
        } else {
            println!("{answer}\n");
        }
    }
}
