//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to manage threads and accounts without asking a question.

use crate::types::{Account, ContextMode, Tier};

/// Reference to a history entry, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadRef {
    /// 1-based position in the last `/history` listing, typed as `#n`.
    Position(usize),
    /// A literal chat id.
    ChatId(String),
}

impl ThreadRef {
    fn parse(arg: &str) -> Self {
        match arg.strip_prefix('#').map(str::parse::<usize>) {
            Some(Ok(n)) if n > 0 => ThreadRef::Position(n),
            _ => ThreadRef::ChatId(arg.to_string()),
        }
    }
}

/// A parsed chat command.
///
/// These commands control the chat session and are never sent as questions.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start a new, empty conversation.
    New,

    /// List the history summaries of the active identity.
    History,

    /// Open a thread from history.
    Open(ThreadRef),

    /// Rename a thread.
    Rename(ThreadRef, String),

    /// Delete a thread (asks for confirmation).
    Delete(ThreadRef),

    /// Delete all history (asks for confirmation).
    ClearHistory,

    /// Add or refresh an account and make it active.
    Login(Account),

    /// Make a cached account active.
    Switch(String),

    /// Remove the active account.
    Logout,

    /// List cached accounts.
    Accounts,

    /// Change the tier for new questions.
    Tier(Tier),

    /// Choose whether prior turns are sent with new questions.
    Context(ContextMode),

    /// Print the active thread.
    Thread,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be asked as a question.
///
/// # Examples
///
/// ```
/// # use askstream::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/tier pro").is_some());
/// assert!(parse_command("What is a monad?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "history" | "ls" => ChatCommand::History,
        "open" => match argument {
            Some(arg) => ChatCommand::Open(ThreadRef::parse(arg)),
            None => ChatCommand::Invalid("/open requires #n or a chat id".to_string()),
        },
        "rename" => parse_rename(argument),
        "delete" | "rm" => match argument {
            Some(arg) => ChatCommand::Delete(ThreadRef::parse(arg)),
            None => ChatCommand::Invalid("/delete requires #n or a chat id".to_string()),
        },
        "clear-history" => ChatCommand::ClearHistory,
        "login" => parse_login(argument),
        "switch" => match argument {
            Some(email) => ChatCommand::Switch(email.to_string()),
            None => ChatCommand::Invalid("/switch requires an email".to_string()),
        },
        "logout" => ChatCommand::Logout,
        "accounts" => ChatCommand::Accounts,
        "tier" => match argument.map(str::parse::<Tier>) {
            Some(Ok(tier)) => ChatCommand::Tier(tier),
            _ => ChatCommand::Invalid("/tier expects 'free' or 'pro'".to_string()),
        },
        "context" => match argument.and_then(parse_on_off) {
            Some(true) => ChatCommand::Context(ContextMode::WithHistory),
            Some(false) => ChatCommand::Context(ContextMode::QuestionOnly),
            None => ChatCommand::Invalid("/context expects 'on' or 'off'".to_string()),
        },
        "thread" => ChatCommand::Thread,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_rename(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/rename requires #n or a chat id and a title".to_string());
    };
    let mut parts = arg.splitn(2, ' ');
    let target = parts.next().unwrap_or_default();
    match parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        Some(title) => ChatCommand::Rename(ThreadRef::parse(target), title.to_string()),
        None => ChatCommand::Invalid("/rename requires a new title".to_string()),
    }
}

fn parse_login(argument: Option<&str>) -> ChatCommand {
    let fields: Vec<&str> = argument.unwrap_or_default().split_whitespace().collect();
    match fields.as_slice() {
        [email, name, token] => ChatCommand::Login(Account::new(*email, *name, *token)),
        [email, name, token, pic] => {
            ChatCommand::Login(Account::new(*email, *name, *token).with_profile_pic(*pic))
        }
        _ => ChatCommand::Invalid("/login expects <email> <name> <token> [picture-url]".to_string()),
    }
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                          Start a new conversation
  /history                      List your chat threads
  /open <#n|chatId>             Open a thread from the list
  /rename <#n|chatId> <title>   Rename a thread
  /delete <#n|chatId>           Delete a thread
  /clear-history                Delete all threads
  /login <email> <name> <token> [pic]
                                Add an account and make it active
  /switch <email>               Switch to another cached account
  /logout                       Sign out of the active account
  /accounts                     List cached accounts
  /tier free|pro                Choose the answer tier
  /context on|off               Send earlier turns with each question
  /thread                       Show the current conversation
  /help                         Show this help message
  /quit                         Exit the chat
Press Ctrl+C while an answer streams to stop it."#
}
