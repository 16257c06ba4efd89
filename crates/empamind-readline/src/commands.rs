//! Slash-command parsing for the REPL.

use empamind_core::conversation::ResponseFormat;
use std::path::PathBuf;

/// Slash commands with a one-line description, in help order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/new", "Start a new chat"),
    ("/chats", "List your chats"),
    ("/select", "<chat-id>  Open a chat and load its history"),
    ("/rename", "<chat-id> <title>  Rename a chat"),
    ("/delete", "<chat-id>  Delete a chat"),
    ("/voice", "<file> [text|voice]  Send a recorded voice message"),
    ("/clear", "Clear the messages of the current chat"),
    ("/logout", "Sign out and start over"),
    ("/help", "Show this help"),
    ("/quit", "Exit"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    NewChat,
    ListChats,
    Select(String),
    Rename { chat_id: String, title: String },
    Delete(String),
    Voice {
        path: PathBuf,
        response_format: ResponseFormat,
    },
    Clear,
    Logout,
    Help,
    Quit,
}

/// Parses one input line. Returns `None` for blank lines and `Err` with a
/// usage hint for malformed commands.
pub fn parse(line: &str) -> Option<Result<Command, String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(Ok(Command::Send(line.to_string())));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "/new" => Ok(Command::NewChat),
        "/chats" => Ok(Command::ListChats),
        "/select" => single_arg(rest, "/select <chat-id>").map(Command::Select),
        "/delete" => single_arg(rest, "/delete <chat-id>").map(Command::Delete),
        "/rename" => match rest.split_once(char::is_whitespace) {
            Some((chat_id, title)) if !title.trim().is_empty() => Ok(Command::Rename {
                chat_id: chat_id.to_string(),
                title: title.trim().to_string(),
            }),
            _ => Err("Usage: /rename <chat-id> <title>".to_string()),
        },
        "/voice" => parse_voice(rest),
        "/clear" => Ok(Command::Clear),
        "/logout" => Ok(Command::Logout),
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command: {other}. Type /help for a list.")),
    };
    Some(command)
}

fn single_arg(rest: &str, usage: &str) -> Result<String, String> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [arg] => Ok((*arg).to_string()),
        _ => Err(format!("Usage: {usage}")),
    }
}

fn parse_voice(rest: &str) -> Result<Command, String> {
    const USAGE: &str = "Usage: /voice <file> [text|voice]";
    let mut args = rest.split_whitespace();
    let path = args.next().ok_or_else(|| USAGE.to_string())?;
    let response_format = match args.next() {
        Some(format) => format.parse::<ResponseFormat>()?,
        None => ResponseFormat::Voice,
    };
    if args.next().is_some() {
        return Err(USAGE.to_string());
    }
    Ok(Command::Voice {
        path: PathBuf::from(path),
        response_format,
    })
}
