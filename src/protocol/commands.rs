//! Module `command`
//!
//! Defines the FTP command tokenizer and the data structures used to
//! represent commands and the result of executing them.

use std::fmt;

use crate::protocol::responses::Reply;

/// Represents an FTP command parsed from the client input.
///
/// Commands that take an argument carry it verbatim; an empty argument is
/// rejected by the handler rather than by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    USER(String),         // Username for login
    PASS(String),         // Password for login
    NOOP,                 // Keep-alive
    QUIT,                 // Close the control connection
    PASV,                 // Enter passive mode
    LIST(Option<String>), // Directory listing, defaults to "."
    RETR(String),         // Retrieve/download file
    STOR(String),         // Store/upload file
    EMPTY,                // Blank line
    UNKNOWN(String),      // Unknown or unsupported verb
}

impl Command {
    /// Whether the command is refused with 530 until login completes.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Command::PASV | Command::LIST(_) | Command::RETR(_) | Command::STOR(_)
        )
    }
}

/// Renders the command for logs. Passwords are masked.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::USER(name) => write!(f, "USER {name}"),
            Command::PASS(_) => f.write_str("PASS ****"),
            Command::NOOP => f.write_str("NOOP"),
            Command::QUIT => f.write_str("QUIT"),
            Command::PASV => f.write_str("PASV"),
            Command::LIST(Some(path)) => write!(f, "LIST {path}"),
            Command::LIST(None) => f.write_str("LIST"),
            Command::RETR(path) => write!(f, "RETR {path}"),
            Command::STOR(path) => write!(f, "STOR {path}"),
            Command::EMPTY => f.write_str("<empty>"),
            Command::UNKNOWN(verb) => write!(f, "{verb} (unknown)"),
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
///
/// `reply` is the final reply line; preliminary replies (150) are written by
/// the handler itself before the transfer starts.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub reply: Option<Reply>,
}

impl CommandResult {
    pub fn success(reply: Reply) -> Self {
        Self {
            status: CommandStatus::Success,
            reply: Some(reply),
        }
    }

    pub fn failure(reason: impl Into<String>, reply: Reply) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            reply: Some(reply),
        }
    }

    pub fn close(reply: Option<Reply>) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            reply,
        }
    }
}

/// Parses a raw command line received from a client into the `Command` enum.
///
/// Trailing CR/LF is stripped, the line is split on the first space and the
/// verb is matched case-insensitively. The argument is kept as sent.
pub fn parse_command(raw: &str) -> Command {
    let line = raw.trim_end_matches(['\r', '\n']);
    let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));

    match verb.to_ascii_uppercase().as_str() {
        "USER" => Command::USER(arg.to_string()),
        "PASS" => Command::PASS(arg.to_string()),
        "NOOP" => Command::NOOP,
        "QUIT" => Command::QUIT,
        "PASV" => Command::PASV,
        "LIST" if arg.is_empty() => Command::LIST(None),
        "LIST" => Command::LIST(Some(arg.to_string())),
        "RETR" => Command::RETR(arg.to_string()),
        "STOR" => Command::STOR(arg.to_string()),
        "" => Command::EMPTY,
        other => Command::UNKNOWN(other.to_string()),
    }
}
