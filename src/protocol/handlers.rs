//! Command handlers module for the Rax FTP server.
//!
//! This module defines handler functions for FTP commands: login, passive
//! data connection setup and the LIST/RETR/STOR transfers that use it.
//! Handlers only touch their own `Session`; the reply they return is written
//! by the control loop.

use std::io;
use std::net::SocketAddr;

use log::debug;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::client::Session;
use crate::error::{PathError, TransferError};
use crate::protocol::responses::*;
use crate::protocol::{Command, CommandResult};
use crate::storage::list_directory;
use crate::transfer::{DataConnection, DataStream, PartialUpload, send_file, send_listing};

/// Writes one reply line on the control connection and flushes it.
pub async fn write_reply<W>(control: &mut W, reply: &Reply) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    control.write_all(reply.to_string().as_bytes()).await?;
    control.flush().await
}

/// Dispatches a received FTP command to its corresponding handler.
///
/// # Arguments
///
/// * `session` - The session the command arrived on.
/// * `command` - Reference to the parsed FTP command enum.
/// * `control` - Control connection writer, used for the preliminary 150 of
///   data commands.
///
/// # Returns
///
/// * `CommandResult` - Result of the command execution, including the final reply.
pub async fn handle_command<W>(
    session: &mut Session,
    command: &Command,
    control: &mut W,
) -> CommandResult
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if command.requires_auth() && !session.is_authenticated() {
        return CommandResult::failure("not logged in", Reply::new(AUTH_FAILED, "Not logged in"));
    }

    match command {
        Command::USER(username) => handle_cmd_user(session, username),
        Command::PASS(password) => handle_cmd_pass(session, password),
        Command::NOOP => CommandResult::success(Reply::new(OK, "NOOP ok")),
        Command::QUIT => handle_cmd_quit(session),
        Command::PASV => handle_cmd_pasv(session),
        Command::LIST(path) => {
            handle_cmd_list(session, path.as_deref().unwrap_or("."), control).await
        }
        Command::RETR(path) => handle_cmd_retr(session, path, control).await,
        Command::STOR(path) => handle_cmd_stor(session, path, control).await,
        Command::EMPTY => CommandResult::failure(
            "empty command line",
            Reply::new(SYNTAX_ERROR, "Syntax error, command unrecognized"),
        ),
        Command::UNKNOWN(verb) => CommandResult::failure(
            format!("unsupported command {verb}"),
            Reply::new(NOT_IMPLEMENTED, "Command not implemented"),
        ),
    }
}

/// Handles the USER command. Restarts the login from any state.
fn handle_cmd_user(session: &mut Session, username: &str) -> CommandResult {
    if username.is_empty() {
        return argument_error("USER requires a user name");
    }

    if session.begin_login(username.to_string()) {
        session.log().login(username);
        CommandResult::success(Reply::new(LOGIN_SUCCESS, "User logged in, proceed"))
    } else {
        CommandResult::success(Reply::new(PASSWORD_REQUIRED, "User name okay, need password"))
    }
}

/// Handles the PASS command for the pending user.
fn handle_cmd_pass(session: &mut Session, password: &str) -> CommandResult {
    let Some(username) = session.pending_user().map(str::to_string) else {
        return CommandResult::failure(
            "PASS without USER",
            Reply::new(BAD_SEQUENCE, "Login with USER first"),
        );
    };

    match session.complete_login(password) {
        Some(true) => {
            session.log().login(&username);
            CommandResult::success(Reply::new(LOGIN_SUCCESS, "User logged in, proceed"))
        }
        _ => CommandResult::failure(
            format!("authentication failed for {username}"),
            Reply::new(AUTH_FAILED, "Login incorrect"),
        ),
    }
}

/// Handles the QUIT command: releases the data connection and signals close.
fn handle_cmd_quit(session: &mut Session) -> CommandResult {
    session.close_data_connection();
    CommandResult::close(Some(Reply::new(CLOSING, "Goodbye")))
}

/// Handles the PASV command.
///
/// The new listener is bound before the previous one is released, so a
/// repeated PASV always advertises a different port. On failure the previous
/// connection is discarded as well.
fn handle_cmd_pasv(session: &mut Session) -> CommandResult {
    let context = session.context();
    match DataConnection::open(context.bind_ip(), session.peer().ip()) {
        Ok(data) => {
            let reply = Reply::passive_mode(context.pasv_address(), data.port());
            if let Some(previous) = session.replace_data_connection(data) {
                debug!("{} released data port {}", session.log(), previous.port());
            }
            CommandResult::success(reply)
        }
        Err(e) => {
            session.close_data_connection();
            transfer_failure(e)
        }
    }
}

/// Handles LIST: sends the listing of a directory, or the line of one file.
async fn handle_cmd_list<W>(session: &mut Session, path: &str, control: &mut W) -> CommandResult
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let Some(data) = session.take_data_connection() else {
        return transfer_failure(TransferError::DataChannelNotInitialized);
    };

    let dir = match session.context().jail().resolve(path) {
        Ok(dir) => dir,
        Err(e) => return path_failure(e),
    };

    let listing = tokio::task::spawn_blocking(move || list_directory(&dir))
        .await
        .map_err(io::Error::other)
        .and_then(|listing| listing);
    let listing = match listing {
        Ok(listing) => listing,
        Err(e) => return transfer_failure(TransferError::LocalFile(e)),
    };

    let stream = match open_data_stream(session, data, control).await {
        Ok(stream) => stream,
        Err(result) => return result,
    };
    let peer = stream.peer();
    complete_transfer(session, "listed", path, peer, send_listing(stream, listing).await)
}

/// Handles RETR: streams an existing file inside the root to the client.
async fn handle_cmd_retr<W>(session: &mut Session, path: &str, control: &mut W) -> CommandResult
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if path.is_empty() {
        return argument_error("RETR requires a path");
    }
    let Some(data) = session.take_data_connection() else {
        return transfer_failure(TransferError::DataChannelNotInitialized);
    };

    let source = match session.context().jail().resolve_file(path) {
        Ok(source) => source,
        Err(e) => return path_failure(e),
    };
    let file = match File::open(&source).await {
        Ok(file) => file,
        Err(e) => return file_unavailable(format!("cannot open {}: {}", source.display(), e)),
    };

    let stream = match open_data_stream(session, data, control).await {
        Ok(stream) => stream,
        Err(result) => return result,
    };
    let peer = stream.peer();
    complete_transfer(session, "sent", path, peer, send_file(stream, file).await)
}

/// Handles STOR: receives a file whose parent directory is inside the root.
async fn handle_cmd_stor<W>(session: &mut Session, path: &str, control: &mut W) -> CommandResult
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if path.is_empty() {
        return argument_error("STOR requires a path");
    }
    let Some(data) = session.take_data_connection() else {
        return transfer_failure(TransferError::DataChannelNotInitialized);
    };

    let target = match session.context().jail().resolve_for_write(path) {
        Ok(target) => target,
        Err(e) => return path_failure(e),
    };
    let upload = match PartialUpload::create(target).await {
        Ok(upload) => upload,
        Err(TransferError::LocalFile(e)) => {
            return file_unavailable(format!("cannot create upload file: {e}"));
        }
        Err(e) => return transfer_failure(e),
    };

    let stream = match open_data_stream(session, data, control).await {
        Ok(stream) => stream,
        Err(result) => return result,
    };
    let peer = stream.peer();
    complete_transfer(session, "received", path, peer, upload.receive(stream).await)
}

/// Sends the preliminary 150 and waits for the passive peer.
async fn open_data_stream<W>(
    session: &Session,
    data: DataConnection,
    control: &mut W,
) -> Result<DataStream, CommandResult>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let preliminary = Reply::new(FILE_STATUS_OK, "Opening data connection");
    if let Err(e) = write_reply(control, &preliminary).await {
        session.log().fault("failed to write reply", &e);
        return Err(CommandResult::close(None));
    }
    session.log().reply(&preliminary);

    data.accept(session.context().data_accept_timeout())
        .await
        .map_err(transfer_failure)
}

fn complete_transfer(
    session: &Session,
    action: &str,
    path: &str,
    peer: SocketAddr,
    outcome: Result<u64, TransferError>,
) -> CommandResult {
    match outcome {
        Ok(bytes) => {
            session.log().transfer(action, path, bytes, peer);
            CommandResult::success(Reply::new(TRANSFER_COMPLETE, "Transfer complete"))
        }
        Err(e) => transfer_failure(e),
    }
}

fn transfer_failure(e: TransferError) -> CommandResult {
    CommandResult::failure(e.to_string(), e.to_reply())
}

fn path_failure(e: PathError) -> CommandResult {
    CommandResult::failure(e.to_string(), e.to_reply())
}

fn file_unavailable(reason: String) -> CommandResult {
    CommandResult::failure(
        reason,
        Reply::new(FILE_UNAVAILABLE, "Requested action not taken; file unavailable"),
    )
}

fn argument_error(reason: &str) -> CommandResult {
    CommandResult::failure(
        reason,
        Reply::new(ARGUMENT_ERROR, "Syntax error in parameters or arguments"),
    )
}
