//! Module `handler`
//!
//! The control connection loop: greets the client, then reads one command
//! line at a time and writes its reply before reading the next.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};

use crate::client::Session;
use crate::middleware::SessionLog;
use crate::protocol::responses::{READY, SERVICE_UNAVAILABLE, SYNTAX_ERROR};
use crate::protocol::{CommandStatus, Reply, handle_command, parse_command, write_reply};
use crate::server::ServerContext;

enum LineRead {
    Line(String),
    TooLong,
    Eof,
    IdleTimeout,
}

/// Handles one FTP client session until QUIT, EOF, idle timeout or a
/// control connection error.
///
/// Dropping the session at the end releases any pending data connection.
pub async fn handle_client<S>(stream: S, context: Arc<ServerContext>, log: SessionLog)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();
    let limit = context.max_command_length();
    let idle = context.idle_timeout();

    log.connected();
    let mut session = Session::new(log.peer(), context, log);

    let greeting = Reply::new(READY, "RAX FTP server ready");
    if let Err(e) = write_reply(&mut write_half, &greeting).await {
        session.log().fault("failed to send greeting", &e);
        return;
    }

    let reason = loop {
        let line = match read_command(&mut reader, limit, idle, &mut buf).await {
            Ok(LineRead::Line(line)) => line,
            Ok(LineRead::TooLong) => {
                let reply = Reply::new(SYNTAX_ERROR, "Command line too long");
                if let Err(e) = write_reply(&mut write_half, &reply).await {
                    break format!("write error: {e}");
                }
                continue;
            }
            Ok(LineRead::Eof) => break "closed by client".to_string(),
            Ok(LineRead::IdleTimeout) => {
                let reply = Reply::new(
                    SERVICE_UNAVAILABLE,
                    "Idle timeout, closing control connection",
                );
                let _ = write_reply(&mut write_half, &reply).await;
                break "idle timeout".to_string();
            }
            Err(e) => break format!("read error: {e}"),
        };

        let command = parse_command(&line);
        session.log().command(&command);

        let result = handle_command(&mut session, &command, &mut write_half).await;
        if let CommandStatus::Failure(reason) = &result.status {
            session.log().failure(&command, reason);
        }

        if let Some(reply) = &result.reply {
            session.log().reply(reply);
            if let Err(e) = write_reply(&mut write_half, reply).await {
                break format!("write error: {e}");
            }
        }

        if result.status == CommandStatus::CloseConnection {
            break "quit".to_string();
        }
    };

    session.close_data_connection();
    session.log().disconnected(&reason);
}

/// Reads the next command line, bounded by `idle` when set.
async fn read_command<R>(
    reader: &mut R,
    limit: usize,
    idle: Option<Duration>,
    buf: &mut Vec<u8>,
) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let read = read_line_bounded(reader, limit, buf);
    match idle {
        Some(idle) => match tokio::time::timeout(idle, read).await {
            Ok(result) => result,
            Err(_) => Ok(LineRead::IdleTimeout),
        },
        None => read.await,
    }
}

/// Reads one line of at most `limit` bytes, not counting CR/LF.
///
/// Longer lines are consumed up to their newline and reported as `TooLong`.
/// Invalid UTF-8 is replaced rather than rejected.
async fn read_line_bounded<R>(reader: &mut R, limit: usize, buf: &mut Vec<u8>) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let cap = (limit as u64).saturating_add(2);
    buf.clear();
    let n = (&mut *reader).take(cap).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }

    if !buf.ends_with(b"\n") && n as u64 >= cap {
        discard_rest_of_line(reader, buf).await?;
        return Ok(LineRead::TooLong);
    }

    let content = strip_line_ending(buf);
    if content.len() > limit {
        return Ok(LineRead::TooLong);
    }
    Ok(LineRead::Line(String::from_utf8_lossy(content).into_owned()))
}

async fn discard_rest_of_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        buf.clear();
        let n = (&mut *reader).take(4096).read_until(b'\n', buf).await?;
        if n == 0 || buf.ends_with(b"\n") {
            return Ok(());
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, sha256_hex};
    use crate::config::ServerConfig;
    use crate::storage::Jail;
    use tokio::io::{AsyncWriteExt, DuplexStream};

    fn context(config: ServerConfig) -> (tempfile::TempDir, Arc<ServerContext>) {
        let tmp = tempfile::tempdir().unwrap();
        let credentials = CredentialStore::parse(&format!("alice:{}\n", sha256_hex("pw")));
        let jail = Jail::new(tmp.path()).unwrap();
        let context = ServerContext::new(credentials, jail, &config).unwrap();
        (tmp, Arc::new(context))
    }

    fn start(config: ServerConfig) -> (tempfile::TempDir, BufReader<DuplexStream>) {
        let (tmp, context) = context(config);
        let (client, server) = tokio::io::duplex(64 * 1024);
        let log = SessionLog::new(1, "127.0.0.1:40000".parse().unwrap());
        tokio::spawn(handle_client(server, context, log));
        (tmp, BufReader::new(client))
    }

    async fn reply(client: &mut BufReader<DuplexStream>) -> String {
        let mut line = String::new();
        client.read_line(&mut line).await.unwrap();
        line
    }

    async fn send(client: &mut BufReader<DuplexStream>, line: &str) -> String {
        client.get_mut().write_all(line.as_bytes()).await.unwrap();
        reply(client).await
    }

    #[tokio::test]
    async fn greets_and_answers_in_order() {
        let (_tmp, mut client) = start(ServerConfig::default());
        assert_eq!(reply(&mut client).await, "220 RAX FTP server ready\r\n");
        assert!(send(&mut client, "noop\r\n").await.starts_with("200 "));
        assert!(send(&mut client, "USER alice\r\n").await.starts_with("331 "));
        assert!(send(&mut client, "PASS pw\r\n").await.starts_with("230 "));
        assert!(send(&mut client, "QUIT\r\n").await.starts_with("221 "));
        assert_eq!(reply(&mut client).await, "");
    }

    #[tokio::test]
    async fn over_long_line_is_rejected_and_session_continues() {
        let config = ServerConfig {
            max_command_length: 32,
            ..ServerConfig::default()
        };
        let (_tmp, mut client) = start(config);
        reply(&mut client).await;

        let long = format!("USER {}\r\n", "x".repeat(200));
        assert_eq!(send(&mut client, &long).await, "500 Command line too long\r\n");
        assert!(send(&mut client, "NOOP\r\n").await.starts_with("200 "));
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let config = ServerConfig {
            max_command_length: 16,
            ..ServerConfig::default()
        };
        let (_tmp, mut client) = start(config);
        reply(&mut client).await;
        assert!(send(&mut client, "USER abcdefghijk\r\n").await.starts_with("331 "));
        assert!(send(&mut client, "USER abcdefghijkl\r\n").await.starts_with("500 "));
    }

    #[tokio::test]
    async fn idle_client_is_disconnected() {
        let config = ServerConfig {
            idle_timeout_secs: 1,
            ..ServerConfig::default()
        };
        let (_tmp, mut client) = start(config);
        reply(&mut client).await;
        assert!(reply(&mut client).await.starts_with("421 "));
        assert_eq!(reply(&mut client).await, "");
    }

    #[tokio::test]
    async fn invalid_utf8_is_dispatched_lossily() {
        let (_tmp, mut client) = start(ServerConfig::default());
        reply(&mut client).await;
        client.get_mut().write_all(b"\xff\xfe\r\n").await.unwrap();
        assert!(reply(&mut client).await.starts_with("502 "));
    }

    #[test]
    fn strips_crlf_and_bare_lf() {
        assert_eq!(strip_line_ending(b"NOOP\r\n"), b"NOOP");
        assert_eq!(strip_line_ending(b"NOOP\n"), b"NOOP");
        assert_eq!(strip_line_ending(b"NOOP"), b"NOOP");
    }
}
