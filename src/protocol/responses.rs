//! FTP Response handling
//!
//! Defines FTP reply codes and the single-line `Reply` sent on the control
//! connection.

use std::borrow::Cow;
use std::fmt;
use std::net::Ipv4Addr;

/// Standard FTP response codes
pub const FILE_STATUS_OK: u16 = 150;
pub const OK: u16 = 200;
pub const READY: u16 = 220;
pub const CLOSING: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const PASSIVE_MODE: u16 = 227;
pub const LOGIN_SUCCESS: u16 = 230;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const SERVICE_UNAVAILABLE: u16 = 421;
pub const CANT_OPEN_DATA: u16 = 425;
pub const TRANSFER_ABORTED: u16 = 426;
pub const FILE_BUSY: u16 = 450;
pub const LOCAL_ERROR: u16 = 451;
pub const SYNTAX_ERROR: u16 = 500;
pub const ARGUMENT_ERROR: u16 = 501;
pub const NOT_IMPLEMENTED: u16 = 502;
pub const BAD_SEQUENCE: u16 = 503;
pub const AUTH_FAILED: u16 = 530;
pub const FILE_UNAVAILABLE: u16 = 550;

/// A reply line: three-digit code plus human-readable text.
///
/// `Display` renders the wire form `<code> <text>\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    text: Cow<'static, str>,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// 227 reply advertising `ip:port` as `(h1,h2,h3,h4,p1,p2)`.
    pub fn passive_mode(ip: Ipv4Addr, port: u16) -> Self {
        let [h1, h2, h3, h4] = ip.octets();
        Self::new(
            PASSIVE_MODE,
            format!(
                "Entering Passive Mode ({h1},{h2},{h3},{h4},{},{})",
                port / 256,
                port % 256
            ),
        )
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}\r\n", self.code, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_renders_code_text_and_crlf() {
        let reply = Reply::new(OK, "NOOP ok");
        assert_eq!(reply.to_string(), "200 NOOP ok\r\n");
    }

    #[test]
    fn passive_mode_encodes_port_as_two_octets() {
        let reply = Reply::passive_mode(Ipv4Addr::LOCALHOST, 20000);
        assert_eq!(reply.code(), 227);
        assert_eq!(
            reply.to_string(),
            "227 Entering Passive Mode (127,0,0,1,78,32)\r\n"
        );

        let reply = Reply::passive_mode(Ipv4Addr::new(10, 1, 2, 3), 21000);
        assert_eq!(reply.text(), "Entering Passive Mode (10,1,2,3,82,8)");
    }
}
