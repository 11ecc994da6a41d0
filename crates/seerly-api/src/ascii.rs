//! HomeSeer ASCII interface -- the event-notification channel.
//!
//! A line-oriented TCP connection (default port 11000). After an
//! `au,{user},{pass}` login handshake answered with `ok`, the controller
//! pushes `DC,{ref},{newval},{oldval}` lines whenever a device changes.
//! The `vr` request doubles as the keepalive ping; the version line it
//! answers with (like any other inbound line) counts as the
//! acknowledgment.
//!
//! `open()` hands back split reader/writer halves as trait objects --
//! the core owns their task lifecycles, this module owns only framing
//! and parsing.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, trace};

use crate::channel::{AsciiMessage, DeviceChange, EventChannelFactory, EventReader, EventWriter};
use crate::error::Error;

const MAX_LINE_LENGTH: usize = 8192;

// ── AsciiChannel ─────────────────────────────────────────────────────

/// Factory for the ASCII event connection.
///
/// Holds only the endpoint and credentials; each [`open`] call dials a
/// fresh connection and performs the login handshake, so the session
/// layer can reconnect by calling `open` again.
///
/// [`open`]: EventChannelFactory::open
pub struct AsciiChannel {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl AsciiChannel {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Self {
        Self {
            host: host.to_owned(),
            port,
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }
}

#[async_trait]
impl EventChannelFactory for AsciiChannel {
    async fn open(&self) -> Result<(Box<dyn EventReader>, Box<dyn EventWriter>), Error> {
        debug!(host = %self.host, port = self.port, "connecting to ASCII interface");

        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| Error::AsciiConnect(format!("{}:{}: {e}", self.host, self.port)))?;
        let (read_half, write_half) = stream.into_split();

        let mut reader = AsciiReader {
            frames: FramedRead::new(
                read_half,
                LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            ),
        };
        let mut writer = AsciiWriter { half: write_half };

        // Login handshake: "au,{user},{pass}" answered with "ok".
        writer
            .send_line(&format!("au,{},{}", self.username, self.password))
            .await?;
        let reply = reader.next_line().await?.ok_or(Error::AsciiClosed)?;
        if reply.trim() != "ok" {
            return Err(Error::Authentication {
                message: format!("ASCII login rejected: {}", reply.trim()),
            });
        }

        debug!(host = %self.host, port = self.port, "ASCII login successful");
        Ok((Box::new(reader), Box::new(writer)))
    }
}

// ── Reader half ──────────────────────────────────────────────────────

struct AsciiReader {
    frames: FramedRead<OwnedReadHalf, LinesCodec>,
}

impl AsciiReader {
    async fn next_line(&mut self) -> Result<Option<String>, Error> {
        match self.frames.next().await {
            None => Ok(None),
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(Error::AsciiProtocol(e.to_string())),
        }
    }
}

#[async_trait]
impl EventReader for AsciiReader {
    async fn next_message(&mut self) -> Result<Option<AsciiMessage>, Error> {
        Ok(self.next_line().await?.map(|line| parse_message(&line)))
    }
}

// ── Writer half ──────────────────────────────────────────────────────

struct AsciiWriter {
    half: OwnedWriteHalf,
}

impl AsciiWriter {
    /// Write a CRLF-terminated line. HomeSeer expects `\r\n` endings.
    async fn send_line(&mut self, line: &str) -> Result<(), Error> {
        self.half.write_all(format!("{line}\r\n").as_bytes()).await?;
        self.half.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl EventWriter for AsciiWriter {
    async fn ping(&mut self) -> Result<(), Error> {
        trace!("pinging ASCII connection");
        self.send_line("vr").await
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse one ASCII line. `DC` lines become [`AsciiMessage::DeviceChange`];
/// everything else (version replies, unhandled message types) is passed
/// through as [`AsciiMessage::Other`].
fn parse_message(line: &str) -> AsciiMessage {
    let trimmed = line.trim();
    let mut parts = trimmed.split(',');

    if parts.next() == Some("DC") {
        let device_ref = parts.next().and_then(|s| s.trim().parse().ok());
        let new_value = parts.next().and_then(|s| s.trim().parse().ok());
        let old_value = parts.next().and_then(|s| s.trim().parse().ok());

        if let Some(device_ref) = device_ref {
            return AsciiMessage::DeviceChange(DeviceChange {
                device_ref,
                new_value,
                old_value,
            });
        }
        debug!(line = trimmed, "device-change line with unparsable ref");
    } else {
        trace!(line = trimmed, "non-DC ASCII line");
    }

    AsciiMessage::Other(trimmed.to_owned())
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_device_change() {
        let msg = parse_message("DC,190,255,0");
        assert_eq!(
            msg,
            AsciiMessage::DeviceChange(DeviceChange {
                device_ref: 190,
                new_value: Some(255.0),
                old_value: Some(0.0),
            })
        );
    }

    #[test]
    fn parse_device_change_with_fractional_value() {
        let msg = parse_message("DC,12,21.5,20.5\r");
        assert_eq!(
            msg,
            AsciiMessage::DeviceChange(DeviceChange {
                device_ref: 12,
                new_value: Some(21.5),
                old_value: Some(20.5),
            })
        );
    }

    #[test]
    fn parse_device_change_without_values() {
        let msg = parse_message("DC,44");
        assert_eq!(
            msg,
            AsciiMessage::DeviceChange(DeviceChange {
                device_ref: 44,
                new_value: None,
                old_value: None,
            })
        );
    }

    #[test]
    fn device_change_with_bad_ref_falls_through() {
        let msg = parse_message("DC,not-a-ref,1,0");
        assert_eq!(msg, AsciiMessage::Other("DC,not-a-ref,1,0".into()));
    }

    #[test]
    fn parse_version_reply() {
        let msg = parse_message("HomeSeer Version 4.2.19.0");
        assert_eq!(msg, AsciiMessage::Other("HomeSeer Version 4.2.19.0".into()));
    }

    #[test]
    fn parse_unhandled_message_type() {
        // "TTS" and friends exist on the wire; they are liveness, not events.
        let msg = parse_message("TTS,Something was spoken");
        assert_eq!(msg, AsciiMessage::Other("TTS,Something was spoken".into()));
    }
}
