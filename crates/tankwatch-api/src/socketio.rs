//! Minimal Socket.IO (v5) over Engine.IO (v4) text-frame codec.
//!
//! The level service publishes readings with a Socket.IO server, so the
//! push channel speaks Engine.IO framing on a plain WebSocket:
//!
//! | frame                         | meaning                               |
//! |-------------------------------|---------------------------------------|
//! | `0{"sid":..,"pingInterval":..}` | Engine.IO open / handshake          |
//! | `2` / `3`                     | ping / pong (server pings, we pong)   |
//! | `40` / `41`                   | Socket.IO namespace connect / disconnect |
//! | `42["update_level",{..}]`     | Socket.IO event                       |
//! | `44{"message":..}`            | namespace connect rejected            |
//!
//! Only text frames are supported; binary attachments are a protocol error.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::Error;

/// Reply to a server ping.
pub const PONG: &str = "3";
/// Join the default namespace.
pub const CONNECT: &str = "40";

/// Engine.IO handshake carried by the open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for our pong.
    pub ping_timeout: u64,
}

impl Handshake {
    /// How long to wait for any frame before declaring the peer dead.
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// A decoded text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    Disconnect,
    ConnectError(String),
    Event { name: String, args: Vec<Value> },
    Ack,
}

/// Decode one Engine.IO text frame.
pub fn decode(text: &str) -> Result<Frame, Error> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::Protocol("empty frame".into()))?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(Frame::Open)
            .map_err(|e| Error::Protocol(format!("bad handshake: {e}"))),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_socket_packet(rest),
        // Upgrade and noop only matter for polling transports.
        '5' | '6' => Ok(Frame::Noop),
        other => Err(Error::Protocol(format!("unknown engine packet type '{other}'"))),
    }
}

fn decode_socket_packet(text: &str) -> Result<Frame, Error> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::Protocol("empty socket packet".into()))?;
    let body = skip_ack_id(skip_namespace(chars.as_str()));

    match kind {
        '0' => Ok(Frame::Connect),
        '1' => Ok(Frame::Disconnect),
        '2' => decode_event(body),
        '3' => Ok(Frame::Ack),
        '4' => Ok(Frame::ConnectError(connect_error_message(body))),
        '5' | '6' => Err(Error::Protocol("binary packets are not supported".into())),
        other => Err(Error::Protocol(format!("unknown socket packet type '{other}'"))),
    }
}

/// Strip a `/namespace,` prefix if present.
fn skip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        text.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        text
    }
}

/// Strip a numeric ack id preceding the JSON payload.
fn skip_ack_id(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn decode_event(body: &str) -> Result<Frame, Error> {
    let items: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| Error::Protocol(format!("bad event payload: {e}")))?;
    let mut items = items.into_iter();
    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(Error::Protocol("event without a name".into())),
    };
    Ok(Frame::Event {
        name,
        args: items.collect(),
    })
}

fn connect_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("connection rejected")
            .to_owned(),
        Ok(Value::String(s)) => s,
        _ if body.is_empty() => "connection rejected".into(),
        _ => body.to_owned(),
    }
}

/// Derive the push-channel URL from the level service root:
/// `http://host:5000` → `ws://host:5000/socket.io/?EIO=4&transport=websocket`.
pub fn endpoint(level_url: &Url) -> Result<Url, Error> {
    let mut url = level_url.join("socket.io/")?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(Error::Protocol(format!(
                "cannot derive push channel from '{other}' URL"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::Protocol(format!("cannot switch {level_url} to {scheme}")))?;
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}
