//! Live level feed with auto-reconnect.
//!
//! Connects to the level service's Socket.IO endpoint over WebSocket and
//! streams [`FeedEvent`]s through a [`tokio::sync::broadcast`] channel.
//! Reconnects with exponential backoff + jitter. Each successful
//! (re)connection is announced with [`FeedEvent::Connected`] so consumers
//! can re-fetch the level and not render a stale value.
//!
//! # Example
//!
//! ```rust,ignore
//! use tankwatch_api::feed::{FeedEvent, LevelFeed, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = tankwatch_api::socketio::endpoint(&"http://localhost:5000".parse()?)?;
//! let feed = LevelFeed::connect(url, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = feed.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if let FeedEvent::Level(level) = event {
//!         println!("tank at {level}");
//!     }
//! }
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::socketio::{self, Frame};
use crate::types::{LevelPayload, Percent};

// ── Constants ────────────────────────────────────────────────────────

const FEED_CHANNEL_CAPACITY: usize = 1024;

/// Event name the level service publishes readings under.
pub const LEVEL_EVENT: &str = "update_level";

/// Heartbeat used until the handshake tells us the real one
/// (Socket.IO defaults: 25s interval + 20s timeout).
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(45);

// ── FeedEvent ────────────────────────────────────────────────────────

/// What the feed publishes to subscribers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedEvent {
    /// Namespace joined; readings will follow.
    Connected,
    /// A validated level reading, in arrival order.
    Level(Percent),
    /// The connection dropped; a reconnect is scheduled.
    Disconnected,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for feed reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Give up after this many consecutive failures. `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── LevelFeed ────────────────────────────────────────────────────────

/// Handle to a running level feed.
pub struct LevelFeed {
    event_rx: broadcast::Receiver<FeedEvent>,
    cancel: CancellationToken,
}

impl LevelFeed {
    /// Spawn the connect/reconnect loop for `feed_url`.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background. Must be called inside a tokio runtime.
    pub fn connect(feed_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (event_tx, event_rx) = broadcast::channel(FEED_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            feed_loop(feed_url, event_tx, reconnect, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// A new receiver positioned at the current tail of the stream.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.event_rx.resubscribe()
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

async fn feed_loop(
    feed_url: Url,
    event_tx: broadcast::Sender<FeedEvent>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let mut session = Session::new(&event_tx);
        let result = connect_and_read(&feed_url, &mut session, &cancel).await;
        let joined = session.established;
        drop(session);

        // Only consecutive failures without a joined session count
        // against the retry budget.
        if joined {
            attempt = 0;
        }

        let delay = match result {
            Ok(()) if cancel.is_cancelled() => break,
            // Server closed the session: start over from a clean slate.
            Ok(()) => {
                tracing::info!("level feed closed by server, reconnecting");
                attempt = 0;
                reconnect.initial_delay
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, joined, "level feed error");

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(max_retries = max, "level feed reconnect limit reached");
                        break;
                    }
                }

                let delay = calculate_backoff(attempt, &reconnect);
                attempt = attempt.saturating_add(1);
                delay
            }
        };

        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!("level feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Per-connection protocol state. Announces `Disconnected` on drop if the
/// namespace was ever joined, whichever way the connection ends.
struct Session<'a> {
    event_tx: &'a broadcast::Sender<FeedEvent>,
    established: bool,
    heartbeat: Duration,
}

impl<'a> Session<'a> {
    fn new(event_tx: &'a broadcast::Sender<FeedEvent>) -> Self {
        Self {
            event_tx,
            established: false,
            heartbeat: DEFAULT_HEARTBEAT,
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.established {
            let _ = self.event_tx.send(FeedEvent::Disconnected);
        }
    }
}

/// What the read loop should do after a frame.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Reply(&'static str),
    Closed,
}

async fn connect_and_read(
    url: &Url,
    session: &mut Session<'_>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to level feed");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();

    loop {
        let heartbeat = session.heartbeat;
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = tokio::time::timeout(heartbeat, read.next()) => frame.map_err(|_| {
                Error::HeartbeatTimeout {
                    timeout_ms: u64::try_from(heartbeat.as_millis()).unwrap_or(u64::MAX),
                }
            })?,
        };

        let step = match frame {
            Some(Ok(Message::Text(text))) => process_text(text.as_str(), session)?,
            Some(Ok(Message::Close(close))) => {
                if let Some(cf) = close {
                    tracing::info!(code = %cf.code, reason = %cf.reason, "level feed close frame");
                }
                Step::Closed
            }
            Some(Ok(Message::Binary(_))) => {
                return Err(Error::Protocol("unexpected binary frame".into()));
            }
            Some(Ok(_)) => Step::Continue,
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
            None => {
                tracing::info!("level feed stream ended");
                Step::Closed
            }
        };

        match step {
            Step::Continue => {}
            Step::Reply(text) => write
                .send(Message::text(text.to_owned()))
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?,
            Step::Closed => return Ok(()),
        }
    }
}

/// Handle one text frame. Malformed frames are logged and skipped.
fn process_text(text: &str, session: &mut Session<'_>) -> Result<Step, Error> {
    let frame = match socketio::decode(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed feed frame");
            return Ok(Step::Continue);
        }
    };

    match frame {
        Frame::Open(handshake) => {
            tracing::debug!(sid = %handshake.sid, "engine.io handshake");
            session.heartbeat = handshake.heartbeat();
            Ok(Step::Reply(socketio::CONNECT))
        }
        Frame::Ping => Ok(Step::Reply(socketio::PONG)),
        Frame::Connect => {
            tracing::info!("level feed connected");
            session.established = true;
            let _ = session.event_tx.send(FeedEvent::Connected);
            Ok(Step::Continue)
        }
        Frame::Event { name, args } if name == LEVEL_EVENT => {
            match parse_level(args.first()) {
                Ok(level) => {
                    tracing::trace!(%level, "level update");
                    // No subscribers is fine; readings are not buffered.
                    let _ = session.event_tx.send(FeedEvent::Level(level));
                }
                Err(e) => tracing::warn!(error = %e, "dropping malformed level update"),
            }
            Ok(Step::Continue)
        }
        Frame::Event { name, .. } => {
            tracing::debug!(event = %name, "ignoring feed event");
            Ok(Step::Continue)
        }
        Frame::ConnectError(message) => Err(Error::Protocol(format!(
            "namespace connect rejected: {message}"
        ))),
        Frame::Close | Frame::Disconnect => Ok(Step::Closed),
        Frame::Pong | Frame::Noop | Frame::Ack => Ok(Step::Continue),
    }
}

/// Validate an `update_level` payload. Unlike the initial fetch, a missing
/// level here is malformed rather than zero.
fn parse_level(arg: Option<&serde_json::Value>) -> Result<Percent, Error> {
    let arg = arg.ok_or_else(|| Error::Protocol("update_level without payload".into()))?;
    let payload: LevelPayload =
        serde_json::from_value(arg.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: arg.to_string(),
        })?;
    let raw = payload
        .level
        .ok_or_else(|| Error::Protocol("update_level without level".into()))?;
    Percent::new(raw)
}

// ── Backoff calculation ──────────────────────────────────────────────

/// `min(initial * 2^attempt, max)` scaled by a deterministic ±25% jitter
/// so several monitors restarting together do not reconnect in lockstep.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exp = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exp);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(tx: &broadcast::Sender<FeedEvent>) -> Session<'_> {
        Session::new(tx)
    }

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_grows_then_caps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);
        assert!(d1 > d0, "d1 ({d1:?}) should exceed d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should exceed d1 ({d1:?})");

        let d40 = calculate_backoff(40, &config);
        assert!(d40 <= Duration::from_millis(12_500), "uncapped: {d40:?}");
    }

    #[test]
    fn handshake_replies_with_namespace_connect() {
        let (tx, _rx) = broadcast::channel(8);
        let mut s = session(&tx);

        let step = process_text(
            r#"0{"sid":"x","upgrades":[],"pingInterval":1000,"pingTimeout":500}"#,
            &mut s,
        )
        .unwrap();

        assert_eq!(step, Step::Reply("40"));
        assert_eq!(s.heartbeat, Duration::from_millis(1500));
        assert!(!s.established);
    }

    #[test]
    fn ping_is_answered() {
        let (tx, _rx) = broadcast::channel(8);
        let mut s = session(&tx);
        assert_eq!(process_text("2", &mut s).unwrap(), Step::Reply("3"));
    }

    #[test]
    fn connect_then_levels_are_broadcast_in_order() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut s = session(&tx);

        process_text("40", &mut s).unwrap();
        process_text(r#"42["update_level",{"level":25}]"#, &mut s).unwrap();
        process_text(r#"42["update_level",{"level":20}]"#, &mut s).unwrap();
        process_text(r#"42["update_level",{"level":20}]"#, &mut s).unwrap();

        assert_eq!(rx.try_recv().unwrap(), FeedEvent::Connected);
        for expected in [25.0, 20.0, 20.0] {
            assert_eq!(
                rx.try_recv().unwrap(),
                FeedEvent::Level(Percent::new(expected).unwrap())
            );
        }
    }

    #[test]
    fn malformed_updates_are_dropped() {
        let (tx, mut rx) = broadcast::channel::<FeedEvent>(8);
        let mut s = session(&tx);

        for text in [
            r#"42["update_level",{"level":"high"}]"#,
            r#"42["update_level",{}]"#,
            r#"42["update_level"]"#,
            "42{not json",
            "garbage",
        ] {
            assert_eq!(process_text(text, &mut s).unwrap(), Step::Continue, "{text}");
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn other_events_are_ignored() {
        let (tx, mut rx) = broadcast::channel::<FeedEvent>(8);
        let mut s = session(&tx);
        process_text(r#"42["pump_status",{"on":true}]"#, &mut s).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn connect_error_fails_the_session() {
        let (tx, _rx) = broadcast::channel(8);
        let mut s = session(&tx);
        let err = process_text(r#"44{"message":"Not authorized"}"#, &mut s).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "got {err:?}");
    }

    #[test]
    fn dropping_established_session_announces_disconnect() {
        let (tx, mut rx) = broadcast::channel(8);
        {
            let mut s = session(&tx);
            process_text("40", &mut s).unwrap();
            assert_eq!(process_text("41", &mut s).unwrap(), Step::Closed);
        }
        assert_eq!(rx.try_recv().unwrap(), FeedEvent::Connected);
        assert_eq!(rx.try_recv().unwrap(), FeedEvent::Disconnected);
    }

    #[test]
    fn dropping_unestablished_session_is_silent() {
        let (tx, mut rx) = broadcast::channel::<FeedEvent>(8);
        drop(session(&tx));
        assert!(rx.try_recv().is_err());
    }
}
