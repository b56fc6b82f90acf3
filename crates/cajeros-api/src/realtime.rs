//! Realtime change feed with auto-reconnect.
//!
//! Joins a `postgres_changes` channel on the table backend's realtime
//! WebSocket (Phoenix channel protocol) and streams row changes through a
//! [`tokio::sync::broadcast`] channel. The subscription state is published
//! on a [`tokio::sync::watch`] channel. Reconnection uses exponential
//! backoff with jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use cajeros_api::realtime::{ChangeFilter, RealtimeConfig, RealtimeHandle};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = RealtimeConfig::new(
//!     table.realtime_url()?,
//!     api_key,
//!     "cajeros-realtime",
//!     ChangeFilter::table("cajeros").with_filter("estadolinea=in.(open,close)"),
//! );
//! let handle = RealtimeHandle::spawn(config, CancellationToken::new());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(change) = rx.recv().await {
//!     println!("{:?} {}", change.kind, change.row());
//! }
//!
//! handle.shutdown().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Channel capacity ─────────────────────────────────────────────────

const CHANGE_CHANNEL_CAPACITY: usize = 1024;

const JOIN_REF: &str = "1";
const PHOENIX_TOPIC: &str = "phoenix";

// ── Wire types ───────────────────────────────────────────────────────

/// Kind of row change reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row change. `record` holds the new row (insert/update) and
/// `old_record` the previous row or, for deletes, its primary key.
#[derive(Debug, Clone, Deserialize)]
pub struct RowChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
    #[serde(default)]
    pub record: Value,
    #[serde(default)]
    pub old_record: Value,
}

impl RowChange {
    /// The row this change is about: `old_record` for deletes, `record`
    /// otherwise.
    pub fn row(&self) -> &Value {
        match self.kind {
            ChangeKind::Delete => &self.old_record,
            ChangeKind::Insert | ChangeKind::Update => &self.record,
        }
    }
}

/// Which table changes the channel asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeFilter {
    pub event: String,
    pub schema: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ChangeFilter {
    /// Every event on `public.<table>`.
    pub fn table(table: &str) -> Self {
        Self {
            event: "*".into(),
            schema: "public".into(),
            table: table.to_owned(),
            filter: None,
        }
    }

    /// Restrict to rows matching a PostgREST-style filter, e.g.
    /// `estadolinea=in.(open,close)`.
    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_owned());
        self
    }
}

/// Lifecycle of the channel subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    #[default]
    Unsubscribed,
    Subscribing,
    Active,
}

// ── Configuration ────────────────────────────────────────────────────

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
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

/// Everything the background task needs to hold one channel open.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket endpoint, see `TableClient::realtime_url`.
    pub url: Url,
    pub api_key: SecretString,
    /// Channel name; joined as `realtime:<channel>`.
    pub channel: String,
    pub filter: ChangeFilter,
    /// Default: 25s.
    pub heartbeat_interval: Duration,
    pub reconnect: ReconnectConfig,
}

impl RealtimeConfig {
    pub fn new(url: Url, api_key: SecretString, channel: &str, filter: ChangeFilter) -> Self {
        Self {
            url,
            api_key,
            channel: channel.to_owned(),
            filter,
            heartbeat_interval: Duration::from_secs(25),
            reconnect: ReconnectConfig::default(),
        }
    }

    fn topic(&self) -> String {
        format!("realtime:{}", self.channel)
    }
}

// ── RealtimeHandle ───────────────────────────────────────────────────

/// Handle to a running realtime subscription.
///
/// Owns the cancellation token and the background task. Dropping the
/// handle cancels the task; [`shutdown`](Self::shutdown) also waits for
/// the channel to leave and the socket to close.
pub struct RealtimeHandle {
    change_rx: broadcast::Receiver<Arc<RowChange>>,
    state_rx: watch::Receiver<SubscriptionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RealtimeHandle {
    /// Spawn the connection loop. Returns immediately; the first connection
    /// attempt happens in the background.
    pub fn spawn(config: RealtimeConfig, cancel: CancellationToken) -> Self {
        let (change_tx, change_rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Unsubscribed);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            realtime_loop(config, change_tx, state_tx, task_cancel).await;
        });

        Self {
            change_rx,
            state_rx,
            cancel,
            task: Some(task),
        }
    }

    /// Get a new receiver for row changes.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RowChange>> {
        self.change_rx.resubscribe()
    }

    /// Watch the subscription state.
    pub fn state(&self) -> watch::Receiver<SubscriptionState> {
        self.state_rx.clone()
    }

    /// Cancel the subscription and wait for the background task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "realtime task ended abnormally");
            }
        }
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → join → read → on error, backoff → reconnect.
async fn realtime_loop(
    config: RealtimeConfig,
    change_tx: broadcast::Sender<Arc<RowChange>>,
    state_tx: watch::Sender<SubscriptionState>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    while !cancel.is_cancelled() {
        state_tx.send_replace(SubscriptionState::Subscribing);
        let mut joined = false;
        let result = connect_and_read(&config, &change_tx, &state_tx, &cancel, &mut joined).await;
        state_tx.send_replace(SubscriptionState::Unsubscribed);

        if joined {
            attempt = 0;
        }

        match result {
            Ok(()) if cancel.is_cancelled() => break,
            Ok(()) => tracing::info!("realtime socket closed, reconnecting"),
            Err(e) => {
                tracing::warn!(error = %e, attempt, "realtime channel error");

                if let Some(max) = config.reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(max_retries = max, "realtime reconnection limit reached, giving up");
                        break;
                    }
                }

                let delay = calculate_backoff(attempt, &config.reconnect);
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

                attempt = attempt.saturating_add(1);
            }
        }
    }

    tracing::debug!("realtime loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one socket, join the channel and read until it drops or the token
/// is cancelled. On cancellation the channel is left and the socket closed.
async fn connect_and_read(
    config: &RealtimeConfig,
    change_tx: &broadcast::Sender<Arc<RowChange>>,
    state_tx: &watch::Sender<SubscriptionState>,
    cancel: &CancellationToken,
    joined: &mut bool,
) -> Result<(), Error> {
    tracing::info!(url = %redacted(&config.url), "connecting to realtime feed");

    let connect = tokio_tungstenite::connect_async(config.url.as_str());
    let (ws_stream, _response) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(()),
        result = connect => result.map_err(|e| Error::RealtimeConnect(e.to_string()))?,
    };

    let (mut write, mut read) = ws_stream.split();
    let topic = config.topic();

    write
        .send(text_frame(&join_message(&topic, &config.filter, &config.api_key)))
        .await
        .map_err(|e| Error::RealtimeConnect(e.to_string()))?;
    tracing::debug!(topic = %topic, "join sent");

    let period = config.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let leave = leave_message(&topic, next_ref);
                if let Err(e) = write.send(text_frame(&leave)).await {
                    tracing::debug!(error = %e, "failed to send leave");
                }
                let _ = write.close().await;
                return Ok(());
            }
            _ = heartbeat.tick() => {
                write
                    .send(text_frame(&heartbeat_message(next_ref)))
                    .await
                    .map_err(|e| Error::RealtimeConnect(e.to_string()))?;
                next_ref += 1;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match parse_message(&text, &topic) {
                            Some(Inbound::Joined) => {
                                tracing::info!(topic = %topic, "realtime subscription active");
                                *joined = true;
                                state_tx.send_replace(SubscriptionState::Active);
                            }
                            Some(Inbound::Change(change)) => {
                                // No receivers is fine.
                                let _ = change_tx.send(Arc::new(change));
                            }
                            Some(Inbound::Rejected(message)) => {
                                return Err(Error::SubscriptionRejected { message });
                            }
                            Some(Inbound::Closed) => {
                                return Err(Error::RealtimeClosed {
                                    code: 1000,
                                    reason: "channel closed by server".into(),
                                });
                            }
                            None => {}
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|cf| (u16::from(cf.code), cf.reason.as_str().to_owned()))
                            .unwrap_or((1005, String::new()));
                        tracing::info!(code, reason = %reason, "realtime close frame received");
                        return Err(Error::RealtimeClosed { code, reason });
                    }
                    Some(Err(e)) => return Err(Error::RealtimeConnect(e.to_string())),
                    None => {
                        tracing::info!("realtime stream ended");
                        return Ok(());
                    }
                    // Ping/Pong/Binary
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

fn text_frame(value: &Value) -> Message {
    Message::Text(value.to_string().into())
}

fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

// ── Outbound messages ────────────────────────────────────────────────

/// `phx_join` for a `postgres_changes` subscription.
pub fn join_message(topic: &str, filter: &ChangeFilter, api_key: &SecretString) -> Value {
    json!({
        "topic": topic,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [filter],
            },
            "access_token": api_key.expose_secret(),
        },
        "ref": JOIN_REF,
        "join_ref": JOIN_REF,
    })
}

fn heartbeat_message(msg_ref: u64) -> Value {
    json!({
        "topic": PHOENIX_TOPIC,
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
}

fn leave_message(topic: &str, msg_ref: u64) -> Value {
    json!({
        "topic": topic,
        "event": "phx_leave",
        "payload": {},
        "ref": msg_ref.to_string(),
        "join_ref": JOIN_REF,
    })
}

// ── Inbound parsing ──────────────────────────────────────────────────

/// What an inbound frame means for the subscription.
#[derive(Debug)]
pub enum Inbound {
    /// The join was acknowledged.
    Joined,
    Change(RowChange),
    /// The server refused the join or reported a channel error.
    Rejected(String),
    /// The server closed the channel.
    Closed,
}

#[derive(Debug, Deserialize)]
struct PhxMessage {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
    #[serde(default, rename = "ref")]
    msg_ref: Option<String>,
}

/// Interpret one text frame for the channel `topic`. Frames for other
/// topics, heartbeat replies and malformed JSON yield `None`.
pub fn parse_message(text: &str, topic: &str) -> Option<Inbound> {
    let msg: PhxMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse realtime frame");
            return None;
        }
    };
    if msg.topic != topic {
        return None;
    }

    match msg.event.as_str() {
        "phx_reply" if msg.msg_ref.as_deref() == Some(JOIN_REF) => {
            match msg.payload["status"].as_str() {
                Some("ok") => Some(Inbound::Joined),
                _ => Some(Inbound::Rejected(reply_reason(&msg.payload))),
            }
        }
        "postgres_changes" => decode_change(msg.payload.get("data")?.clone()),
        "INSERT" | "UPDATE" | "DELETE" => decode_change(msg.payload),
        "system" if msg.payload["status"].as_str() == Some("error") => {
            Some(Inbound::Rejected(reply_reason(&msg.payload)))
        }
        "phx_error" => Some(Inbound::Rejected("channel error".into())),
        "phx_close" => Some(Inbound::Closed),
        _ => None,
    }
}

fn decode_change(data: Value) -> Option<Inbound> {
    match serde_json::from_value::<RowChange>(data) {
        Ok(change) => Some(Inbound::Change(change)),
        Err(e) => {
            tracing::debug!(error = %e, "could not decode row change");
            None
        }
    }
}

fn reply_reason(payload: &Value) -> String {
    payload["response"]["reason"]
        .as_str()
        .or_else(|| payload["message"].as_str())
        .or_else(|| payload["response"].as_str())
        .unwrap_or("join refused")
        .to_owned()
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`, jitter within ±25%.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exp = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exp);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic spread seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
