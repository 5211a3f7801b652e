// Order book feed ingestor
// Owns the WebSocket connection, turns frames into snapshots and keeps reconnecting

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::clients::book_message::parse_book_message;
use crate::config::FeedConfig;
use crate::core::{OrderBookHistory, WakeSignal};
use crate::error::{ProtocolError, SimulatorResult};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

const HEARTBEAT_PAYLOAD: &[u8] = b"heartbeat";

/// Connection settings for the feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    pub endpoint: String,
    pub retry_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl FeedSettings {
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            retry_interval: config.retry_interval(),
            heartbeat_interval: config.heartbeat_interval(),
        }
    }
}

/// Lock-free feed counters
#[derive(Debug, Default)]
struct FeedStats {
    frames_received: AtomicU64,
    snapshots_ingested: AtomicU64,
    frames_dropped: AtomicU64,
    connect_attempts: AtomicU64,
    sessions_established: AtomicU64,
    heartbeats_sent: AtomicU64,
    heartbeat_failures: AtomicU64,
}

/// Point-in-time copy of the feed counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStatsSnapshot {
    pub frames_received: u64,
    pub snapshots_ingested: u64,
    pub frames_dropped: u64,
    pub connect_attempts: u64,
    pub sessions_established: u64,
    pub heartbeats_sent: u64,
    pub heartbeat_failures: u64,
}

impl FeedStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> FeedStatsSnapshot {
        FeedStatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            snapshots_ingested: self.snapshots_ingested.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            sessions_established: self.sessions_established.load(Ordering::Relaxed),
            heartbeats_sent: self.heartbeats_sent.load(Ordering::Relaxed),
            heartbeat_failures: self.heartbeat_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
enum SessionEnd {
    /// `close()` was called or shutdown was requested
    Closed,
    /// The server or the network ended the session
    Dropped(String),
}

/// Streams order books from the feed into the shared history.
///
/// `run` keeps the feed alive until `close` is called: a failed connect or a
/// dropped session is followed by a fixed delay and a fresh attempt, in a loop.
pub struct FeedIngestor {
    settings: FeedSettings,
    history: Arc<OrderBookHistory>,
    wake: Arc<WakeSignal>,
    stats: FeedStats,
    closed: AtomicBool,
    close_notify: Notify,
}

impl FeedIngestor {
    pub fn new(settings: FeedSettings, history: Arc<OrderBookHistory>, wake: Arc<WakeSignal>) -> Self {
        Self {
            settings,
            history,
            wake,
            stats: FeedStats::default(),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
        }
    }

    pub fn stats(&self) -> FeedStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop the feed: interrupts a blocked receive or a pending reconnect delay
    /// and releases the connection. Safe to call more than once.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("🔌 Closing order book feed");
        }
        self.close_notify.notify_one();
    }

    fn should_stop(&self) -> bool {
        self.is_closed() || self.wake.is_shutdown()
    }

    /// Parse one text frame and, if valid, append it and wake the worker.
    /// Returns the wake generation of the ingested snapshot.
    pub fn ingest_frame(&self, text: &str) -> Result<u64, ProtocolError> {
        FeedStats::bump(&self.stats.frames_received);

        match parse_book_message(text) {
            Ok(snapshot) => {
                self.history.append(snapshot);
                let generation = self.wake.notify_data();
                FeedStats::bump(&self.stats.snapshots_ingested);
                Ok(generation)
            }
            Err(e) => {
                FeedStats::bump(&self.stats.frames_dropped);
                warn!("⚠️  Invalid order book frame dropped: {}", e);
                Err(e)
            }
        }
    }

    /// Connect, stream and reconnect until closed or shut down
    pub async fn run(&self) {
        info!("🚀 Starting order book feed from {}", self.settings.endpoint);
        let mut attempt: u64 = 0;

        while !self.should_stop() {
            attempt += 1;
            FeedStats::bump(&self.stats.connect_attempts);

            let connected = tokio::select! {
                result = self.connect() => result,
                _ = self.close_notify.notified() => break,
            };

            match connected {
                Ok(ws) => {
                    attempt = 0;
                    FeedStats::bump(&self.stats.sessions_established);
                    match self.run_session(ws).await {
                        SessionEnd::Closed => break,
                        SessionEnd::Dropped(reason) => warn!("⚠️  Feed session ended: {}", reason),
                    }
                }
                Err(e) => {
                    error!(
                        category = e.category(),
                        retryable = e.is_retryable(),
                        "❌ WebSocket connection error (attempt {}): {}",
                        attempt,
                        e
                    );
                }
            }

            if self.should_stop() || !self.wait_before_retry().await {
                break;
            }
        }

        info!("✅ Order book feed stopped");
    }

    async fn connect(&self) -> SimulatorResult<WsStream> {
        debug!("Connecting to {}", self.settings.endpoint);
        let (ws_stream, _) = connect_async(self.settings.endpoint.as_str()).await?;
        info!("✅ Connected to order book feed");
        Ok(ws_stream)
    }

    /// Sleep for the retry interval; false if closed in the meantime
    async fn wait_before_retry(&self) -> bool {
        warn!("🔄 Reconnecting in {:?}", self.settings.retry_interval);
        tokio::select! {
            _ = tokio::time::sleep(self.settings.retry_interval) => !self.should_stop(),
            _ = self.close_notify.notified() => false,
        }
    }

    async fn run_session(&self, ws_stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = ws_stream.split();

        let period = self.settings.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let end = loop {
            if self.should_stop() {
                break SessionEnd::Closed;
            }

            tokio::select! {
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        // Rejected frames are counted and logged by ingest_frame
                        self.ingest_frame(&text).ok();
                    }
                    Some(Ok(Message::Binary(data))) => {
                        FeedStats::bump(&self.stats.frames_received);
                        FeedStats::bump(&self.stats.frames_dropped);
                        debug!("Ignoring {} byte binary frame", data.len());
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        debug!("Received keep-alive frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break SessionEnd::Dropped(format!("server closed connection ({:?})", frame));
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => break SessionEnd::Dropped(format!("read error: {}", e)),
                    None => break SessionEnd::Dropped("stream ended".to_string()),
                },
                _ = heartbeat.tick() => self.send_heartbeat(&mut write).await,
                _ = self.close_notify.notified() => break SessionEnd::Closed,
            }
        };

        if matches!(end, SessionEnd::Closed) {
            if let Err(e) = write.send(Message::Close(None)).await {
                debug!("Close frame not delivered: {}", e);
            }
        }

        end
    }

    async fn send_heartbeat(&self, write: &mut WsSink) {
        match write.send(Message::Ping(HEARTBEAT_PAYLOAD.to_vec())).await {
            Ok(()) => {
                FeedStats::bump(&self.stats.heartbeats_sent);
                debug!("💓 Heartbeat sent");
            }
            Err(e) => {
                FeedStats::bump(&self.stats.heartbeat_failures);
                warn!("Heartbeat failed: {}", e);
            }
        }
    }
}
