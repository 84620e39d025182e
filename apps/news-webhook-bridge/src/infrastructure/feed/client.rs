//! Feed Connection Manager
//!
//! Owns the upstream WebSocket and drives its full lifecycle:
//!
//! ```text
//! Disconnected ──connect──► Connecting ──handshake──► Connected
//!      ▲                                                  │
//!      └──────── backoff (≤10 attempts) ◄── socket error ─┘
//! ```
//!
//! - On connect the subscription registry is replayed after a short
//!   delay, one subscribe frame per topic in insertion order.
//! - Inbound frames are processed one at a time in arrival order;
//!   webhook deliveries are spawned and never awaited, so the read
//!   loop keeps draining while a delivery is in flight.
//! - Socket errors are never fatal to the process. Past the attempt
//!   ceiling the client parks and waits for a manual restart command.
//! - A missing feed credential parks the client immediately: one
//!   fatal-configuration log, no retry storm.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;

use crate::domain::event::CanonicalEvent;
use crate::domain::registry::SubscriptionRegistry;
use crate::infrastructure::config::FeedSettings;
use crate::infrastructure::feed::codec::FeedCodec;
use crate::infrastructure::feed::keepalive::KeepaliveTracker;
use crate::infrastructure::feed::messages::{FeedFrame, OutboundFrame};
use crate::infrastructure::feed::reconnect::ReconnectPolicy;
use crate::infrastructure::metrics::{self, FrameKind};
use crate::infrastructure::sink::EventSink;
use crate::infrastructure::stats::{BridgeStats, ConnectionState};

// =============================================================================
// Commands and Errors
// =============================================================================

/// Commands accepted by the connection manager from the operational
/// API. The registry itself is mutated by the caller regardless of
/// connection state; commands only drive wire traffic and restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    /// Send a subscribe frame for a topic (no-op while disconnected).
    Subscribe(String),
    /// Send an unsubscribe frame for a topic (no-op while disconnected).
    Unsubscribe(String),
    /// Tear down the current connection (if any), reset the attempt
    /// counter, and re-arm Connecting.
    Restart,
}

/// Errors that can occur in the feed client.
#[derive(Debug, thiserror::Error)]
pub enum FeedClientError {
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection closed by the server or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Keep-alive detected a half-open connection.
    #[error("keep-alive timeout")]
    KeepaliveTimeout,

    /// A manual restart was requested; the run loop re-arms.
    #[error("restart requested")]
    RestartRequested,
}

/// Outcome of waiting in a parked or backoff state.
enum WaitOutcome {
    /// Backoff delay elapsed; retry the connection.
    Elapsed,
    /// A restart command arrived; re-arm immediately.
    Restart,
    /// Shutdown was signalled or the command channel closed.
    Shutdown,
}

// =============================================================================
// Feed Client
// =============================================================================

/// WebSocket client for the upstream news feed.
///
/// Single-writer for [`ConnectionState`]: no other component mutates
/// the connected flag in [`BridgeStats`].
pub struct FeedClient<S> {
    settings: FeedSettings,
    codec: FeedCodec,
    registry: Arc<SubscriptionRegistry>,
    sink: Arc<S>,
    stats: Arc<BridgeStats>,
    cancel: CancellationToken,
    /// Connection generation; bumped on every successful connect so a
    /// stale replay timer from an abandoned connection is a no-op.
    generation: AtomicU64,
}

impl<S: EventSink + 'static> FeedClient<S> {
    /// Create a new feed client.
    #[must_use]
    pub fn new(
        settings: FeedSettings,
        registry: Arc<SubscriptionRegistry>,
        sink: Arc<S>,
        stats: Arc<BridgeStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            codec: FeedCodec::new(),
            registry,
            sink,
            stats,
            cancel,
            generation: AtomicU64::new(0),
        }
    }

    /// Run the connection lifecycle until shutdown.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice: every connection-level error
    /// routes through backoff or parking. The `Result` is kept for the
    /// caller's error-logging path.
    pub async fn run(
        self: Arc<Self>,
        mut commands: mpsc::Receiver<FeedCommand>,
    ) -> Result<(), FeedClientError> {
        let mut policy = ReconnectPolicy::new(self.settings.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Feed client cancelled");
                self.stats.set_state(ConnectionState::Closing);
                return Ok(());
            }

            if self.settings.stream_url().is_none() {
                tracing::error!(
                    "FEED_TOKEN is not configured; feed parked until configuration \
                     is fixed and a restart is issued"
                );
                self.stats.mark_disconnected();
                match self.wait_for_restart(&mut commands).await {
                    WaitOutcome::Restart | WaitOutcome::Elapsed => continue,
                    WaitOutcome::Shutdown => return Ok(()),
                }
            }

            match self.connect_and_run(&mut commands, &mut policy).await {
                Ok(()) => {
                    tracing::info!("Feed connection closed gracefully");
                    return Ok(());
                }
                Err(FeedClientError::RestartRequested) => {
                    tracing::info!("Manual restart requested; re-arming connection");
                    self.stats.mark_disconnected();
                    metrics::set_feed_connected(false);
                    policy.reset();
                    self.stats.set_reconnect_attempts(0);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Feed connection error");
                    self.stats.mark_disconnected();
                    metrics::set_feed_connected(false);

                    if let Some(delay) = policy.next_delay() {
                        let attempt = policy.attempt_count();
                        self.stats.set_reconnect_attempts(attempt);
                        metrics::record_reconnect();
                        tracing::info!(
                            attempt,
                            delay_ms = delay.as_millis(),
                            "Reconnecting to feed"
                        );

                        match self.backoff_wait(&mut commands, delay).await {
                            WaitOutcome::Elapsed => {}
                            WaitOutcome::Restart => {
                                policy.reset();
                                self.stats.set_reconnect_attempts(0);
                            }
                            WaitOutcome::Shutdown => return Ok(()),
                        }
                    } else {
                        tracing::error!(
                            attempts = policy.attempt_count(),
                            "Reconnect ceiling reached; manual restart required"
                        );
                        match self.wait_for_restart(&mut commands).await {
                            WaitOutcome::Restart | WaitOutcome::Elapsed => {
                                policy.reset();
                                self.stats.set_reconnect_attempts(0);
                            }
                            WaitOutcome::Shutdown => return Ok(()),
                        }
                    }
                }
            }
        }
    }

    /// Connect to the feed and process frames until error, restart, or
    /// cancellation.
    async fn connect_and_run(
        &self,
        commands: &mut mpsc::Receiver<FeedCommand>,
        policy: &mut ReconnectPolicy,
    ) -> Result<(), FeedClientError> {
        let url = self.settings.stream_url().ok_or_else(|| {
            FeedClientError::ConnectionFailed("feed credential is not configured".to_string())
        })?;

        self.stats.set_state(ConnectionState::Connecting);
        tracing::info!(url = %self.settings.url, "Connecting to news feed");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&url).await?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        policy.reset();
        self.stats.set_reconnect_attempts(0);
        self.stats.mark_connected();
        metrics::set_feed_connected(true);
        tracing::info!("Feed connected");

        let (mut write, mut read) = ws_stream.split();

        // One-shot subscription replay. The delay exists because the
        // upstream drops subscribe requests sent immediately after the
        // handshake; the generation guard makes a stale timer a no-op.
        // The receiver is disarmed once the timer fires so the spent
        // channel cannot keep waking the select loop.
        let (replay_tx, replay_rx) = oneshot::channel::<u64>();
        let replay_delay = self.settings.replay_delay;
        tokio::spawn(async move {
            tokio::time::sleep(replay_delay).await;
            let _ = replay_tx.send(generation);
        });
        let mut replay_rx = Some(replay_rx);

        let mut keepalive = KeepaliveTracker::new();
        let mut ping_interval = tokio::time::interval(self.settings.keepalive.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.stats.set_state(ConnectionState::Closing);
                    if let Err(e) = write.send(close_frame("shutdown")).await {
                        tracing::debug!(error = %e, "Close frame send failed");
                    }
                    return Ok(());
                }
                fired = async {
                    match replay_rx.as_mut() {
                        Some(rx) => rx.await.ok(),
                        None => None,
                    }
                }, if replay_rx.is_some() => {
                    replay_rx = None;
                    self.maybe_replay(fired, &mut write).await?;
                }
                _ = ping_interval.tick() => {
                    if keepalive.timed_out(self.settings.keepalive.pong_timeout) {
                        tracing::warn!("Keep-alive timeout; connection is half-open");
                        return Err(FeedClientError::KeepaliveTimeout);
                    }
                    write.send(Message::Ping(vec![].into())).await?;
                    keepalive.mark_ping_sent();
                }
                cmd = commands.recv() => {
                    match cmd {
                        Some(FeedCommand::Subscribe(symbol)) => {
                            self.send_control(&mut write, &OutboundFrame::subscribe(symbol))
                                .await?;
                        }
                        Some(FeedCommand::Unsubscribe(symbol)) => {
                            self.send_control(&mut write, &OutboundFrame::unsubscribe(symbol))
                                .await?;
                        }
                        Some(FeedCommand::Restart) => {
                            let _ = write.send(close_frame("restart")).await;
                            return Err(FeedClientError::RestartRequested);
                        }
                        None => {
                            // Command channel closed: the process is going down.
                            return Ok(());
                        }
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            keepalive.record_activity();
                            self.handle_frame(&text, &mut write).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            keepalive.record_activity();
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Server sent close frame");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore binary and raw frames
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("WebSocket stream ended");
                            return Err(FeedClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Handle one text frame from the feed.
    ///
    /// Parse and protocol faults are local: they bump the error
    /// counter and leave the connection open.
    async fn handle_frame<W>(&self, text: &str, write: &mut W) -> Result<(), FeedClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        match self.codec.decode(text) {
            Ok(FeedFrame::News(raw)) => {
                self.stats.increment_received();
                self.stats.record_last_message();
                metrics::record_frame_received(FrameKind::News);

                let event = CanonicalEvent::from_raw(raw, Utc::now().timestamp_millis());
                tracing::debug!(topic = %event.topic, id = %event.id, "News event received");

                // Delivery is not awaited: the read loop keeps draining
                // while the webhook call is in flight, so forwarding
                // order across events is not guaranteed.
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    let _ = sink.deliver(&event).await;
                });
            }
            Ok(FeedFrame::Ping) => {
                self.stats.increment_received();
                metrics::record_frame_received(FrameKind::Ping);
                self.send_control(write, &OutboundFrame::Pong).await?;
            }
            Ok(FeedFrame::Other { kind }) => {
                self.stats.increment_received();
                self.stats.increment_errors();
                metrics::record_frame_received(FrameKind::Other);
                metrics::record_frame_error();
                tracing::warn!(kind = %kind, "Dropping unhandled frame kind");
            }
            Err(e) => {
                self.stats.increment_errors();
                metrics::record_frame_error();
                tracing::warn!(error = %e, payload = %text, "Malformed frame");
            }
        }

        Ok(())
    }

    /// Run the delayed subscription replay, provided the firing timer
    /// belongs to the current connection and it is still connected.
    async fn maybe_replay<W>(
        &self,
        fired: Option<u64>,
        write: &mut W,
    ) -> Result<(), FeedClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let current = self.generation.load(Ordering::SeqCst);
        if fired == Some(current) && self.stats.state() == ConnectionState::Connected {
            self.replay_subscriptions(write).await?;
        }
        Ok(())
    }

    /// Replay the full registry as individual subscribe frames, in
    /// insertion order.
    async fn replay_subscriptions<W>(&self, write: &mut W) -> Result<(), FeedClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let topics = self.registry.list();
        if topics.is_empty() {
            return Ok(());
        }

        tracing::info!(count = topics.len(), "Replaying subscriptions");
        for topic in topics {
            self.send_control(write, &OutboundFrame::subscribe(topic))
                .await?;
        }
        Ok(())
    }

    /// Send one outbound control frame.
    async fn send_control<W>(
        &self,
        write: &mut W,
        frame: &OutboundFrame,
    ) -> Result<(), FeedClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let json = self.codec.encode(frame).map_err(|e| {
            FeedClientError::ConnectionFailed(format!("failed to encode control frame: {e}"))
        })?;

        write.send(Message::Text(json.into())).await.map_err(|e| {
            FeedClientError::ConnectionFailed(format!("failed to send control frame: {e}"))
        })?;

        Ok(())
    }

    /// Wait out a backoff delay, still honoring restart and shutdown.
    async fn backoff_wait(
        &self,
        commands: &mut mpsc::Receiver<FeedCommand>,
        delay: Duration,
    ) -> WaitOutcome {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return WaitOutcome::Shutdown,
                () = &mut sleep => return WaitOutcome::Elapsed,
                cmd = commands.recv() => match cmd {
                    Some(FeedCommand::Restart) => return WaitOutcome::Restart,
                    // Registry mutations already happened in the API
                    // layer; the topic set is replayed on reconnect.
                    Some(_) => {}
                    None => return WaitOutcome::Shutdown,
                }
            }
        }
    }

    /// Park until a manual restart command (or shutdown).
    async fn wait_for_restart(&self, commands: &mut mpsc::Receiver<FeedCommand>) -> WaitOutcome {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return WaitOutcome::Shutdown,
                cmd = commands.recv() => match cmd {
                    Some(FeedCommand::Restart) => return WaitOutcome::Restart,
                    Some(_) => {}
                    None => return WaitOutcome::Shutdown,
                }
            }
        }
    }
}

fn close_frame(reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: reason.into(),
    }))
}

// =============================================================================
// Tests
// =============================================================================
