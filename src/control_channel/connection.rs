//! The coordinator connection loop
//!
//! One task owns the socket. It reconnects forever: after every close,
//! failed attempt or missed heartbeat it waits `reconnect_delay` and dials
//! again with a fresh session id. Results that arrive while the socket is
//! down are held in a bounded FIFO and flushed once the next connection
//! opens.

use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::errors::ChannelError;
use super::messages::{Inbound, decode_inbound, encode_result};
use super::state::ChannelState;
use crate::indexer_engine::{JobQueue, JobResult};
use crate::utils::connection_url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection parameters
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub endpoint: String,
    pub token: String,
    /// Interval at which the coordinator pings
    pub heartbeat_interval: Duration,
    /// Latency allowance on top of `heartbeat_interval`
    pub heartbeat_grace: Duration,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    /// Results held while disconnected
    pub outbound_buffer: usize,
}

impl ChannelSettings {
    /// Silence longer than this terminates the connection
    #[must_use]
    pub fn heartbeat_window(&self) -> Duration {
        self.heartbeat_interval + self.heartbeat_grace
    }
}

/// Reconnecting client for the coordinator
pub struct ControlChannel {
    settings: ChannelSettings,
    queue: JobQueue,
    results: mpsc::UnboundedReceiver<JobResult>,
    results_open: bool,
    pending: VecDeque<String>,
    state: watch::Sender<ChannelState>,
}

impl ControlChannel {
    /// Route inbound jobs into `queue` and send results received on `results`
    pub fn new(
        settings: ChannelSettings,
        queue: JobQueue,
        results: mpsc::UnboundedReceiver<JobResult>,
    ) -> Self {
        let (state, _) = watch::channel(ChannelState::Closed);
        Self {
            settings,
            queue,
            results,
            results_open: true,
            pending: VecDeque::new(),
            state,
        }
    }

    /// Observe state transitions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Encoded results waiting for a connection
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Connect, serve and reconnect until the task is dropped
    pub async fn run(mut self) {
        loop {
            self.set_state(ChannelState::Connecting);
            match self.connect().await {
                Ok(socket) => {
                    self.set_state(ChannelState::Open);
                    let reason = self.serve(socket).await;
                    match reason {
                        ChannelError::HeartbeatTimeout(_) => warn!("Terminating connection: {reason}"),
                        _ => info!("Connection ended: {reason}"),
                    }
                }
                Err(e) => warn!("Connection attempt failed: {e}"),
            }
            self.set_state(ChannelState::Closed);

            info!(
                "Creating new connection in {} ms",
                self.settings.reconnect_delay.as_millis()
            );
            self.idle(self.settings.reconnect_delay).await;
        }
    }

    fn set_state(&self, next: ChannelState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!("Control channel {previous} -> {next}");
        }
    }

    async fn connect(&self) -> Result<Socket, ChannelError> {
        let session = Uuid::new_v4().to_string();
        let url = connection_url(&self.settings.endpoint, &self.settings.token, &session);
        debug!("Connecting to {} (session {session})", self.settings.endpoint);

        match tokio::time::timeout(self.settings.connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((socket, _response))) => Ok(socket),
            Ok(Err(e)) => Err(ChannelError::Connect(e.to_string())),
            Err(_) => Err(ChannelError::ConnectTimeout(
                u64::try_from(self.settings.connect_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    /// Serve one open connection; returns why it ended
    ///
    /// Returning drops both halves of the socket without a close handshake.
    async fn serve(&mut self, socket: Socket) -> ChannelError {
        let (mut sink, mut stream) = socket.split();

        let window = self.settings.heartbeat_window();
        let deadline = tokio::time::sleep(window);
        tokio::pin!(deadline);

        self.absorb_results();
        if !self.pending.is_empty() {
            info!("Flushing {} buffered results", self.pending.len());
        }
        while let Some(text) = self.pending.pop_front() {
            let sent = before_deadline(
                sink.send(Message::Text(text.clone())),
                deadline.deadline(),
                window,
            )
            .await;
            if let Err(e) = sent {
                self.pending.push_front(text);
                self.set_state(ChannelState::Closing);
                return e;
            }
        }

        let reason = loop {
            tokio::select! {
                () = &mut deadline => {
                    break ChannelError::HeartbeatTimeout(
                        u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
                    );
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        trace!("heartbeat");
                        deadline.as_mut().reset(Instant::now() + window);
                        // Push out the queued pong
                        let flushed =
                            before_deadline(sink.flush(), deadline.deadline(), window).await;
                        if let Err(e) = flushed {
                            break e;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        if self.route_inbound(&text) {
                            deadline.as_mut().reset(Instant::now() + window);
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => {
                            if self.route_inbound(&text) {
                                deadline.as_mut().reset(Instant::now() + window);
                            }
                        }
                        Err(_) => debug!("Ignoring non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break ChannelError::Disconnected,
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => break ChannelError::Protocol(e.to_string()),
                },
                result = self.results.recv(), if self.results_open => match result {
                    Some(result) => {
                        let Some(text) = self.encode(&result) else { continue };
                        let sent = before_deadline(
                            sink.send(Message::Text(text.clone())),
                            deadline.deadline(),
                            window,
                        )
                        .await;
                        if let Err(e) = sent {
                            self.buffer(text);
                            break e;
                        }
                        debug!("Sent result for {}", result.url());
                    }
                    None => {
                        debug!("Result channel closed");
                        self.results_open = false;
                    }
                },
            }
        };

        self.set_state(ChannelState::Closing);
        reason
    }

    /// Handle one inbound text frame; `true` if it was a heartbeat
    fn route_inbound(&self, text: &str) -> bool {
        match decode_inbound(text) {
            Inbound::Job(job) => {
                info!("Received {} job for {}", job.queue, job.url);
                self.queue.submit(*job);
                false
            }
            Inbound::Heartbeat => {
                trace!("heartbeat message");
                true
            }
            Inbound::Ignored(reason) => {
                warn!("Ignoring inbound message: {reason}");
                false
            }
        }
    }

    fn encode(&self, result: &JobResult) -> Option<String> {
        match encode_result(result) {
            Ok(text) => text,
            Err(e) => {
                warn!("Dropping result for {}: {e}", result.url());
                None
            }
        }
    }

    /// Hold an encoded message until the next connection
    fn buffer(&mut self, text: String) {
        if self.settings.outbound_buffer == 0 {
            warn!("Outbound buffer disabled; dropping result");
            return;
        }
        while self.pending.len() >= self.settings.outbound_buffer {
            self.pending.pop_front();
            warn!(
                "Outbound buffer full ({}), dropped oldest result",
                self.settings.outbound_buffer
            );
        }
        self.pending.push_back(text);
    }

    /// Move every result already produced into the outbound buffer
    fn absorb_results(&mut self) {
        while self.results_open {
            match self.results.try_recv() {
                Ok(result) => {
                    if let Some(text) = self.encode(&result) {
                        self.buffer(text);
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => self.results_open = false,
            }
        }
    }

    /// Wait out `delay` while buffering results
    async fn idle(&mut self, delay: Duration) {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return,
                result = self.results.recv(), if self.results_open => match result {
                    Some(result) => {
                        if let Some(text) = self.encode(&result) {
                            self.buffer(text);
                        }
                    }
                    None => self.results_open = false,
                },
            }
        }
    }
}

/// Run a socket write, failing with `HeartbeatTimeout` once `deadline` passes
///
/// A peer that stops reading blocks writes indefinitely; the heartbeat
/// deadline bounds them like it bounds silence.
async fn before_deadline<F>(write: F, deadline: Instant, window: Duration) -> Result<(), ChannelError>
where
    F: Future<Output = Result<(), tungstenite::Error>>,
{
    match tokio::time::timeout_at(deadline, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ChannelError::Protocol(e.to_string())),
        Err(_) => Err(ChannelError::HeartbeatTimeout(
            u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}
