// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request/response correlation over one secure socket connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{AbortHandle, JoinHandle};

use super::{ABNORMAL_CLOSE, Connector, Envelope, Frame, TransportEvent, TransportLink};
use crate::command::{Command, KEEP_ALIVE_PAYLOAD};
use crate::error::{Error, TransportError};
use crate::event::{DeviceEvent, EventBus};
use crate::session::Session;
use crate::state::StateChange;

/// How long `close` waits for the peer before forcing termination.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Close code reported when the client closed the connection itself.
const NORMAL_CLOSE: u16 = 1000;

type Reply = Result<Value, TransportError>;

/// Lifecycle of one connection attempt.
///
/// `Ready` is entered at most once; a closed channel is not reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not opened yet.
    Idle,
    /// `open` is in progress.
    Connecting,
    /// The transport is up.
    Ready,
    /// The transport closed or failed.
    Closed,
}

/// Sender side and pending table, guarded together so that registering a
/// request and closing the channel cannot interleave.
struct Inner {
    outgoing: Option<mpsc::UnboundedSender<Frame>>,
    pending: HashMap<u64, oneshot::Sender<Reply>>,
    keep_alive: Option<AbortHandle>,
}

/// State shared with the dispatcher and keepalive tasks.
struct Shared {
    inner: Mutex<Inner>,
    state: watch::Sender<ChannelState>,
    session: Arc<RwLock<Session>>,
    events: EventBus,
}

impl Shared {
    fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Handles one incoming text frame.
    fn dispatch(&self, text: &str) {
        let message: Value = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unparseable frame");
                return;
            }
        };

        if let Some(sequence_id) = message.get("sequence_id").and_then(Value::as_u64) {
            let waiter = self.inner.lock().pending.remove(&sequence_id);
            if let Some(waiter) = waiter {
                tracing::debug!(sequence_id, "Reply matched");
                let _ = waiter.send(Ok(message));
                return;
            }
        }

        if let Some(change) = StateChange::from_event(&message) {
            tracing::debug!(?change, "Device pushed state change");
            self.session.write().apply_change(&change);
            self.events.publish(DeviceEvent::from_change(&change));
            return;
        }

        tracing::warn!(
            sequence_id = ?message.get("sequence_id"),
            command = ?message.get("command"),
            "Ignoring frame with no pending request"
        );
    }

    /// Moves to `Closed` and fails every pending request with `error()`.
    ///
    /// Returns `false` if the channel was already closed.
    fn shutdown(&self, error: impl Fn() -> TransportError) -> bool {
        let pending = {
            let mut inner = self.inner.lock();
            if self.state() == ChannelState::Closed {
                return false;
            }
            self.state.send_replace(ChannelState::Closed);
            inner.outgoing = None;
            if let Some(keep_alive) = inner.keep_alive.take() {
                keep_alive.abort();
            }
            std::mem::take(&mut inner.pending)
        };

        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "Failing pending requests");
        }
        for waiter in pending.into_values() {
            let _ = waiter.send(Err(error()));
        }

        self.session.write().clear_handshake();
        true
    }

    /// Sends a keepalive ping if the transport is open.
    fn ping(&self) {
        let inner = self.inner.lock();
        if self.state() != ChannelState::Ready {
            return;
        }
        if let Some(outgoing) = &inner.outgoing {
            tracing::trace!("Sending keepalive");
            let _ = outgoing.send(Frame::Ping(KEEP_ALIVE_PAYLOAD.as_bytes().to_vec()));
        }
    }
}

/// One secure socket connection with sequence-id correlation and keepalive.
///
/// Requests are stamped with the [`Envelope`] fields taken from the shared
/// [`Session`]. Replies are matched by `sequence_id` in any order; frames
/// that match nothing are logged and dropped, except pushed `event` frames
/// which update the session's switch cache and are published on the
/// [`EventBus`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use dlink_dsp::command::SignInCommand;
/// use dlink_dsp::event::EventBus;
/// use dlink_dsp::protocol::{CommandChannel, WssConnector};
/// use dlink_dsp::session::Session;
/// use dlink_dsp::types::ModelVariant;
/// use parking_lot::RwLock;
///
/// # async fn example() -> dlink_dsp::Result<()> {
/// let session = Arc::new(RwLock::new(Session::new("123456", ModelVariant::Default)));
/// let channel = CommandChannel::new(session, EventBus::new(), Duration::from_secs(30));
///
/// channel
///     .open(&WssConnector::new(), "wss://192.168.1.60:8080/SwitchCamera")
///     .await?;
/// let reply = channel.send_request_await(&SignInCommand::new()).await?;
/// println!("{reply}");
/// channel.close().await;
/// # Ok(())
/// # }
/// ```
pub struct CommandChannel {
    shared: Arc<Shared>,
    keep_alive: Duration,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("state", &self.state())
            .field("keep_alive", &self.keep_alive)
            .finish_non_exhaustive()
    }
}

impl CommandChannel {
    /// Creates an idle channel.
    ///
    /// A zero `keep_alive` disables keepalive pings.
    #[must_use]
    pub fn new(session: Arc<RwLock<Session>>, events: EventBus, keep_alive: Duration) -> Self {
        let (state, _) = watch::channel(ChannelState::Idle);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    outgoing: None,
                    pending: HashMap::new(),
                    keep_alive: None,
                }),
                state,
                session,
                events,
            }),
            keep_alive,
            dispatcher: Mutex::new(None),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.shared.state()
    }

    /// Returns `true` while the transport is up.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == ChannelState::Ready
    }

    /// Returns the number of requests waiting for a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.inner.lock().pending.len()
    }

    /// Opens the transport and starts the dispatcher and keepalive tasks.
    ///
    /// Publishes [`DeviceEvent::Ready`] on success.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::AlreadyUsed` if this channel was opened
    /// before, or the connector's error if the transport fails or closes
    /// before becoming ready.
    pub async fn open<C: Connector>(&self, connector: &C, url: &str) -> Result<(), Error> {
        let claimed = self.shared.state.send_if_modified(|state| {
            if *state == ChannelState::Idle {
                *state = ChannelState::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(TransportError::AlreadyUsed.into());
        }

        let link = match connector.connect(url).await {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Secure socket failed to open");
                self.shared.state.send_replace(ChannelState::Closed);
                self.shared.events.publish(DeviceEvent::Error {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.start(link);
        tracing::debug!(url = %url, "Command channel ready");
        self.shared.events.publish(DeviceEvent::Ready);
        Ok(())
    }

    /// Installs an open link and spawns the background tasks.
    fn start(&self, link: TransportLink) {
        let TransportLink { outgoing, incoming } = link;

        {
            let mut inner = self.shared.inner.lock();
            inner.outgoing = Some(outgoing);
            self.shared.state.send_replace(ChannelState::Ready);

            if !self.keep_alive.is_zero() {
                let shared = Arc::clone(&self.shared);
                let interval = self.keep_alive;
                let task = tokio::spawn(async move {
                    loop {
                        tokio::time::sleep(interval).await;
                        shared.ping();
                    }
                });
                inner.keep_alive = Some(task.abort_handle());
            }
        }

        let shared = Arc::clone(&self.shared);
        *self.dispatcher.lock() = Some(tokio::spawn(run_dispatcher(shared, incoming)));
    }

    /// Wraps and transmits a request without waiting for the reply.
    ///
    /// Returns the sequence id assigned to the request.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NotOpen` if the channel is not ready.
    pub fn send_request<C: Command + ?Sized>(&self, command: &C) -> Result<u64, Error> {
        let inner = self.shared.inner.lock();
        let outgoing = self.ready_sender(&inner)?;
        let (sequence_id, text) = self.encode(command)?;

        outgoing
            .send(Frame::Text(text))
            .map_err(|_| TransportError::NotOpen)?;
        tracing::debug!(sequence_id, command = command.name(), "Request sent");
        Ok(sequence_id)
    }

    /// Sends a request and waits for the reply carrying the same sequence id.
    ///
    /// Waits indefinitely unless the transport closes or fails.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` describing the close or failure if the
    /// connection goes away first.
    pub async fn send_request_await<C: Command + ?Sized>(&self, command: &C) -> Result<Value, Error> {
        let (_, reply) = self.register(command)?;
        await_reply(reply).await
    }

    /// Like [`send_request_await`](Self::send_request_await) but gives up
    /// after `timeout`, dropping the pending entry.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Timeout` when the wait expires.
    pub async fn send_request_timeout<C: Command + ?Sized>(
        &self,
        command: &C,
        timeout: Duration,
    ) -> Result<Value, Error> {
        let (sequence_id, reply) = self.register(command)?;
        if let Ok(result) = tokio::time::timeout(timeout, await_reply(reply)).await {
            result
        } else {
            self.shared.inner.lock().pending.remove(&sequence_id);
            tracing::warn!(sequence_id, "Request timed out");
            Err(TransportError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)).into())
        }
    }

    /// Sends with or without a bound, depending on `timeout`.
    ///
    /// # Errors
    ///
    /// See [`send_request_await`](Self::send_request_await) and
    /// [`send_request_timeout`](Self::send_request_timeout).
    pub async fn request<C: Command + ?Sized>(
        &self,
        command: &C,
        timeout: Option<Duration>,
    ) -> Result<Value, Error> {
        match timeout {
            Some(timeout) => self.send_request_timeout(command, timeout).await,
            None => self.send_request_await(command).await,
        }
    }

    /// Sends one keepalive ping now if the transport is open.
    pub fn ping(&self) {
        self.shared.ping();
    }

    /// Closes the connection.
    ///
    /// Requests a graceful close, then forces termination if the transport
    /// has not closed within 500 ms. Stops the keepalive timer. Never fails;
    /// problems while forcing termination are logged.
    pub async fn close(&self) {
        let outgoing = {
            let mut inner = self.shared.inner.lock();
            if let Some(keep_alive) = inner.keep_alive.take() {
                keep_alive.abort();
            }
            inner.outgoing.clone()
        };

        if let Some(outgoing) = outgoing {
            if outgoing.send(Frame::Close).is_err() {
                tracing::debug!("Transport already gone when closing");
            }

            let mut state = self.shared.state.subscribe();
            let closed = tokio::time::timeout(
                CLOSE_GRACE,
                state.wait_for(|s| *s == ChannelState::Closed),
            )
            .await;

            if closed.is_err() {
                tracing::debug!("Graceful close timed out, terminating");
                if let Err(e) = outgoing.send(Frame::Terminate) {
                    tracing::warn!(error = %e, "Forced termination failed");
                }
            }
        }

        if self.shared.shutdown(|| TransportError::Closed {
            code: NORMAL_CLOSE,
            reason: "closed by client".to_string(),
        }) {
            self.shared.events.publish(DeviceEvent::Closed {
                code: NORMAL_CLOSE,
                reason: "closed by client".to_string(),
            });
        }

        if let Some(dispatcher) = self.dispatcher.lock().take() {
            dispatcher.abort();
        }
        tracing::info!("Command channel closed");
    }

    fn ready_sender<'a>(
        &self,
        inner: &'a Inner,
    ) -> Result<&'a mpsc::UnboundedSender<Frame>, TransportError> {
        match (&inner.outgoing, self.state()) {
            (Some(outgoing), ChannelState::Ready) => Ok(outgoing),
            _ => Err(TransportError::NotOpen),
        }
    }

    fn encode<C: Command + ?Sized>(&self, command: &C) -> Result<(u64, String), Error> {
        let envelope = Envelope::wrap(command.payload(), &mut self.shared.session.write());
        Ok((envelope.sequence_id, envelope.to_json()?))
    }

    /// Registers a waiter and transmits the request.
    fn register<C: Command + ?Sized>(
        &self,
        command: &C,
    ) -> Result<(u64, oneshot::Receiver<Reply>), Error> {
        let mut inner = self.shared.inner.lock();
        let outgoing = self.ready_sender(&inner)?.clone();
        let (sequence_id, text) = self.encode(command)?;

        let (tx, rx) = oneshot::channel();
        inner.pending.insert(sequence_id, tx);

        if outgoing.send(Frame::Text(text)).is_err() {
            inner.pending.remove(&sequence_id);
            return Err(TransportError::NotOpen.into());
        }
        tracing::debug!(sequence_id, command = command.name(), "Request sent, awaiting reply");
        Ok((sequence_id, rx))
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        if let Some(keep_alive) = self.shared.inner.lock().keep_alive.take() {
            keep_alive.abort();
        }
        if let Some(dispatcher) = self.dispatcher.lock().take() {
            dispatcher.abort();
        }
    }
}

async fn await_reply(reply: oneshot::Receiver<Reply>) -> Result<Value, Error> {
    match reply.await {
        Ok(Ok(message)) => Ok(message),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(TransportError::Closed {
            code: ABNORMAL_CLOSE,
            reason: "channel dropped".to_string(),
        }
        .into()),
    }
}

/// Reads transport events until the connection ends.
async fn run_dispatcher(shared: Arc<Shared>, mut incoming: mpsc::UnboundedReceiver<TransportEvent>) {
    while let Some(event) = incoming.recv().await {
        match event {
            TransportEvent::Message(text) => shared.dispatch(&text),
            TransportEvent::Closed { code, reason } => {
                tracing::info!(code, reason = %reason, "Secure socket closed");
                let error_reason = reason.clone();
                if shared.shutdown(|| TransportError::Closed {
                    code,
                    reason: error_reason.clone(),
                }) {
                    shared.events.publish(DeviceEvent::Closed { code, reason });
                }
                return;
            }
            TransportEvent::Error(message) => {
                tracing::warn!(error = %message, "Secure socket error");
                if shared.shutdown(|| TransportError::Socket(message.clone())) {
                    shared.events.publish(DeviceEvent::Error { message });
                }
                return;
            }
        }
    }

    if shared.shutdown(|| TransportError::Closed {
        code: ABNORMAL_CLOSE,
        reason: "transport dropped".to_string(),
    }) {
        shared.events.publish(DeviceEvent::Closed {
            code: ABNORMAL_CLOSE,
            reason: "transport dropped".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{SettingCommand, SignInCommand};
    use crate::types::{ModelVariant, SettingType};
    use serde_json::json;

    /// Connector handing out in-memory links; the peer ends go to the test.
    struct MemoryConnector {
        peers: mpsc::UnboundedSender<Peer>,
    }

    struct Peer {
        frames: mpsc::UnboundedReceiver<Frame>,
        events: mpsc::UnboundedSender<TransportEvent>,
    }

    impl Peer {
        async fn next_request(&mut self) -> Value {
            loop {
                match self.frames.recv().await.expect("link closed") {
                    Frame::Text(text) => return serde_json::from_str(&text).unwrap(),
                    _ => {}
                }
            }
        }

        fn reply(&self, message: Value) {
            self.events
                .send(TransportEvent::Message(message.to_string()))
                .unwrap();
        }
    }

    impl Connector for MemoryConnector {
        async fn connect(&self, _url: &str) -> Result<TransportLink, TransportError> {
            let (out_tx, out_rx) = mpsc::unbounded_channel();
            let (in_tx, in_rx) = mpsc::unbounded_channel();
            self.peers
                .send(Peer {
                    frames: out_rx,
                    events: in_tx,
                })
                .map_err(|_| TransportError::ConnectionFailed("no test".to_string()))?;
            Ok(TransportLink {
                outgoing: out_tx,
                incoming: in_rx,
            })
        }
    }

    struct FailingConnector;

    impl Connector for FailingConnector {
        async fn connect(&self, _url: &str) -> Result<TransportLink, TransportError> {
            Err(TransportError::ConnectionFailed("refused".to_string()))
        }
    }

    async fn open_channel(keep_alive: Duration) -> (CommandChannel, Peer, EventBus) {
        let (peers_tx, mut peers_rx) = mpsc::unbounded_channel();
        let connector = MemoryConnector { peers: peers_tx };
        let session = Arc::new(RwLock::new(Session::new("pin", ModelVariant::Multi)));
        let events = EventBus::new();
        let channel = CommandChannel::new(session, events.clone(), keep_alive);
        channel.open(&connector, "wss://test/SwitchCamera").await.unwrap();
        let peer = peers_rx.recv().await.unwrap();
        (channel, peer, events)
    }

    #[tokio::test]
    async fn open_publishes_ready() {
        let (peers_tx, mut peers_rx) = mpsc::unbounded_channel();
        let connector = MemoryConnector { peers: peers_tx };
        let session = Arc::new(RwLock::new(Session::new("pin", ModelVariant::Default)));
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let channel = CommandChannel::new(session, events, Duration::ZERO);

        channel.open(&connector, "wss://test").await.unwrap();
        let _peer = peers_rx.recv().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), DeviceEvent::Ready);
        assert!(channel.is_ready());
    }

    #[tokio::test]
    async fn open_twice_is_rejected() {
        let (channel, _peer, _events) = open_channel(Duration::ZERO).await;
        let (peers_tx, _peers_rx) = mpsc::unbounded_channel();
        let again = channel
            .open(&MemoryConnector { peers: peers_tx }, "wss://test")
            .await;
        assert!(matches!(
            again,
            Err(Error::Transport(TransportError::AlreadyUsed))
        ));
    }

    #[tokio::test]
    async fn failed_open_closes_channel() {
        let session = Arc::new(RwLock::new(Session::new("pin", ModelVariant::Default)));
        let channel = CommandChannel::new(session, EventBus::new(), Duration::ZERO);

        let result = channel.open(&FailingConnector, "wss://test").await;
        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::ConnectionFailed(_)))
        ));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn send_request_before_open_fails() {
        let session = Arc::new(RwLock::new(Session::new("pin", ModelVariant::Default)));
        let channel = CommandChannel::new(session, EventBus::new(), Duration::ZERO);
        let result = channel.send_request(&SignInCommand::new());
        assert!(matches!(result, Err(Error::Transport(TransportError::NotOpen))));
    }

    #[tokio::test]
    async fn send_request_returns_increasing_ids() {
        let (channel, mut peer, _events) = open_channel(Duration::ZERO).await;

        let first = channel.send_request(&SignInCommand::new()).unwrap();
        let second = channel
            .send_request(&SettingCommand::get(SettingType::Socket))
            .unwrap();
        assert!(second > first);

        let sent = peer.next_request().await;
        assert_eq!(sent["sequence_id"], first);
        assert_eq!(sent["command"], "sign_in");
        assert_eq!(sent["client_id"], "");
        assert_eq!(channel.pending_count(), 0);
    }

    #[tokio::test]
    async fn replies_are_matched_by_sequence_id() {
        let (channel, mut peer, _events) = open_channel(Duration::ZERO).await;
        let channel = Arc::new(channel);

        let first = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move {
                channel
                    .send_request_await(&SettingCommand::get(SettingType::Socket))
                    .await
            })
        };
        let s1 = peer.next_request().await["sequence_id"].as_u64().unwrap();

        let second = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move {
                channel
                    .send_request_await(&SettingCommand::get(SettingType::Led))
                    .await
            })
        };
        let s2 = peer.next_request().await["sequence_id"].as_u64().unwrap();
        assert!(s1 < s2);

        peer.reply(json!({"sequence_id": s2, "code": 0, "tag": "second"}));
        let second = second.await.unwrap().unwrap();
        assert_eq!(second["tag"], "second");

        tokio::task::yield_now().await;
        assert!(!first.is_finished());
        assert_eq!(channel.pending_count(), 1);

        peer.reply(json!({"sequence_id": s1, "code": 0, "tag": "first"}));
        let first = first.await.unwrap().unwrap();
        assert_eq!(first["tag"], "first");
        assert_eq!(channel.pending_count(), 0);
    }

    #[tokio::test]
    async fn unmatched_reply_is_ignored() {
        let (channel, mut peer, _events) = open_channel(Duration::ZERO).await;
        let channel = Arc::new(channel);

        let waiter = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { channel.send_request_await(&SignInCommand::new()).await })
        };
        let seq = peer.next_request().await["sequence_id"].as_u64().unwrap();

        peer.reply(json!({"sequence_id": seq + 1000, "code": 0}));
        peer.events
            .send(TransportEvent::Message("not json".to_string()))
            .unwrap();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        peer.reply(json!({"sequence_id": seq, "code": 0}));
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn close_event_rejects_all_pending() {
        let (channel, mut peer, events) = open_channel(Duration::ZERO).await;
        let channel = Arc::new(channel);
        let mut rx = events.subscribe();

        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let channel = Arc::clone(&channel);
                tokio::spawn(async move { channel.send_request_await(&SignInCommand::new()).await })
            })
            .collect();
        peer.next_request().await;
        peer.next_request().await;

        peer.events
            .send(TransportEvent::Closed {
                code: 4001,
                reason: "bye".to_string(),
            })
            .unwrap();

        for waiter in waiters {
            let err = waiter.await.unwrap().unwrap_err();
            assert!(matches!(
                err,
                Error::Transport(TransportError::Closed { code: 4001, .. })
            ));
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            DeviceEvent::Closed {
                code: 4001,
                reason: "bye".to_string()
            }
        );
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn socket_error_rejects_pending_with_error() {
        let (channel, mut peer, _events) = open_channel(Duration::ZERO).await;
        let channel = Arc::new(channel);

        let waiter = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { channel.send_request_await(&SignInCommand::new()).await })
        };
        peer.next_request().await;
        peer.events
            .send(TransportEvent::Error("reset by peer".to_string()))
            .unwrap();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Socket(ref m)) if m == "reset by peer"));
    }

    #[tokio::test]
    async fn pushed_event_updates_cache_and_notifies() {
        let (channel, peer, events) = open_channel(Duration::ZERO).await;
        let mut rx = events.subscribe();

        peer.reply(json!({
            "command": "event",
            "event": {"metadata": {"type": 16, "idx": 2, "value": 1}}
        }));

        assert_eq!(
            rx.recv().await.unwrap(),
            DeviceEvent::Switched { on: true, index: 2 }
        );
        assert_eq!(channel.shared.session.read().switches().socket(2), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_keep_alive_never_pings() {
        let (_channel, mut peer, _events) = open_channel(Duration::ZERO).await;

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(peer.frames.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_pings_every_interval() {
        let (_channel, mut peer, _events) = open_channel(Duration::from_secs(5)).await;

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(
            peer.frames.try_recv().unwrap(),
            Frame::Ping(KEEP_ALIVE_PAYLOAD.as_bytes().to_vec())
        );
        assert!(peer.frames.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(matches!(peer.frames.try_recv(), Ok(Frame::Ping(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_stops_after_close() {
        let (channel, mut peer, _events) = open_channel(Duration::from_secs(1)).await;

        peer.events
            .send(TransportEvent::Closed {
                code: 1000,
                reason: String::new(),
            })
            .unwrap();
        while channel.state() != ChannelState::Closed {
            tokio::task::yield_now().await;
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(frame) = peer.frames.try_recv() {
            assert!(!matches!(frame, Frame::Ping(_)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn close_forces_termination_after_grace() {
        let (channel, mut peer, _events) = open_channel(Duration::ZERO).await;

        channel.close().await;

        assert_eq!(peer.frames.recv().await, Some(Frame::Close));
        assert_eq!(peer.frames.recv().await, Some(Frame::Terminate));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn close_skips_termination_when_peer_closes() {
        let (channel, mut peer, _events) = open_channel(Duration::ZERO).await;
        let channel = Arc::new(channel);

        let closing = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { channel.close().await })
        };

        assert_eq!(peer.frames.recv().await, Some(Frame::Close));
        peer.events
            .send(TransportEvent::Closed {
                code: 1000,
                reason: String::new(),
            })
            .unwrap();
        closing.await.unwrap();

        assert_eq!(peer.frames.recv().await, None);
    }

    #[tokio::test]
    async fn timeout_unregisters_request() {
        let (channel, mut peer, _events) = open_channel(Duration::ZERO).await;

        let result = channel
            .send_request_timeout(&SignInCommand::new(), Duration::from_millis(20))
            .await;
        peer.next_request().await;

        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::Timeout(20)))
        ));
        assert_eq!(channel.pending_count(), 0);
    }
}
