// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Secure socket transport and request/response correlation.
//!
//! # Layers
//!
//! - [`Connector`]: opens a transport and hands back a [`TransportLink`], a
//!   pair of channels carrying outgoing [`Frame`]s and incoming
//!   [`TransportEvent`]s. [`WssConnector`] is the production implementation
//!   over `tokio-tungstenite`.
//! - [`CommandChannel`]: owns one link, stamps requests with the envelope
//!   fields, matches replies by `sequence_id` and runs the keepalive timer.
//!
//! Keeping the transport behind channels lets tests drive a session with an
//! in-memory link.

mod channel;
mod envelope;
mod tls;
mod wss;

pub use channel::{ChannelState, CommandChannel};
pub use envelope::Envelope;
pub use tls::insecure_client_config;
pub use wss::WssConnector;

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::TransportError;

/// WebSocket close code used when the connection dropped without a close
/// frame.
pub const ABNORMAL_CLOSE: u16 = 1006;

/// A frame queued for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A JSON text message.
    Text(String),
    /// A keepalive ping carrying a small payload.
    Ping(Vec<u8>),
    /// Start a graceful close.
    Close,
    /// Tear the connection down immediately.
    Terminate,
}

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text message arrived.
    Message(String),
    /// The connection closed.
    Closed {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// The connection failed.
    Error(String),
}

/// The two ends of an open transport as seen by the command channel.
#[derive(Debug)]
pub struct TransportLink {
    /// Frames to send.
    pub outgoing: mpsc::UnboundedSender<Frame>,
    /// Events from the peer. The transport closes it after `Closed`/`Error`.
    pub incoming: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transports.
///
/// The returned future resolves once the transport is ready, or fails if it
/// errored or closed before that.
pub trait Connector: Send + Sync + 'static {
    /// Connects to `url`.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<TransportLink, TransportError>> + Send;
}
