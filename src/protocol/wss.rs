// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WebSocket-over-TLS transport.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector as TlsConnector, MaybeTlsStream, WebSocketStream};

use super::{ABNORMAL_CLOSE, Connector, Frame, TransportEvent, TransportLink, tls};
use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when a close frame carried no status.
const NO_STATUS_CLOSE: u16 = 1005;

/// Opens `wss://` connections to plugs, accepting self-signed certificates.
///
/// Each connection runs one reader and one writer task. The reader forwards
/// text frames and the final close or error; the writer drains the outgoing
/// queue. [`Frame::Terminate`] aborts both.
///
/// # Examples
///
/// ```no_run
/// use dlink_dsp::protocol::{Connector, Frame, WssConnector};
///
/// # async fn example() -> Result<(), dlink_dsp::error::TransportError> {
/// let link = WssConnector::new()
///     .connect("wss://192.168.1.60:8080/SwitchCamera")
///     .await?;
/// link.outgoing.send(Frame::Close).ok();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WssConnector;

impl WssConnector {
    /// Creates a connector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WssConnector {
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError> {
        if !url.starts_with("wss://") && !url.starts_with("ws://") {
            return Err(TransportError::InvalidAddress(url.to_string()));
        }

        let tls = tls::insecure_client_config()?;

        tracing::debug!(url = %url, "Connecting secure socket");
        let (stream, _response) = tokio_tungstenite::connect_async_tls_with_config(
            url,
            None,
            false,
            Some(TlsConnector::Rustls(tls)),
        )
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        tracing::debug!(url = %url, "Secure socket ready");

        let (sink, stream) = stream.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_frames(stream, in_tx.clone()));
        tokio::spawn(write_frames(sink, out_rx, in_tx, reader.abort_handle()));

        Ok(TransportLink {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}

/// Forwards incoming frames until the connection ends.
async fn read_frames(
    mut stream: SplitStream<WsStream>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let terminal = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let _ = events.send(TransportEvent::Message(text.as_str().to_string()));
            }
            Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                Ok(text) => {
                    let _ = events.send(TransportEvent::Message(text));
                }
                Err(_) => tracing::warn!(len = data.len(), "Dropping non-UTF-8 binary frame"),
            },
            Some(Ok(Message::Close(frame))) => {
                let (code, reason) = frame.map_or((NO_STATUS_CLOSE, String::new()), |f| {
                    (u16::from(f.code), f.reason.as_str().to_string())
                });
                break TransportEvent::Closed { code, reason };
            }
            Some(Ok(_)) => {
                // ping/pong; tungstenite answers pings itself
            }
            Some(Err(e)) => break TransportEvent::Error(e.to_string()),
            None => {
                break TransportEvent::Closed {
                    code: ABNORMAL_CLOSE,
                    reason: "stream ended".to_string(),
                };
            }
        }
    };
    let _ = events.send(terminal);
}

/// Sends queued frames until the queue closes or termination is requested.
async fn write_frames(
    mut sink: SplitSink<WsStream, Message>,
    mut frames: mpsc::UnboundedReceiver<Frame>,
    events: mpsc::UnboundedSender<TransportEvent>,
    reader: AbortHandle,
) {
    while let Some(frame) = frames.recv().await {
        let result = match frame {
            Frame::Text(text) => sink.send(Message::Text(text.into())).await,
            Frame::Ping(payload) => sink.send(Message::Ping(payload.into())).await,
            Frame::Close => sink.send(Message::Close(None)).await,
            Frame::Terminate => {
                reader.abort();
                let _ = events.send(TransportEvent::Closed {
                    code: ABNORMAL_CLOSE,
                    reason: "terminated".to_string(),
                });
                return;
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Secure socket write failed");
            reader.abort();
            let _ = events.send(TransportEvent::Error(e.to_string()));
            return;
        }
    }
}
