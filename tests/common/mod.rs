// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport for driving a `Device` without a plug.

#![allow(dead_code)]

use std::sync::Arc;

use dlink_dsp::error::TransportError;
use dlink_dsp::protocol::{Connector, Frame, TransportEvent, TransportLink};
use dlink_dsp::{Device, DeviceConfig};
use serde_json::{Value, json};
use tokio::sync::mpsc;

pub const DEVICE_ID: &str = "B0C554AABBCC";
pub const SALT: &str = "8d1f27c6";

/// Hands the plug side of every opened link to the test.
pub struct MemoryConnector {
    plugs: mpsc::UnboundedSender<FakePlug>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FakePlug>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { plugs: tx }, rx)
    }
}

impl Connector for MemoryConnector {
    async fn connect(&self, _url: &str) -> Result<TransportLink, TransportError> {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        self.plugs
            .send(FakePlug {
                frames: out_rx,
                events: in_tx,
            })
            .map_err(|_| TransportError::ConnectionFailed("test ended".to_string()))?;
        Ok(TransportLink {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }
}

/// The plug end of one link.
pub struct FakePlug {
    pub frames: mpsc::UnboundedReceiver<Frame>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

impl FakePlug {
    /// Returns the next JSON request, skipping pings.
    pub async fn next_request(&mut self) -> Value {
        loop {
            match self.frames.recv().await {
                Some(Frame::Text(text)) => return serde_json::from_str(&text).unwrap(),
                Some(_) => {}
                None => panic!("link closed while waiting for a request"),
            }
        }
    }

    pub fn send(&self, message: Value) {
        self.events
            .send(TransportEvent::Message(message.to_string()))
            .unwrap();
    }

    /// Replies to `request`, merging `body` into `{"sequence_id": ..}`.
    pub fn reply(&self, request: &Value, body: Value) {
        let mut message = json!({"sequence_id": request["sequence_id"]});
        if let (Some(target), Value::Object(fields)) = (message.as_object_mut(), body) {
            target.extend(fields);
        }
        self.send(message);
    }

    pub fn close(&self, code: u16, reason: &str) {
        let _ = self.events.send(TransportEvent::Closed {
            code,
            reason: reason.to_string(),
        });
    }

    /// Answers the pending `sign_in`.
    pub async fn accept_sign_in(&mut self) -> Value {
        let request = self.next_request().await;
        assert_eq!(request["command"], "sign_in");
        self.reply(
            &request,
            json!({"code": 0, "salt": SALT, "device_id": DEVICE_ID, "local_cid": 4321}),
        );
        request
    }
}

/// Creates a device over an in-memory link and signs it in.
pub async fn signed_in(config: DeviceConfig) -> (Arc<Device<MemoryConnector>>, FakePlug) {
    let (connector, mut plugs) = MemoryConnector::new();
    let device = Arc::new(Device::with_connector(config, connector));

    let login = {
        let device = Arc::clone(&device);
        tokio::spawn(async move { device.login().await })
    };
    let mut plug = plugs.recv().await.unwrap();
    plug.accept_sign_in().await;
    login.await.unwrap().unwrap();

    (device, plug)
}
