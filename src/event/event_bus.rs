// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting device notifications.

use tokio::sync::broadcast;

use super::DeviceEvent;

/// Buffered notifications per subscriber.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Fan-out of [`DeviceEvent`]s to any number of subscribers.
///
/// Cloning the bus shares the underlying broadcast channel. A subscriber
/// that falls more than the capacity behind receives `RecvError::Lagged`
/// and loses the oldest notifications.
///
/// # Examples
///
/// ```
/// use dlink_dsp::event::{DeviceEvent, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DeviceEvent::Ready);
/// assert_eq!(rx.try_recv().unwrap(), DeviceEvent::Ready);
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` notifications per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Publishes a notification. Dropped silently when nobody listens.
    pub fn publish(&self, event: DeviceEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No subscribers for device event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
