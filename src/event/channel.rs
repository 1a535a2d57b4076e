// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multicast channel with per-consumer unbounded queues.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Unique identifier for a consumer attached to an [`EventChannel`].
///
/// IDs are unique within the lifetime of the channel that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Multicast channel delivering every published value to every attached
/// consumer.
///
/// Each consumer owns an unbounded queue, so a slow consumer never loses
/// values and never slows the producer. Publishing holds the consumer table
/// lock for the whole delivery, which gives all consumers the same total
/// order even when several threads publish at once.
///
/// Consumers detach by dropping their [`ChannelReceiver`]; the channel
/// forgets them on the next publish. Dropping the channel ends every
/// consumer's sequence.
pub struct EventChannel<T> {
    /// Name used in log output.
    name: &'static str,
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Attached consumers.
    consumers: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<T>>>,
}

impl<T: Clone + Send + 'static> EventChannel<T> {
    /// Creates a channel with no consumers.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            consumers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the channel name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Attaches a new consumer.
    ///
    /// The returned receiver yields values published from now on.
    #[must_use]
    pub fn attach(&self) -> ChannelReceiver<T> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.consumers.lock().insert(id, tx);
        tracing::trace!(channel = self.name, %id, "Consumer attached");
        ChannelReceiver { id, rx }
    }

    /// Publishes a value to all attached consumers.
    ///
    /// If there are no consumers, the value is discarded.
    pub fn publish(&self, value: T) {
        let _ = self.publish_counted(value);
    }

    /// Publishes a value and returns the number of consumers that received it.
    pub fn publish_counted(&self, value: T) -> usize {
        let mut consumers = self.consumers.lock();
        consumers.retain(|id, tx| {
            let delivered = tx.send(value.clone()).is_ok();
            if !delivered {
                tracing::trace!(channel = self.name, %id, "Dropping detached consumer");
            }
            delivered
        });
        tracing::trace!(
            channel = self.name,
            consumers = consumers.len(),
            "Published value"
        );
        consumers.len()
    }

    /// Returns the number of consumers still attached.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut consumers = self.consumers.lock();
        consumers.retain(|_, tx| !tx.is_closed());
        consumers.len()
    }
}

impl<T> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("consumers", &self.consumers.lock().len())
            .finish()
    }
}

/// Consumer side of an [`EventChannel`].
///
/// Yields values in publish order and ends (`None`) once the channel has
/// been dropped and all queued values have been consumed. The sequence
/// cannot be restarted; attach again for a new one.
#[derive(Debug)]
pub struct ChannelReceiver<T> {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> ChannelReceiver<T> {
    /// Returns the subscription ID of this consumer.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next value.
    ///
    /// Returns `None` once the channel is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Returns the next queued value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> futures::Stream for ChannelReceiver<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
