// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multicast event channels.
//!
//! An [`EventChannel`] turns a single producer into many independent
//! consumers. Every consumer attached with [`EventChannel::attach`] receives
//! each value published after it attached, in publish order. Nothing is
//! replayed to late consumers.
//!
//! # Examples
//!
//! ```
//! use locmux::event::EventChannel;
//!
//! # async fn example() {
//! let channel = EventChannel::new("heading");
//!
//! let mut first = channel.attach();
//! channel.publish(1);
//!
//! // Attaching later does not replay `1`.
//! let mut second = channel.attach();
//! channel.publish(2);
//!
//! assert_eq!(first.recv().await, Some(1));
//! assert_eq!(first.recv().await, Some(2));
//! assert_eq!(second.recv().await, Some(2));
//! # }
//! ```

mod channel;

pub use channel::{ChannelReceiver, EventChannel, SubscriptionId};
