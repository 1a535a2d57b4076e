// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference-counted physical listeners.
//!
//! Each stream kind (locations, heading, visits, one per monitored region)
//! has a [`SubscriptionHub`] that counts its logical subscribers and owns
//! the provider's start/stop pair for that kind. The physical listener runs
//! exactly while at least one subscriber is attached and authorization has
//! been granted.
//!
//! # Usage
//!
//! Subscribers attach through [`SubscriptionHub::attach`], which returns a
//! [`SubscriberGuard`]. Dropping the guard detaches, so a stream that ends
//! for any reason (completion, failure, cancellation) releases its count.
//!
//! ```
//! use std::sync::Arc;
//! use locmux::provider::{LocationProvider, MockProvider};
//! use locmux::subscription::{ListenerKind, SubscriptionHub};
//! use locmux::types::AuthorizationStatus;
//!
//! let provider = MockProvider::new()
//!     .with_status(AuthorizationStatus::AuthorizedWhenInUse)
//!     .into_arc();
//! let hub = Arc::new(SubscriptionHub::new(ListenerKind::Locations, provider.clone()));
//!
//! let guard = hub.attach();
//! assert!(provider.is_updating());
//!
//! drop(guard);
//! assert!(!provider.is_updating());
//! ```

mod hub;

pub use hub::{ListenerKind, SubscriberGuard, SubscriptionHub};
