// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `locmux` - share one location provider among many async consumers.
//!
//! A platform location subsystem exposes a single callback-driven delegate
//! and expensive listeners (GPS, compass, geofencing) that should run only
//! while someone is listening. This library turns that into independent
//! [`futures::Stream`]s and one-shot futures.
//!
//! # Features
//!
//! - **Multicast**: every provider callback is fanned out to all consumers
//! - **Reference-counted listeners**: a physical listener starts with its
//!   first consumer and stops with its last, per stream kind
//! - **Authorization negotiation**: permission is obtained before any
//!   listener starts, with at most one prompt per level in flight
//! - **Deadlines**: time-bounded requests yield `None` instead of failing
//!
//! # Architecture
//!
//! ```text
//! LocationProvider ──callbacks──▶ HardwareAdapter ──EventChannels──┐
//!        ▲                                                         ▼
//!        └──start/stop── SubscriptionHub ◀──attach/detach── LocationService ──▶ streams
//!                              ▲                                   │
//!                              └──────── AuthorizationNegotiator ◀─┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use futures::StreamExt;
//! use locmux::LocationService;
//! use locmux::provider::LocationProvider;
//!
//! async fn track(provider: Arc<dyn LocationProvider>) -> locmux::Result<()> {
//!     let service = LocationService::new(provider);
//!
//!     // One fix, or nothing after ten seconds.
//!     if let Some(sample) = service.single_location(Duration::from_secs(10)).await? {
//!         println!("Starting at {}", sample.coordinate);
//!     }
//!
//!     // Continuous updates until a failure or until the stream is dropped.
//!     let mut locations = service.continuous_locations();
//!     while let Some(sample) = locations.next().await {
//!         println!("Now at {}", sample?.coordinate);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber.
//! Listener start/stop is logged at `info`, subscriber counts and
//! negotiation steps at `debug`, provider failures at `warn`.

pub mod authorization;
pub mod error;
pub mod event;
pub mod provider;
pub mod race;
pub mod service;
pub mod subscription;
pub mod types;

pub use authorization::{AuthorizationNegotiator, NegotiationState};
pub use error::{AuthorizationError, Error, LocationError, Result};
pub use event::{ChannelReceiver, EventChannel, SubscriptionId};
pub use provider::{
    Accuracy, HardwareAdapter, LocationProvider, MockProvider, ProviderDelegate, ProviderSettings,
};
pub use service::{LocationService, LocationStream, ServiceConfig};
pub use subscription::{ListenerKind, SubscriberGuard, SubscriptionHub};
pub use types::{
    AuthorizationLevel, AuthorizationOutcome, AuthorizationStatus, Coordinate, Heading,
    LocationSample, Region, RegionEvent, RegionId, Visit,
};
