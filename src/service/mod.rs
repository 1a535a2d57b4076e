// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The location service.
//!
//! [`LocationService`] wires the provider adapter, the authorization
//! negotiator and one subscription hub per stream kind into the public
//! operations.
//!
//! # Examples
//!
//! ## Continuous Locations
//!
//! ```no_run
//! use futures::StreamExt;
//! use locmux::provider::MockProvider;
//! use locmux::service::LocationService;
//!
//! # async fn example() {
//! let provider = MockProvider::new().into_arc();
//! let service = LocationService::new(provider);
//!
//! let mut locations = service.continuous_locations();
//! while let Some(item) = locations.next().await {
//!     match item {
//!         Ok(sample) => println!("Now at {}", sample.coordinate),
//!         Err(error) => eprintln!("Stream ended: {error}"),
//!     }
//! }
//! # }
//! ```
//!
//! ## Single Location
//!
//! ```no_run
//! use std::time::Duration;
//! use locmux::provider::MockProvider;
//! use locmux::service::LocationService;
//!
//! # async fn example() -> locmux::Result<()> {
//! let service = LocationService::new(MockProvider::new().into_arc());
//!
//! match service.single_location(Duration::from_secs(5)).await? {
//!     Some(sample) => println!("Found at {}", sample.coordinate),
//!     None => println!("No fix within five seconds"),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod location_service;

pub use config::ServiceConfig;
pub use location_service::{LocationService, LocationStream};
