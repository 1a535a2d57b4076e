// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types exchanged with the location provider.
//!
//! # Types
//!
//! - [`AuthorizationLevel`] - Ordered access levels (`WhenInUse < Always`)
//! - [`AuthorizationStatus`] - Raw permission status reported by the provider
//! - [`LocationSample`] - A timestamped position
//! - [`Heading`] - A compass reading
//! - [`Visit`] - A place the user stayed at
//! - [`Region`] / [`RegionEvent`] - Geofences and their transitions

mod authorization;
mod location;

pub use authorization::{AuthorizationLevel, AuthorizationOutcome, AuthorizationStatus};
pub use location::{Coordinate, Heading, LocationSample, Region, RegionEvent, RegionId, Visit};
