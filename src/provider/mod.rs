// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary with the platform location provider.
//!
//! The provider is an external collaborator. This module describes what the
//! library needs from it ([`LocationProvider`]), what it calls back into
//! ([`ProviderDelegate`]), and the single adapter that turns those callbacks
//! into multicast channels ([`HardwareAdapter`]).
//!
//! # Architecture
//!
//! ```text
//! Platform provider (one serial callback queue)
//!          ↓ ProviderDelegate::did_*
//!   HardwareAdapter (Weak, installed as the sole delegate)
//!          ↓ publish
//!   EventChannel per notification kind (entries and exits share one)
//!          ↓ attach
//!   Streams built by LocationService
//! ```

mod adapter;
mod mock;
mod settings;

use std::sync::Weak;

use crate::error::LocationError;
use crate::types::{
    AuthorizationLevel, AuthorizationStatus, Heading, LocationSample, Region, RegionId, Visit,
};

pub use adapter::HardwareAdapter;
pub use mock::{MockProvider, ProviderCall};
pub use settings::{Accuracy, ProviderSettings};

/// The platform location provider, as consumed by this library.
///
/// Implementations wrap the real platform API. All methods are synchronous
/// and cheap; results arrive later through the installed
/// [`ProviderDelegate`].
///
/// Start/stop pairs are driven only by the library's subscription hubs,
/// which guarantee they are never called twice in a row in the same
/// direction.
pub trait LocationProvider: Send + Sync {
    /// Installs the sole callback target. Replaces any previous one.
    fn set_delegate(&self, delegate: Weak<dyn ProviderDelegate>);

    /// Applies static settings. Called once, before any start.
    fn configure(&self, _settings: &ProviderSettings) {}

    /// Returns the current permission status.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Asks the platform for the given level.
    ///
    /// Fire-and-forget: the answer arrives through
    /// [`ProviderDelegate::did_change_authorization`]. Providers typically
    /// report the unchanged status right away, before the user answers.
    fn request_authorization(&self, level: AuthorizationLevel);

    /// Returns the most recent cached sample, if any.
    fn last_known_location(&self) -> Option<LocationSample>;

    /// Returns true if [`request_one_shot_location`](Self::request_one_shot_location)
    /// is supported.
    fn supports_one_shot(&self) -> bool {
        false
    }

    /// Requests exactly one location delivery.
    ///
    /// Only called when [`supports_one_shot`](Self::supports_one_shot)
    /// returns true.
    fn request_one_shot_location(&self) {}

    /// Abandons an outstanding one-shot request.
    ///
    /// Called when the caller stops waiting before a sample arrived.
    fn cancel_one_shot_location(&self) {}

    /// Starts continuous location updates.
    fn start_updates(&self);
    /// Stops continuous location updates.
    fn stop_updates(&self);

    /// Starts compass updates.
    fn start_heading(&self);
    /// Stops compass updates.
    fn stop_heading(&self);

    /// Starts visit monitoring.
    fn start_visit_monitoring(&self);
    /// Stops visit monitoring.
    fn stop_visit_monitoring(&self);

    /// Starts monitoring a geofence.
    fn start_region_monitoring(&self, region: &Region);
    /// Stops monitoring a geofence.
    fn stop_region_monitoring(&self, region: &Region);
}

/// Callback surface of the provider.
///
/// The provider delivers one notification at a time from a single queue.
pub trait ProviderDelegate: Send + Sync {
    /// The permission status changed (or was re-reported unchanged).
    fn did_change_authorization(&self, status: AuthorizationStatus);
    /// A batch of samples arrived, oldest first.
    fn did_update_locations(&self, samples: Vec<LocationSample>);
    /// A compass reading arrived.
    fn did_update_heading(&self, heading: Heading);
    /// A visit was detected.
    fn did_visit(&self, visit: Visit);
    /// The device entered a monitored region.
    fn did_enter_region(&self, region: RegionId);
    /// The device left a monitored region.
    fn did_exit_region(&self, region: RegionId);
    /// The provider failed.
    fn did_fail(&self, error: LocationError);
}
