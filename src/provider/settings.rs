// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static provider settings applied at service construction.

/// Desired accuracy of location samples.
///
/// Higher accuracy costs more power. The provider treats this as a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accuracy {
    /// Highest precision, with additional sensor fusion.
    BestForNavigation,
    /// Highest precision the hardware offers.
    #[default]
    Best,
    /// Within about ten meters.
    NearestTenMeters,
    /// Within about a hundred meters.
    HundredMeters,
    /// Within about a kilometer.
    Kilometer,
    /// Within about three kilometers.
    ThreeKilometers,
}

impl Accuracy {
    /// Returns the nominal accuracy in meters, or `None` for the "best"
    /// levels that have no fixed bound.
    #[must_use]
    pub const fn meters(&self) -> Option<f64> {
        match self {
            Self::BestForNavigation | Self::Best => None,
            Self::NearestTenMeters => Some(10.0),
            Self::HundredMeters => Some(100.0),
            Self::Kilometer => Some(1_000.0),
            Self::ThreeKilometers => Some(3_000.0),
        }
    }
}

/// Settings the provider is configured with before it starts.
///
/// # Examples
///
/// ```
/// use locmux::provider::{Accuracy, ProviderSettings};
///
/// let settings = ProviderSettings::new()
///     .with_accuracy(Accuracy::HundredMeters)
///     .with_distance_filter(50.0)
///     .with_background_updates(true);
///
/// assert_eq!(settings.desired_accuracy, Accuracy::HundredMeters);
/// assert_eq!(settings.distance_filter, Some(50.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Desired accuracy of samples.
    pub desired_accuracy: Accuracy,
    /// Minimum movement in meters before a new sample is delivered
    /// (None = every change).
    pub distance_filter: Option<f64>,
    /// Minimum heading change in degrees before a new reading is delivered
    /// (None = every change).
    pub heading_filter: Option<f64>,
    /// Whether updates continue while the application is in the background.
    pub allows_background_updates: bool,
    /// Whether the provider may pause updates when the device is stationary.
    pub pauses_updates_automatically: bool,
}

impl ProviderSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the desired accuracy.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.desired_accuracy = accuracy;
        self
    }

    /// Sets the distance filter in meters.
    #[must_use]
    pub fn with_distance_filter(mut self, meters: f64) -> Self {
        self.distance_filter = Some(meters);
        self
    }

    /// Sets the heading filter in degrees.
    #[must_use]
    pub fn with_heading_filter(mut self, degrees: f64) -> Self {
        self.heading_filter = Some(degrees);
        self
    }

    /// Allows or forbids background updates.
    #[must_use]
    pub fn with_background_updates(mut self, allowed: bool) -> Self {
        self.allows_background_updates = allowed;
        self
    }

    /// Allows or forbids automatic pausing.
    #[must_use]
    pub fn with_automatic_pausing(mut self, enabled: bool) -> Self {
        self.pauses_updates_automatically = enabled;
        self
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            desired_accuracy: Accuracy::Best,
            distance_filter: None,
            heading_filter: None,
            allows_background_updates: false,
            pauses_updates_automatically: true,
        }
    }
}
