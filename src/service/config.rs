// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Location service configuration.

use crate::provider::ProviderSettings;
use crate::types::AuthorizationLevel;

/// Configuration for a [`LocationService`](super::LocationService).
///
/// # Examples
///
/// ```
/// use locmux::provider::{Accuracy, ProviderSettings};
/// use locmux::service::ServiceConfig;
/// use locmux::types::AuthorizationLevel;
///
/// let config = ServiceConfig::new()
///     .with_minimum_level(AuthorizationLevel::Always)
///     .with_provider_settings(ProviderSettings::new().with_accuracy(Accuracy::HundredMeters))
///     .with_last_known_fallback(true);
///
/// assert_eq!(config.minimum_level, AuthorizationLevel::Always);
/// assert!(config.fallback_to_last_known);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Level negotiated before locations, headings and visits are delivered.
    pub minimum_level: AuthorizationLevel,
    /// Level negotiated before a region is monitored.
    pub region_level: AuthorizationLevel,
    /// Settings applied to the provider at construction.
    pub provider: ProviderSettings,
    /// Whether a timed-out single location request falls back to the
    /// provider's last-known sample.
    pub fallback_to_last_known: bool,
}

impl ServiceConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level required for locations, headings and visits.
    #[must_use]
    pub fn with_minimum_level(mut self, level: AuthorizationLevel) -> Self {
        self.minimum_level = level;
        self
    }

    /// Sets the level required for region monitoring.
    #[must_use]
    pub fn with_region_level(mut self, level: AuthorizationLevel) -> Self {
        self.region_level = level;
        self
    }

    /// Sets the provider settings.
    #[must_use]
    pub fn with_provider_settings(mut self, settings: ProviderSettings) -> Self {
        self.provider = settings;
        self
    }

    /// Enables or disables the last-known fallback for single requests.
    #[must_use]
    pub fn with_last_known_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_last_known = enabled;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            minimum_level: AuthorizationLevel::WhenInUse,
            region_level: AuthorizationLevel::Always,
            provider: ProviderSettings::default(),
            fallback_to_last_known: false,
        }
    }
}
