// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapter from provider callbacks to multicast channels.

use std::sync::Arc;

use crate::error::LocationError;
use crate::event::EventChannel;
use crate::types::{AuthorizationStatus, Heading, LocationSample, RegionEvent, RegionId, Visit};

use super::{LocationProvider, ProviderDelegate};

/// The single point of contact with the provider's callbacks.
///
/// On [`install`](Self::install) the adapter registers itself as the
/// provider's delegate (through a weak reference, so dropping the adapter
/// silences the provider) and exposes one [`EventChannel`] per notification
/// kind. Callbacks only publish; no decisions are made here.
#[derive(Debug)]
pub struct HardwareAdapter {
    authorization: EventChannel<AuthorizationStatus>,
    locations: EventChannel<Vec<LocationSample>>,
    heading: EventChannel<Heading>,
    visits: EventChannel<Visit>,
    /// Entries and exits share one channel to keep their relative order.
    regions: EventChannel<RegionEvent>,
    failures: EventChannel<LocationError>,
}

impl HardwareAdapter {
    /// Creates an adapter and installs it as the provider's delegate.
    #[must_use]
    pub fn install(provider: &dyn LocationProvider) -> Arc<Self> {
        let adapter = Arc::new(Self {
            authorization: EventChannel::new("authorization"),
            locations: EventChannel::new("locations"),
            heading: EventChannel::new("heading"),
            visits: EventChannel::new("visits"),
            regions: EventChannel::new("regions"),
            failures: EventChannel::new("failures"),
        });

        let delegate = Arc::downgrade(&adapter);
        provider.set_delegate(delegate);
        tracing::debug!("Hardware adapter installed as provider delegate");

        adapter
    }

    /// Authorization status changes.
    #[must_use]
    pub fn authorization(&self) -> &EventChannel<AuthorizationStatus> {
        &self.authorization
    }

    /// Location batches, oldest sample first.
    #[must_use]
    pub fn locations(&self) -> &EventChannel<Vec<LocationSample>> {
        &self.locations
    }

    /// Compass readings.
    #[must_use]
    pub fn heading(&self) -> &EventChannel<Heading> {
        &self.heading
    }

    /// Detected visits.
    #[must_use]
    pub fn visits(&self) -> &EventChannel<Visit> {
        &self.visits
    }

    /// Region entries and exits, in the order the provider reported them.
    #[must_use]
    pub fn regions(&self) -> &EventChannel<RegionEvent> {
        &self.regions
    }

    /// Provider failures.
    #[must_use]
    pub fn failures(&self) -> &EventChannel<LocationError> {
        &self.failures
    }
}

impl ProviderDelegate for HardwareAdapter {
    fn did_change_authorization(&self, status: AuthorizationStatus) {
        tracing::debug!(?status, "Provider reported authorization status");
        self.authorization.publish(status);
    }

    fn did_update_locations(&self, samples: Vec<LocationSample>) {
        self.locations.publish(samples);
    }

    fn did_update_heading(&self, heading: Heading) {
        self.heading.publish(heading);
    }

    fn did_visit(&self, visit: Visit) {
        self.visits.publish(visit);
    }

    fn did_enter_region(&self, region: RegionId) {
        self.regions.publish(RegionEvent::Enter(region));
    }

    fn did_exit_region(&self, region: RegionId) {
        self.regions.publish(RegionEvent::Exit(region));
    }

    fn did_fail(&self, error: LocationError) {
        tracing::warn!(code = error.code(), "Provider reported a failure");
        self.failures.publish(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::types::Coordinate;
    use chrono::DateTime;

    fn sample(lat: f64) -> LocationSample {
        LocationSample::new(
            Coordinate::new(lat, 0.0),
            DateTime::from_timestamp(0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn provider_callbacks_reach_matching_channel() {
        let provider = MockProvider::new();
        let adapter = HardwareAdapter::install(&provider);

        let mut locations = adapter.locations().attach();
        let mut failures = adapter.failures().attach();
        let mut regions = adapter.regions().attach();

        provider.emit_locations(vec![sample(1.0), sample(2.0)]);
        provider.emit_failure(LocationError::ProviderFailure(1));
        provider.emit_region_enter("home");
        provider.emit_region_exit("work");

        assert_eq!(locations.recv().await, Some(vec![sample(1.0), sample(2.0)]));
        assert_eq!(
            failures.recv().await,
            Some(LocationError::ProviderFailure(1))
        );
        assert_eq!(
            regions.recv().await,
            Some(RegionEvent::Enter(RegionId::from("home")))
        );
        assert_eq!(
            regions.recv().await,
            Some(RegionEvent::Exit(RegionId::from("work")))
        );
    }

    #[tokio::test]
    async fn interleaved_region_transitions_keep_provider_order() {
        let provider = MockProvider::new();
        let adapter = HardwareAdapter::install(&provider);
        let mut regions = adapter.regions().attach();

        provider.emit_region_exit("home");
        provider.emit_region_exit("home");
        provider.emit_region_enter("home");
        provider.emit_region_enter("home");

        let home = RegionId::from("home");
        let mut received = Vec::new();
        while let Some(event) = regions.try_recv() {
            received.push(event);
        }
        assert_eq!(
            received,
            vec![
                RegionEvent::Exit(home.clone()),
                RegionEvent::Exit(home.clone()),
                RegionEvent::Enter(home.clone()),
                RegionEvent::Enter(home),
            ]
        );
    }

    #[tokio::test]
    async fn authorization_changes_are_published() {
        let provider = MockProvider::new();
        let adapter = HardwareAdapter::install(&provider);
        let mut statuses = adapter.authorization().attach();

        provider.set_authorization(AuthorizationStatus::AuthorizedAlways);

        assert_eq!(
            statuses.recv().await,
            Some(AuthorizationStatus::AuthorizedAlways)
        );
    }

    #[test]
    fn dropped_adapter_silences_provider() {
        let provider = MockProvider::new();
        let adapter = HardwareAdapter::install(&provider);
        assert!(provider.has_delegate());

        drop(adapter);
        assert!(!provider.has_delegate());

        // Emitting without a live delegate is a no-op.
        provider.emit_locations(vec![sample(0.0)]);
    }
}
