// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instrumented in-memory provider.
//!
//! [`MockProvider`] records every call the library makes and lets the caller
//! play the platform's part by emitting callbacks. It reproduces the
//! platform habit of re-reporting the unchanged status synchronously when
//! authorization is requested.

use std::collections::HashSet;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::LocationError;
use crate::types::{
    AuthorizationLevel, AuthorizationStatus, Heading, LocationSample, Region, RegionId, Visit,
};

use super::{LocationProvider, ProviderDelegate, ProviderSettings};

/// A call made by the library on the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    /// `configure` was called.
    Configure,
    /// `request_authorization` was called for the level.
    RequestAuthorization(AuthorizationLevel),
    /// `request_one_shot_location` was called.
    RequestOneShot,
    /// `cancel_one_shot_location` was called.
    CancelOneShot,
    /// `start_updates` was called.
    StartUpdates,
    /// `stop_updates` was called.
    StopUpdates,
    /// `start_heading` was called.
    StartHeading,
    /// `stop_heading` was called.
    StopHeading,
    /// `start_visit_monitoring` was called.
    StartVisits,
    /// `stop_visit_monitoring` was called.
    StopVisits,
    /// `start_region_monitoring` was called for the region.
    StartRegion(RegionId),
    /// `stop_region_monitoring` was called for the region.
    StopRegion(RegionId),
}

#[derive(Default)]
struct MockState {
    status: Option<AuthorizationStatus>,
    delegate: Option<Weak<dyn ProviderDelegate>>,
    calls: Vec<ProviderCall>,
    settings: Option<ProviderSettings>,
    last_known: Option<LocationSample>,
    supports_one_shot: bool,
    request_answer: Option<AuthorizationStatus>,
    one_shot_answer: Option<LocationSample>,
    updating: bool,
    heading: bool,
    visits: bool,
    regions: HashSet<RegionId>,
    started_regions: Vec<Region>,
}

/// Provider double for tests and examples.
///
/// Starts in [`AuthorizationStatus::NotDetermined`] without one-shot
/// support.
///
/// # Examples
///
/// ```
/// use locmux::provider::{LocationProvider, MockProvider, ProviderCall};
/// use locmux::types::{AuthorizationLevel, AuthorizationStatus};
///
/// let provider = MockProvider::new()
///     .answer_requests_with(AuthorizationStatus::AuthorizedWhenInUse);
///
/// provider.request_authorization(AuthorizationLevel::WhenInUse);
///
/// assert_eq!(provider.authorization_status(), AuthorizationStatus::AuthorizedWhenInUse);
/// assert_eq!(provider.authorization_requests(AuthorizationLevel::WhenInUse), 1);
/// ```
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    /// Creates a provider with an undetermined status.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Sets the initial authorization status.
    #[must_use]
    pub fn with_status(self, status: AuthorizationStatus) -> Self {
        self.state.lock().status = Some(status);
        self
    }

    /// Sets the cached last-known sample.
    #[must_use]
    pub fn with_last_known(self, sample: LocationSample) -> Self {
        self.state.lock().last_known = Some(sample);
        self
    }

    /// Enables one-shot requests, optionally answered immediately with a sample.
    #[must_use]
    pub fn with_one_shot(self, answer: Option<LocationSample>) -> Self {
        {
            let mut state = self.state.lock();
            state.supports_one_shot = true;
            state.one_shot_answer = answer;
        }
        self
    }

    /// Makes every authorization request resolve to `status` right after
    /// the unchanged status has been re-reported.
    #[must_use]
    pub fn answer_requests_with(self, status: AuthorizationStatus) -> Self {
        self.state.lock().request_answer = Some(status);
        self
    }

    /// Wraps the provider in an `Arc`.
    #[must_use]
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    // =========================================================================
    // Playing the platform
    // =========================================================================

    /// Changes the status and notifies the delegate.
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        self.state.lock().status = Some(status);
        self.notify(|d| d.did_change_authorization(status));
    }

    /// Notifies the delegate of a status without changing the stored one.
    pub fn emit_authorization(&self, status: AuthorizationStatus) {
        self.notify(|d| d.did_change_authorization(status));
    }

    /// Delivers a location batch.
    pub fn emit_locations(&self, samples: Vec<LocationSample>) {
        if let Some(last) = samples.last() {
            self.state.lock().last_known = Some(last.clone());
        }
        self.notify(|d| d.did_update_locations(samples));
    }

    /// Delivers a compass reading.
    pub fn emit_heading(&self, heading: Heading) {
        self.notify(|d| d.did_update_heading(heading));
    }

    /// Delivers a visit.
    pub fn emit_visit(&self, visit: Visit) {
        self.notify(|d| d.did_visit(visit));
    }

    /// Delivers a region entry.
    pub fn emit_region_enter(&self, region: impl Into<RegionId>) {
        let region = region.into();
        self.notify(|d| d.did_enter_region(region));
    }

    /// Delivers a region exit.
    pub fn emit_region_exit(&self, region: impl Into<RegionId>) {
        let region = region.into();
        self.notify(|d| d.did_exit_region(region));
    }

    /// Delivers a failure.
    pub fn emit_failure(&self, error: LocationError) {
        self.notify(|d| d.did_fail(error));
    }

    // The delegate runs without the state lock held so it may call back in.
    fn notify(&self, deliver: impl FnOnce(&dyn ProviderDelegate)) {
        let delegate = self.state.lock().delegate.as_ref().and_then(Weak::upgrade);
        if let Some(delegate) = delegate {
            deliver(delegate.as_ref());
        }
    }

    fn record(&self, call: ProviderCall) {
        self.state.lock().calls.push(call);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Returns every call recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().calls.clone()
    }

    /// Returns how many times `call` was made.
    #[must_use]
    pub fn count(&self, call: &ProviderCall) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == call).count()
    }

    /// Returns how many authorization requests were made for `level`.
    #[must_use]
    pub fn authorization_requests(&self, level: AuthorizationLevel) -> usize {
        self.count(&ProviderCall::RequestAuthorization(level))
    }

    /// Returns the settings passed to `configure`, if any.
    #[must_use]
    pub fn settings(&self) -> Option<ProviderSettings> {
        self.state.lock().settings.clone()
    }

    /// Returns true while a live delegate is installed.
    #[must_use]
    pub fn has_delegate(&self) -> bool {
        self.state
            .lock()
            .delegate
            .as_ref()
            .is_some_and(|d| d.strong_count() > 0)
    }

    /// Returns true while continuous updates are running.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.state.lock().updating
    }

    /// Returns true while compass updates are running.
    #[must_use]
    pub fn is_updating_heading(&self) -> bool {
        self.state.lock().heading
    }

    /// Returns true while visit monitoring is running.
    #[must_use]
    pub fn is_monitoring_visits(&self) -> bool {
        self.state.lock().visits
    }

    /// Returns every region passed to `start_region_monitoring`, in order.
    #[must_use]
    pub fn started_regions(&self) -> Vec<Region> {
        self.state.lock().started_regions.clone()
    }

    /// Returns true while the region is monitored.
    #[must_use]
    pub fn is_monitoring_region(&self, id: &RegionId) -> bool {
        self.state.lock().regions.contains(id)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockProvider")
            .field("status", &state.status)
            .field("calls", &state.calls.len())
            .field("updating", &state.updating)
            .finish_non_exhaustive()
    }
}

impl LocationProvider for MockProvider {
    fn set_delegate(&self, delegate: Weak<dyn ProviderDelegate>) {
        self.state.lock().delegate = Some(delegate);
    }

    fn configure(&self, settings: &ProviderSettings) {
        let mut state = self.state.lock();
        state.settings = Some(settings.clone());
        state.calls.push(ProviderCall::Configure);
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.state
            .lock()
            .status
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    fn request_authorization(&self, level: AuthorizationLevel) {
        self.record(ProviderCall::RequestAuthorization(level));

        // The platform re-reports the current status before the user answers.
        let current = self.authorization_status();
        self.emit_authorization(current);

        let answer = self.state.lock().request_answer;
        if let Some(answer) = answer
            && current.is_not_determined()
        {
            self.set_authorization(answer);
        }
    }

    fn last_known_location(&self) -> Option<LocationSample> {
        self.state.lock().last_known.clone()
    }

    fn supports_one_shot(&self) -> bool {
        self.state.lock().supports_one_shot
    }

    fn request_one_shot_location(&self) {
        self.record(ProviderCall::RequestOneShot);
        let answer = self.state.lock().one_shot_answer.clone();
        if let Some(sample) = answer {
            self.emit_locations(vec![sample]);
        }
    }

    fn cancel_one_shot_location(&self) {
        self.record(ProviderCall::CancelOneShot);
    }

    fn start_updates(&self) {
        let mut state = self.state.lock();
        state.updating = true;
        state.calls.push(ProviderCall::StartUpdates);
    }

    fn stop_updates(&self) {
        let mut state = self.state.lock();
        state.updating = false;
        state.calls.push(ProviderCall::StopUpdates);
    }

    fn start_heading(&self) {
        let mut state = self.state.lock();
        state.heading = true;
        state.calls.push(ProviderCall::StartHeading);
    }

    fn stop_heading(&self) {
        let mut state = self.state.lock();
        state.heading = false;
        state.calls.push(ProviderCall::StopHeading);
    }

    fn start_visit_monitoring(&self) {
        let mut state = self.state.lock();
        state.visits = true;
        state.calls.push(ProviderCall::StartVisits);
    }

    fn stop_visit_monitoring(&self) {
        let mut state = self.state.lock();
        state.visits = false;
        state.calls.push(ProviderCall::StopVisits);
    }

    fn start_region_monitoring(&self, region: &Region) {
        let mut state = self.state.lock();
        state.regions.insert(region.id.clone());
        state.started_regions.push(region.clone());
        state.calls.push(ProviderCall::StartRegion(region.id.clone()));
    }

    fn stop_region_monitoring(&self, region: &Region) {
        let mut state = self.state.lock();
        state.regions.remove(&region.id);
        state.calls.push(ProviderCall::StopRegion(region.id.clone()));
    }
}
