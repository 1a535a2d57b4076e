// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber counting and listener start/stop decisions.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::provider::LocationProvider;
use crate::types::{AuthorizationStatus, Region};

/// The physical listener a hub controls.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerKind {
    /// Continuous location updates.
    Locations,
    /// Compass updates.
    Heading,
    /// Visit monitoring.
    Visits,
    /// Monitoring of one geofence.
    Region(Region),
}

impl ListenerKind {
    fn start(&self, provider: &dyn LocationProvider) {
        match self {
            Self::Locations => provider.start_updates(),
            Self::Heading => provider.start_heading(),
            Self::Visits => provider.start_visit_monitoring(),
            Self::Region(region) => provider.start_region_monitoring(region),
        }
    }

    fn stop(&self, provider: &dyn LocationProvider) {
        match self {
            Self::Locations => provider.stop_updates(),
            Self::Heading => provider.stop_heading(),
            Self::Visits => provider.stop_visit_monitoring(),
            Self::Region(region) => provider.stop_region_monitoring(region),
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locations => f.write_str("locations"),
            Self::Heading => f.write_str("heading"),
            Self::Visits => f.write_str("visits"),
            Self::Region(region) => write!(f, "region:{}", region.id),
        }
    }
}

#[derive(Debug, Default)]
struct HubState {
    count: usize,
    /// Sticky: once granted it is never revoked here.
    authorized: bool,
    running: bool,
}

/// Counts subscribers of one stream kind and drives its physical listener.
///
/// Count changes and the start/stop decision happen under one lock, so
/// attaches and detaches from any thread can neither double-start nor
/// double-stop the listener. After every change the listener is running
/// if and only if `count > 0` and authorization has been granted.
pub struct SubscriptionHub {
    kind: ListenerKind,
    provider: Arc<dyn LocationProvider>,
    state: Mutex<HubState>,
}

impl SubscriptionHub {
    /// Creates an idle hub for the given listener.
    #[must_use]
    pub fn new(kind: ListenerKind, provider: Arc<dyn LocationProvider>) -> Self {
        let authorized = provider.authorization_status().is_authorized();
        Self {
            kind,
            provider,
            state: Mutex::new(HubState {
                authorized,
                ..HubState::default()
            }),
        }
    }

    /// Attaches a subscriber and returns the guard that detaches it on drop.
    #[must_use]
    pub fn attach(self: &Arc<Self>) -> SubscriberGuard {
        self.on_subscriber_attached();
        SubscriberGuard {
            hub: Arc::clone(self),
        }
    }

    /// Increments the count, starting the listener on the 0→1 transition
    /// when authorized.
    ///
    /// Prefer [`attach`](Self::attach), which pairs this with a detach.
    pub fn on_subscriber_attached(&self) {
        let mut state = self.state.lock();
        let from = state.count;
        state.count += 1;
        tracing::debug!(kind = %self.kind, from, to = state.count, "Subscriber count changed");

        if !state.authorized {
            state.authorized = self.provider.authorization_status().is_authorized();
        }
        self.reconcile(&mut state);
    }

    /// Decrements the count, stopping the listener on the 1→0 transition.
    pub fn on_subscriber_detached(&self) {
        let mut state = self.state.lock();
        if state.count == 0 {
            tracing::warn!(kind = %self.kind, "Detach without matching attach, ignoring");
            return;
        }
        let from = state.count;
        state.count -= 1;
        tracing::debug!(kind = %self.kind, from, to = state.count, "Subscriber count changed");

        self.reconcile(&mut state);
    }

    /// Records a new authorization status, starting the listener if
    /// subscribers were waiting for it.
    ///
    /// A status without a level does not revoke an earlier grant; failures
    /// after a revocation arrive through the provider's failure callback.
    pub fn on_authorization_changed(&self, status: AuthorizationStatus) {
        let mut state = self.state.lock();
        if status.is_authorized() && !state.authorized {
            tracing::debug!(kind = %self.kind, ?status, "Listener authorized");
            state.authorized = true;
        }
        self.reconcile(&mut state);
    }

    fn reconcile(&self, state: &mut HubState) {
        let should_run = state.count > 0 && state.authorized;

        if should_run && !state.running {
            tracing::info!(kind = %self.kind, subscribers = state.count, "Starting listener");
            self.kind.start(self.provider.as_ref());
            state.running = true;
        } else if !should_run && state.running {
            tracing::info!(kind = %self.kind, "Stopping listener");
            self.kind.stop(self.provider.as_ref());
            state.running = false;
        }
    }

    /// Returns the listener this hub controls.
    #[must_use]
    pub fn kind(&self) -> &ListenerKind {
        &self.kind
    }

    /// Returns the number of attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().count
    }

    /// Returns true while the physical listener is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

impl fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SubscriptionHub")
            .field("kind", &self.kind)
            .field("count", &state.count)
            .field("authorized", &state.authorized)
            .field("running", &state.running)
            .finish()
    }
}

/// Attachment to a [`SubscriptionHub`]; detaches when dropped.
#[must_use = "dropping the guard detaches the subscriber immediately"]
pub struct SubscriberGuard {
    hub: Arc<SubscriptionHub>,
}

impl SubscriberGuard {
    /// Returns the hub this guard is attached to.
    #[must_use]
    pub fn hub(&self) -> &Arc<SubscriptionHub> {
        &self.hub
    }
}

impl fmt::Debug for SubscriberGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberGuard")
            .field("kind", &self.hub.kind)
            .finish()
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.hub.on_subscriber_detached();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockProvider, ProviderCall};
    use crate::types::Coordinate;

    fn authorized_provider() -> Arc<MockProvider> {
        MockProvider::new()
            .with_status(AuthorizationStatus::AuthorizedWhenInUse)
            .into_arc()
    }

    fn hub(kind: ListenerKind, provider: &Arc<MockProvider>) -> Arc<SubscriptionHub> {
        Arc::new(SubscriptionHub::new(kind, provider.clone()))
    }

    #[test]
    fn first_attach_starts_and_last_detach_stops() {
        let provider = authorized_provider();
        let hub = hub(ListenerKind::Locations, &provider);

        let first = hub.attach();
        let second = hub.attach();
        let third = hub.attach();
        assert_eq!(hub.subscriber_count(), 3);
        assert_eq!(provider.count(&ProviderCall::StartUpdates), 1);

        drop(first);
        drop(second);
        assert!(provider.is_updating());
        assert!(hub.is_running());

        drop(third);
        assert!(!provider.is_updating());
        assert!(!hub.is_running());
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(provider.count(&ProviderCall::StopUpdates), 1);
    }

    #[test]
    fn unauthorized_attach_does_not_start() {
        let provider = MockProvider::new().into_arc();
        let hub = hub(ListenerKind::Heading, &provider);

        let guard = hub.attach();
        assert!(!provider.is_updating_heading());
        assert!(!hub.is_running());

        drop(guard);
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn authorization_change_starts_waiting_subscribers() {
        let provider = MockProvider::new().into_arc();
        let hub = hub(ListenerKind::Visits, &provider);

        let guard = hub.attach();
        hub.on_authorization_changed(AuthorizationStatus::NotDetermined);
        assert!(!provider.is_monitoring_visits());

        hub.on_authorization_changed(AuthorizationStatus::AuthorizedAlways);
        assert!(provider.is_monitoring_visits());

        // Already running: no second start.
        hub.on_authorization_changed(AuthorizationStatus::AuthorizedAlways);
        assert_eq!(provider.count(&ProviderCall::StartVisits), 1);

        drop(guard);
        assert!(!provider.is_monitoring_visits());
    }

    #[test]
    fn authorization_without_subscribers_does_not_start() {
        let provider = MockProvider::new().into_arc();
        let hub = hub(ListenerKind::Locations, &provider);

        hub.on_authorization_changed(AuthorizationStatus::AuthorizedWhenInUse);

        assert!(!hub.is_running());
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn authorization_is_not_revoked() {
        let provider = authorized_provider();
        let hub = hub(ListenerKind::Locations, &provider);
        let _guard = hub.attach();

        hub.on_authorization_changed(AuthorizationStatus::Denied);

        assert!(hub.is_running());
        assert!(provider.is_updating());
    }

    #[test]
    fn unmatched_detach_is_ignored() {
        let provider = authorized_provider();
        let hub = hub(ListenerKind::Locations, &provider);

        hub.on_subscriber_detached();

        assert_eq!(hub.subscriber_count(), 0);
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn region_hub_drives_region_monitoring() {
        let provider = authorized_provider();
        let region = Region::circle("home", Coordinate::new(0.0, 0.0), 100.0);
        let hub = hub(ListenerKind::Region(region.clone()), &provider);
        assert_eq!(hub.kind().to_string(), "region:home");

        let guard = hub.attach();
        assert!(provider.is_monitoring_region(&region.id));

        drop(guard);
        assert!(!provider.is_monitoring_region(&region.id));
    }

    #[test]
    fn concurrent_attach_detach_keeps_listener_consistent() {
        let provider = authorized_provider();
        let hub = hub(ListenerKind::Locations, &provider);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let hub = Arc::clone(&hub);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let guard = hub.attach();
                        assert!(hub.is_running());
                        drop(guard);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(hub.subscriber_count(), 0);
        assert!(!hub.is_running());
        assert!(!provider.is_updating());
        assert_eq!(
            provider.count(&ProviderCall::StartUpdates),
            provider.count(&ProviderCall::StopUpdates)
        );

        // Starts and stops strictly alternate.
        let toggles: Vec<_> = provider
            .calls()
            .into_iter()
            .filter(|c| matches!(c, ProviderCall::StartUpdates | ProviderCall::StopUpdates))
            .collect();
        for pair in toggles.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
