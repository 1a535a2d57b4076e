// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Location service composition root.

use std::collections::HashMap;
use std::future::ready;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use parking_lot::Mutex;

use crate::authorization::{AuthorizationNegotiator, NegotiationState};
use crate::error::{Error, LocationError, Result};
use crate::event::ChannelReceiver;
use crate::provider::{HardwareAdapter, LocationProvider};
use crate::race;
use crate::subscription::{ListenerKind, SubscriberGuard, SubscriptionHub};
use crate::types::{
    AuthorizationLevel, AuthorizationOutcome, AuthorizationStatus, Heading, LocationSample, Region,
    RegionEvent, RegionId, Visit,
};

use super::config::ServiceConfig;

/// A stream of readings that ends with an `Err` item if it ends at all.
///
/// Dropping the stream detaches its consumer.
pub type LocationStream<T> = BoxStream<'static, Result<T>>;

/// Multiplexes one location provider among any number of consumers.
///
/// Each stream kind (locations, heading, visits, and every monitored region)
/// has its own subscriber count. The physical listener for a kind runs only
/// while at least one stream of that kind is being consumed, and only once
/// authorization was granted.
///
/// Streams are lazy: nothing happens until the first poll, which negotiates
/// authorization and then attaches. Streams keep the service internals
/// alive, so they may outlive the `LocationService` value itself.
///
/// # Examples
///
/// ```
/// use futures::StreamExt;
/// use locmux::provider::MockProvider;
/// use locmux::service::LocationService;
/// use locmux::subscription::ListenerKind;
/// use locmux::types::{AuthorizationStatus, Coordinate, LocationSample};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::new()
///     .with_status(AuthorizationStatus::AuthorizedWhenInUse)
///     .into_arc();
/// let service = LocationService::new(provider.clone());
///
/// let mut locations = service.continuous_locations();
/// let next = tokio::spawn(async move { locations.next().await });
/// while !service.is_listening(&ListenerKind::Locations) {
///     tokio::task::yield_now().await;
/// }
///
/// let taken_at = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
/// let sample = LocationSample::new(Coordinate::new(50.0, 14.0), taken_at);
/// provider.emit_locations(vec![sample.clone()]);
///
/// let received = next.await.unwrap().unwrap().unwrap();
/// assert_eq!(received, sample);
/// # }
/// ```
pub struct LocationService {
    inner: Arc<Inner>,
}

struct Inner {
    config: ServiceConfig,
    provider: Arc<dyn LocationProvider>,
    adapter: Arc<HardwareAdapter>,
    negotiator: AuthorizationNegotiator,
    locations: Arc<SubscriptionHub>,
    heading: Arc<SubscriptionHub>,
    visits: Arc<SubscriptionHub>,
    /// Region hubs exist while their region has consumers.
    regions: Mutex<HashMap<RegionId, Arc<SubscriptionHub>>>,
}

enum Step<T> {
    Value(Option<T>),
    Failed(LocationError),
}

impl LocationService {
    /// Creates a service with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self::with_config(provider, ServiceConfig::default())
    }

    /// Creates a service, applies the provider settings and installs the
    /// hardware adapter as the provider's delegate.
    ///
    /// A background task forwards authorization changes to the subscription
    /// hubs. It ends once the service and all of its streams are gone.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn with_config(provider: Arc<dyn LocationProvider>, config: ServiceConfig) -> Self {
        provider.configure(&config.provider);
        let adapter = HardwareAdapter::install(provider.as_ref());
        let negotiator = AuthorizationNegotiator::new(Arc::clone(&provider), Arc::clone(&adapter));
        let hub = |kind| Arc::new(SubscriptionHub::new(kind, Arc::clone(&provider)));

        let inner = Arc::new(Inner {
            locations: hub(ListenerKind::Locations),
            heading: hub(ListenerKind::Heading),
            visits: hub(ListenerKind::Visits),
            regions: Mutex::new(HashMap::new()),
            config,
            provider,
            adapter,
            negotiator,
        });

        let changes = inner.adapter.authorization().attach();
        tokio::spawn(forward_authorization(Arc::downgrade(&inner), changes));

        tracing::info!(
            minimum_level = %inner.config.minimum_level,
            region_level = %inner.config.region_level,
            "Location service created"
        );

        Self { inner }
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    // =========================================================================
    // Streams
    // =========================================================================

    /// Streams location samples until dropped.
    ///
    /// The provider's last-known sample, if any, is delivered first. Of each
    /// batch reported by the provider only the newest sample is delivered.
    #[must_use]
    pub fn continuous_locations(&self) -> LocationStream<LocationSample> {
        monitored(
            Arc::clone(&self.inner),
            self.inner.config.minimum_level,
            ListenerKind::Locations,
            |inner| {
                let replay = stream::iter(inner.provider.last_known_location());
                let live = inner
                    .adapter
                    .locations()
                    .attach()
                    .filter_map(|batch| ready(batch.into_iter().last()));
                replay.chain(live).boxed()
            },
        )
    }

    /// Streams location samples, yielding a single `None` if nothing has
    /// arrived within `timeout` of the first poll.
    ///
    /// Samples keep flowing after the `None` marker.
    #[must_use]
    pub fn continuous_locations_with_deadline(
        &self,
        timeout: Duration,
    ) -> LocationStream<Option<LocationSample>> {
        race::mark_absence(self.continuous_locations(), timeout).boxed()
    }

    /// Streams compass readings until dropped.
    #[must_use]
    pub fn heading_updates(&self) -> LocationStream<Heading> {
        monitored(
            Arc::clone(&self.inner),
            self.inner.config.minimum_level,
            ListenerKind::Heading,
            |inner| inner.adapter.heading().attach().boxed(),
        )
    }

    /// Streams detected visits until dropped.
    #[must_use]
    pub fn visits(&self) -> LocationStream<Visit> {
        monitored(
            Arc::clone(&self.inner),
            self.inner.config.minimum_level,
            ListenerKind::Visits,
            |inner| inner.adapter.visits().attach().boxed(),
        )
    }

    /// Streams entry and exit events for `region` until dropped.
    ///
    /// Monitors of the same region id share one subscriber count. While a
    /// region is monitored the geometry of its first monitor is the one
    /// handed to the provider; once the last monitor is dropped the next one
    /// starts with its own. Events for other regions are filtered out.
    #[must_use]
    pub fn region_monitor(&self, region: Region) -> LocationStream<RegionEvent> {
        let id = region.id.clone();
        monitored(
            Arc::clone(&self.inner),
            self.inner.config.region_level,
            ListenerKind::Region(region),
            move |inner| {
                inner
                    .adapter
                    .regions()
                    .attach()
                    .filter(move |event| ready(*event.region_id() == id))
                    .boxed()
            },
        )
    }

    // =========================================================================
    // One-shot operations
    // =========================================================================

    /// Returns the first new location sample, or `None` if none arrives
    /// within `timeout`.
    ///
    /// Uses the provider's one-shot request when supported. Otherwise
    /// continuous updates are attached for the duration of the call and
    /// released afterwards (stopping the listener if this was its only
    /// consumer). An unanswered one-shot request is cancelled when the
    /// deadline passes or the future is dropped. With [`ServiceConfig::fallback_to_last_known`] a timeout
    /// returns the provider's last-known sample instead of `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authorization`] if permission is refused and
    /// [`Error::Location`] if the provider fails before a sample arrives.
    pub async fn single_location(&self, timeout: Duration) -> Result<Option<LocationSample>> {
        let inner = &self.inner;
        inner.negotiator.ensure(inner.config.minimum_level).await?;

        let mut failures = inner.adapter.failures().attach();
        let mut batches = inner.adapter.locations().attach();

        let (mut one_shot, lease) = if inner.provider.supports_one_shot() {
            tracing::debug!("Requesting one-shot location");
            inner.provider.request_one_shot_location();
            let request = OneShotRequest {
                provider: inner.provider.as_ref(),
                answered: false,
            };
            (Some(request), None)
        } else {
            (None, Some(inner.lease(&ListenerKind::Locations)))
        };

        let first_sample = async {
            loop {
                tokio::select! {
                    biased;
                    batch = batches.recv() => match batch {
                        Some(batch) => {
                            if let Some(sample) = batch.into_iter().last() {
                                return Ok(Some(sample));
                            }
                        }
                        None => return Ok(None),
                    },
                    Some(error) = failures.recv() => return Err(Error::from(error)),
                }
            }
        };

        let outcome = race::first_or_none(first_sample, timeout).await;
        if let Some(request) = &mut one_shot {
            request.answered = outcome.is_some();
        }
        drop(one_shot);
        drop(lease);

        match outcome {
            Some(result) => result,
            None if inner.config.fallback_to_last_known => {
                let fallback = inner.provider.last_known_location();
                tracing::debug!(found = fallback.is_some(), "Falling back to last known location");
                Ok(fallback)
            }
            None => Ok(None),
        }
    }

    /// Obtains `level` ahead of the first stream.
    ///
    /// # Errors
    ///
    /// Returns the refusal reported by the provider.
    pub async fn request_authorization(&self, level: AuthorizationLevel) -> AuthorizationOutcome {
        self.inner.negotiator.ensure(level).await
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns the number of attached consumers of `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: &ListenerKind) -> usize {
        self.inner
            .hub_for(kind)
            .map_or(0, |hub| hub.subscriber_count())
    }

    /// Returns true while the physical listener for `kind` is running.
    #[must_use]
    pub fn is_listening(&self, kind: &ListenerKind) -> bool {
        self.inner.hub_for(kind).is_some_and(|hub| hub.is_running())
    }

    /// Returns the authorization negotiation state.
    #[must_use]
    pub fn negotiation_state(&self) -> NegotiationState {
        self.inner.negotiator.state()
    }

    /// Returns the provider's current authorization status.
    #[must_use]
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.inner.negotiator.status()
    }
}

impl std::fmt::Debug for LocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationService")
            .field("config", &self.inner.config)
            .field("negotiator", &self.inner.negotiator)
            .field("locations", &self.inner.locations)
            .field("heading", &self.inner.heading)
            .field("visits", &self.inner.visits)
            .field("regions", &self.inner.regions.lock().len())
            .finish_non_exhaustive()
    }
}

impl Drop for LocationService {
    fn drop(&mut self) {
        tracing::debug!(
            streams_alive = Arc::strong_count(&self.inner) - 1,
            "Location service dropped"
        );
    }
}

impl Inner {
    /// Attaches one consumer to the hub for `kind`.
    ///
    /// A region hub is created on first use with the given geometry.
    fn lease(self: &Arc<Self>, kind: &ListenerKind) -> Lease {
        let guard = match kind {
            ListenerKind::Locations => self.locations.attach(),
            ListenerKind::Heading => self.heading.attach(),
            ListenerKind::Visits => self.visits.attach(),
            ListenerKind::Region(region) => {
                let mut regions = self.regions.lock();
                let hub = regions.entry(region.id.clone()).or_insert_with(|| {
                    tracing::debug!(region = %region.id, "Creating region hub");
                    Arc::new(SubscriptionHub::new(kind.clone(), Arc::clone(&self.provider)))
                });
                hub.attach()
            }
        };

        Lease {
            inner: Arc::clone(self),
            guard: Some(guard),
        }
    }

    fn hub_for(&self, kind: &ListenerKind) -> Option<Arc<SubscriptionHub>> {
        match kind {
            ListenerKind::Locations => Some(Arc::clone(&self.locations)),
            ListenerKind::Heading => Some(Arc::clone(&self.heading)),
            ListenerKind::Visits => Some(Arc::clone(&self.visits)),
            ListenerKind::Region(region) => self.regions.lock().get(&region.id).cloned(),
        }
    }

    fn hubs(&self) -> Vec<Arc<SubscriptionHub>> {
        let mut hubs = vec![
            Arc::clone(&self.locations),
            Arc::clone(&self.heading),
            Arc::clone(&self.visits),
        ];
        hubs.extend(self.regions.lock().values().cloned());
        hubs
    }
}

/// One consumer's attachment to a hub; detaches on drop.
///
/// A region hub left without consumers is removed from the service.
struct Lease {
    inner: Arc<Inner>,
    guard: Option<SubscriberGuard>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let hub = Arc::clone(guard.hub());
        let ListenerKind::Region(region) = hub.kind() else {
            return;
        };

        // Detach under the map lock so a concurrent lease cannot pick up
        // the hub between the last detach and its removal.
        let mut regions = self.inner.regions.lock();
        drop(guard);
        let current = regions
            .get(&region.id)
            .is_some_and(|registered| Arc::ptr_eq(registered, &hub));
        if current && hub.subscriber_count() == 0 {
            regions.remove(&region.id);
            tracing::debug!(region = %region.id, "Region hub released");
        }
    }
}

/// An outstanding one-shot request, cancelled on drop unless answered.
struct OneShotRequest<'a> {
    provider: &'a dyn LocationProvider,
    answered: bool,
}

impl Drop for OneShotRequest<'_> {
    fn drop(&mut self) {
        if !self.answered {
            tracing::debug!("Cancelling unanswered one-shot location request");
            self.provider.cancel_one_shot_location();
        }
    }
}

/// Builds a stream that negotiates `level`, then attaches to the hub for
/// `kind` and forwards what `attach` produces until a provider failure.
///
/// Channel attachments happen before the hub starts the listener so the
/// first delivery cannot be missed.
fn monitored<T, A>(
    inner: Arc<Inner>,
    level: AuthorizationLevel,
    kind: ListenerKind,
    attach: A,
) -> LocationStream<T>
where
    T: Send + 'static,
    A: FnOnce(&Inner) -> BoxStream<'static, T> + Send + 'static,
{
    let stream = async_stream::stream! {
        if let Err(error) = inner.negotiator.ensure(level).await {
            tracing::debug!(%kind, %error, "Stream refused");
            yield Err(Error::from(error));
            return;
        }

        let mut failures = inner.adapter.failures().attach();
        let mut values = attach(&inner);
        let lease = inner.lease(&kind);

        let failure = loop {
            // Values queued before a failure are delivered first.
            let step = tokio::select! {
                biased;
                value = values.next() => Step::Value(value),
                Some(error) = failures.recv() => Step::Failed(error),
            };

            match step {
                Step::Value(Some(value)) => yield Ok(value),
                Step::Value(None) => break None,
                Step::Failed(error) => break Some(error),
            }
        };

        // Detach before reporting so the error is the stream's last word.
        drop(lease);
        if let Some(error) = failure {
            tracing::debug!(%kind, %error, "Stream terminated by provider failure");
            yield Err(Error::from(error));
        }
    };
    stream.boxed()
}

async fn forward_authorization(
    inner: Weak<Inner>,
    mut changes: ChannelReceiver<AuthorizationStatus>,
) {
    while let Some(status) = changes.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        for hub in inner.hubs() {
            hub.on_authorization_changed(status);
        }
    }
    tracing::debug!("Authorization forwarding stopped");
}
