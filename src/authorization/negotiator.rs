// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Permission state machine.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::AuthorizationError;
use crate::provider::{HardwareAdapter, LocationProvider};
use crate::types::{AuthorizationLevel, AuthorizationOutcome, AuthorizationStatus};

/// Observable state of the negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// The user has not decided and nothing was requested yet.
    Unknown,
    /// A request for the level is outstanding.
    Requesting(AuthorizationLevel),
    /// The last negotiation ended with this outcome.
    Resolved(AuthorizationOutcome),
}

/// Obtains a sufficient authorization level from the provider.
///
/// The provider is asked at most once per target level while a request is
/// outstanding; concurrent callers for the same level share that request.
/// Requests for different levels are independent and may each prompt.
/// Providers that cannot show two prompts at once need callers to avoid
/// that combination.
pub struct AuthorizationNegotiator {
    provider: Arc<dyn LocationProvider>,
    adapter: Arc<HardwareAdapter>,
    state: Mutex<NegotiationState>,
    /// Levels with a provider request in flight.
    pending: Mutex<HashSet<AuthorizationLevel>>,
}

impl AuthorizationNegotiator {
    /// Creates a negotiator, deriving the initial state from the provider's
    /// current status.
    #[must_use]
    pub fn new(provider: Arc<dyn LocationProvider>, adapter: Arc<HardwareAdapter>) -> Self {
        let initial = match provider.authorization_status() {
            AuthorizationStatus::NotDetermined => NegotiationState::Unknown,
            AuthorizationStatus::Denied => {
                NegotiationState::Resolved(Err(AuthorizationError::Denied))
            }
            status => match status.level() {
                Some(level) => NegotiationState::Resolved(Ok(level)),
                None => NegotiationState::Resolved(Err(AuthorizationError::Restricted)),
            },
        };

        Self {
            provider,
            adapter,
            state: Mutex::new(initial),
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the current negotiation state.
    #[must_use]
    pub fn state(&self) -> NegotiationState {
        *self.state.lock()
    }

    /// Returns the provider's current status.
    #[must_use]
    pub fn status(&self) -> AuthorizationStatus {
        self.provider.authorization_status()
    }

    /// Resolves once the provider grants `target` or refuses.
    ///
    /// Returns immediately, without asking the provider, when the current
    /// status already decides the outcome. Otherwise requests `target`
    /// (unless a request for it is already in flight) and waits for the
    /// first status other than `NotDetermined`. The provider re-reports the
    /// undetermined status right after a request; that notification is
    /// discarded.
    ///
    /// Dropping the returned future abandons the wait but not the request.
    /// A later call observes whatever the provider eventually reports.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Denied`] or
    /// [`AuthorizationError::Restricted`]. Statuses that cannot be
    /// recognized and granted levels below `target` count as restricted.
    pub async fn ensure(&self, target: AuthorizationLevel) -> AuthorizationOutcome {
        // Attach before reading so a change between the read and the wait is not lost.
        let mut changes = self.adapter.authorization().attach();

        let status = self.provider.authorization_status();
        if let Some(outcome) = status.classify(target) {
            tracing::debug!(%target, ?status, "Authorization already decided");
            self.resolve(target, outcome);
            return outcome;
        }

        self.request_once(target);

        let outcome = loop {
            match changes.recv().await {
                Some(AuthorizationStatus::NotDetermined) => {
                    tracing::trace!(%target, "Discarding undetermined authorization report");
                }
                Some(status) => {
                    break status
                        .classify(target)
                        .unwrap_or(Err(AuthorizationError::Restricted));
                }
                None => {
                    // The adapter is gone; fall back to whatever the provider says now.
                    break self
                        .provider
                        .authorization_status()
                        .classify(target)
                        .unwrap_or(Err(AuthorizationError::Restricted));
                }
            }
        };

        self.resolve(target, outcome);
        outcome
    }

    fn request_once(&self, target: AuthorizationLevel) {
        let first = self.pending.lock().insert(target);
        if !first {
            tracing::debug!(%target, "Authorization request already in flight, waiting");
            return;
        }

        *self.state.lock() = NegotiationState::Requesting(target);
        tracing::debug!(%target, "Requesting authorization from provider");
        self.provider.request_authorization(target);
    }

    fn resolve(&self, target: AuthorizationLevel, outcome: AuthorizationOutcome) {
        self.pending.lock().remove(&target);
        let mut state = self.state.lock();
        if *state != NegotiationState::Resolved(outcome) {
            tracing::debug!(%target, ?outcome, "Authorization resolved");
        }
        *state = NegotiationState::Resolved(outcome);
    }
}

impl std::fmt::Debug for AuthorizationNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationNegotiator")
            .field("state", &*self.state.lock())
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}
