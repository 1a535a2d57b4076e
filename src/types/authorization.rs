// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authorization levels and provider permission statuses.

use std::fmt;

use crate::error::AuthorizationError;

/// Level of location access an application can hold.
///
/// Levels are totally ordered: `WhenInUse < Always`. Holding a level
/// satisfies every request for a level less than or equal to it.
///
/// # Examples
///
/// ```
/// use locmux::types::AuthorizationLevel;
///
/// assert!(AuthorizationLevel::WhenInUse < AuthorizationLevel::Always);
/// assert!(AuthorizationLevel::Always >= AuthorizationLevel::WhenInUse);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum AuthorizationLevel {
    /// Access while the application is in use.
    WhenInUse,
    /// Access at all times, including in the background.
    Always,
}

impl AuthorizationLevel {
    /// Returns a short lowercase name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WhenInUse => "when_in_use",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for AuthorizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    /// The user refused access.
    Denied,
    /// Access is blocked by policy.
    Restricted,
    /// Access granted while the application is in use.
    AuthorizedWhenInUse,
    /// Access granted at all times.
    AuthorizedAlways,
    /// A raw status value this library does not know about.
    Unrecognized(i32),
}

impl AuthorizationStatus {
    /// Maps a raw platform status code.
    ///
    /// Codes follow the common platform numbering (0 not determined,
    /// 1 restricted, 2 denied, 3 always, 4 when in use). Anything else is
    /// kept as [`AuthorizationStatus::Unrecognized`].
    ///
    /// # Examples
    ///
    /// ```
    /// use locmux::types::AuthorizationStatus;
    ///
    /// assert_eq!(AuthorizationStatus::from_raw(4), AuthorizationStatus::AuthorizedWhenInUse);
    /// assert_eq!(AuthorizationStatus::from_raw(42), AuthorizationStatus::Unrecognized(42));
    /// ```
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::NotDetermined,
            1 => Self::Restricted,
            2 => Self::Denied,
            3 => Self::AuthorizedAlways,
            4 => Self::AuthorizedWhenInUse,
            other => Self::Unrecognized(other),
        }
    }

    /// Returns the level this status grants, if any.
    #[must_use]
    pub const fn level(&self) -> Option<AuthorizationLevel> {
        match self {
            Self::AuthorizedAlways => Some(AuthorizationLevel::Always),
            Self::AuthorizedWhenInUse => Some(AuthorizationLevel::WhenInUse),
            _ => None,
        }
    }

    /// Returns true if this status grants any level.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        self.level().is_some()
    }

    /// Returns true if the user has not been asked yet.
    #[must_use]
    pub const fn is_not_determined(&self) -> bool {
        matches!(self, Self::NotDetermined)
    }

    /// Classifies this status against a requested level.
    ///
    /// Returns `None` only for [`AuthorizationStatus::NotDetermined`], the
    /// one status that still needs a request. A granted level below the
    /// target resolves like a restriction since the provider will not
    /// upgrade it without the user.
    #[must_use]
    pub fn classify(&self, target: AuthorizationLevel) -> Option<AuthorizationOutcome> {
        match (self.level(), self) {
            (Some(level), _) if level >= target => Some(Ok(level)),
            (_, Self::NotDetermined) => None,
            (_, Self::Denied) => Some(Err(AuthorizationError::Denied)),
            (_, Self::Unrecognized(raw)) => {
                tracing::warn!(raw, "Unrecognized authorization status, treating as restricted");
                Some(Err(AuthorizationError::Restricted))
            }
            _ => Some(Err(AuthorizationError::Restricted)),
        }
    }
}

/// Result of an authorization negotiation.
///
/// Exactly one outcome is produced per request.
pub type AuthorizationOutcome = Result<AuthorizationLevel, AuthorizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(AuthorizationLevel::WhenInUse < AuthorizationLevel::Always);
        assert_eq!(
            AuthorizationLevel::WhenInUse.max(AuthorizationLevel::Always),
            AuthorizationLevel::Always
        );
    }

    #[test]
    fn status_maps_to_level() {
        assert_eq!(
            AuthorizationStatus::AuthorizedAlways.level(),
            Some(AuthorizationLevel::Always)
        );
        assert_eq!(
            AuthorizationStatus::AuthorizedWhenInUse.level(),
            Some(AuthorizationLevel::WhenInUse)
        );
        assert_eq!(AuthorizationStatus::Denied.level(), None);
        assert_eq!(AuthorizationStatus::NotDetermined.level(), None);
        assert_eq!(AuthorizationStatus::Restricted.level(), None);
    }

    #[test]
    fn from_raw_known_codes() {
        assert_eq!(
            AuthorizationStatus::from_raw(0),
            AuthorizationStatus::NotDetermined
        );
        assert_eq!(AuthorizationStatus::from_raw(1), AuthorizationStatus::Restricted);
        assert_eq!(AuthorizationStatus::from_raw(2), AuthorizationStatus::Denied);
        assert_eq!(
            AuthorizationStatus::from_raw(3),
            AuthorizationStatus::AuthorizedAlways
        );
        assert_eq!(
            AuthorizationStatus::from_raw(-1),
            AuthorizationStatus::Unrecognized(-1)
        );
    }

    #[test]
    fn classify_sufficient_level() {
        let outcome = AuthorizationStatus::AuthorizedAlways.classify(AuthorizationLevel::WhenInUse);
        assert_eq!(outcome, Some(Ok(AuthorizationLevel::Always)));
    }

    #[test]
    fn classify_insufficient_level_is_restricted() {
        let outcome =
            AuthorizationStatus::AuthorizedWhenInUse.classify(AuthorizationLevel::Always);
        assert_eq!(outcome, Some(Err(AuthorizationError::Restricted)));
    }

    #[test]
    fn classify_denied_and_restricted() {
        assert_eq!(
            AuthorizationStatus::Denied.classify(AuthorizationLevel::Always),
            Some(Err(AuthorizationError::Denied))
        );
        assert_eq!(
            AuthorizationStatus::Restricted.classify(AuthorizationLevel::WhenInUse),
            Some(Err(AuthorizationError::Restricted))
        );
    }

    #[test]
    fn classify_not_determined_needs_request() {
        assert_eq!(
            AuthorizationStatus::NotDetermined.classify(AuthorizationLevel::WhenInUse),
            None
        );
    }

    #[test]
    fn classify_unrecognized_is_restricted() {
        assert_eq!(
            AuthorizationStatus::Unrecognized(99).classify(AuthorizationLevel::WhenInUse),
            Some(Err(AuthorizationError::Restricted))
        );
    }
}
