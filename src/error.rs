// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `locmux` library.
//!
//! Failures are split by origin: the user refused access
//! ([`AuthorizationError`]) or the provider reported a failure while
//! delivering data ([`LocationError`]). Both terminate the stream that
//! observes them. A request that simply runs out of time is not an error
//! and is reported as `None` by the operations that race a deadline.

use thiserror::Error;

/// The main error type for this library.
///
/// Stream items carry this type in their `Err` position. An `Err` item is
/// always the last item a stream yields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Authorization negotiation ended without a sufficient level.
    #[error("authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// The provider reported a failure.
    #[error("location error: {0}")]
    Location(#[from] LocationError),
}

impl Error {
    /// Returns true if this error came from authorization negotiation.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }

    /// Returns true if this error was reported by the provider.
    #[must_use]
    pub fn is_location(&self) -> bool {
        matches!(self, Self::Location(_))
    }
}

/// Terminal outcomes of a failed authorization negotiation.
///
/// Neither is retried automatically. The provider does not prompt again once
/// the user has decided, so recovering requires the user to change the
/// setting outside of this library.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationError {
    /// The user denied access.
    #[error("location access denied")]
    Denied,

    /// Access is restricted (parental controls, device policy, or a status
    /// that could not be recognized).
    #[error("location access restricted")]
    Restricted,
}

/// Errors reported by the location provider.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationError {
    /// The provider failed with the given platform error code.
    #[error("provider failure (code {0})")]
    ProviderFailure(i32),
}

impl LocationError {
    /// Returns the raw error code reported by the provider.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::ProviderFailure(code) => *code,
        }
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
