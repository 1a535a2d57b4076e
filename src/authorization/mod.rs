// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authorization negotiation.
//!
//! The [`AuthorizationNegotiator`] decides whether the current permission
//! is enough for a request, asks the provider when the user has not decided
//! yet, and resolves every [`ensure`](AuthorizationNegotiator::ensure) call
//! to exactly one [`AuthorizationOutcome`](crate::types::AuthorizationOutcome).
//!
//! # State machine
//!
//! ```text
//!            status already decided
//! Unknown ─────────────────────────────→ Resolved(outcome)
//!    │                                        ↑
//!    │ NotDetermined: request once per level   │ first status ≠ NotDetermined
//!    ↓                                        │
//! Requesting(level) ──────────────────────────┘
//! ```

mod negotiator;

pub use negotiator::{AuthorizationNegotiator, NegotiationState};
