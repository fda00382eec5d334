// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Charge (capture) handler.
//!
//! A charge consumes the whole reservation whether or not it succeeds, and
//! becomes the origin of the credits and reverse charges recorded against it.
//! Charge-rooted states are the only ones that can be combined: two chains
//! that share the same charge carry the same capture, but each one may hold
//! its own credits.

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::group_state::PaymentGroupState;
use crate::money::Money;
use std::cmp::Ordering;
use std::sync::Arc;

/// Captures the charged amount.
///
/// # Errors
///
/// - [`LedgerError::OverCapture`] - Amount exceeds the available balance.
///   The state is left untouched.
/// - [`LedgerError::UninitializedGroup`] - No reservation was accumulated.
pub fn accumulate(
    state: &mut PaymentGroupState,
    event: &Arc<PaymentEvent>,
) -> Result<(), LedgerError> {
    let zero = Money::zero(event.amount.currency());

    if event.status.is_effective() {
        let available = state.require_available(EventKind::Charge)?;
        if event.amount.compare(&available)? == Ordering::Greater {
            return Err(LedgerError::OverCapture);
        }
        state.set_captured(event.amount);
    }

    state.set_available(zero);
    state.set_last_event(Arc::clone(event));
    Ok(())
}

/// Keeps the capture of `state` and sums refunds and reversals of both.
pub fn combine(
    state: &PaymentGroupState,
    other: &PaymentGroupState,
) -> Result<PaymentGroupState, LedgerError> {
    let kind = EventKind::Charge;
    let refunded = state
        .require_refunded(kind)?
        .plus(&other.require_refunded(kind)?)?;
    let reverse_charged = state
        .require_reverse_charged(kind)?
        .plus(&other.require_reverse_charged(kind)?)?;

    let mut combined = state.clone();
    combined.set_refunded(refunded);
    combined.set_reverse_charged(reverse_charged);
    Ok(combined)
}
