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

//! Credit (refund) handler, shared by gateway and manual credits.

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::group_state::PaymentGroupState;
use std::cmp::Ordering;
use std::sync::Arc;

/// Adds the credited amount to the refunded total of the charge's group.
///
/// Credits never replace the group's last event: the charge stays the origin.
/// Failed credits are ignored.
///
/// # Errors
///
/// - [`LedgerError::OverRefund`] - Refunds would exceed the captured amount.
///   The state is left untouched.
/// - [`LedgerError::UninitializedGroup`] - No reservation was accumulated.
pub fn accumulate(
    state: &mut PaymentGroupState,
    event: &Arc<PaymentEvent>,
) -> Result<(), LedgerError> {
    if !event.status.is_effective() {
        return Ok(());
    }

    let refunded = state.require_refunded(event.kind)?.plus(&event.amount)?;
    let captured = state.require_captured(event.kind)?;
    if refunded.compare(&captured)? == Ordering::Greater {
        return Err(LedgerError::OverRefund);
    }

    state.set_refunded(refunded);
    Ok(())
}

/// The origin of a credit is always its charge.
pub fn combine(
    _state: &PaymentGroupState,
    _other: &PaymentGroupState,
) -> Result<PaymentGroupState, LedgerError> {
    Err(LedgerError::IllegalCombination(EventKind::Credit))
}
