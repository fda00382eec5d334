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

//! Reservation handler. A reservation is the origin of its group.

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::group_state::PaymentGroupState;
use crate::money::Money;
use std::sync::Arc;

/// Starts the group: a failed reservation leaves nothing to capture.
pub fn accumulate(
    state: &mut PaymentGroupState,
    event: &Arc<PaymentEvent>,
) -> Result<(), LedgerError> {
    let zero = Money::zero(event.amount.currency());
    let available = if event.status.is_effective() {
        event.amount
    } else {
        zero
    };

    state.set_available(available);
    state.set_captured(zero);
    state.set_refunded(zero);
    state.set_reverse_charged(zero);
    state.set_last_event(Arc::clone(event));
    Ok(())
}

/// There is exactly one reservation per group.
pub fn combine(
    _state: &PaymentGroupState,
    _other: &PaymentGroupState,
) -> Result<PaymentGroupState, LedgerError> {
    Err(LedgerError::IllegalCombination(EventKind::Reserve))
}
