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

//! Reservation modification handler.

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::group_state::PaymentGroupState;
use std::sync::Arc;

/// Replaces the available balance; captured, refunded and reversed totals
/// are left alone. A failed modification keeps the previous balance.
pub fn accumulate(
    state: &mut PaymentGroupState,
    event: &Arc<PaymentEvent>,
) -> Result<(), LedgerError> {
    if event.status.is_effective() {
        state.set_available(event.amount);
    }
    state.set_last_event(Arc::clone(event));
    Ok(())
}

/// At most one modification is in flight per reservation.
pub fn combine(
    _state: &PaymentGroupState,
    _other: &PaymentGroupState,
) -> Result<PaymentGroupState, LedgerError> {
    Err(LedgerError::IllegalCombination(EventKind::ModifyReserve))
}
