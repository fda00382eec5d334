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

//! Reverse charge handler. A reversal voids the whole capture, once.

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::group_state::PaymentGroupState;
use std::cmp::Ordering;
use std::sync::Arc;

/// Records a full reversal of the captured amount. Failed reversals are
/// ignored.
///
/// # Errors
///
/// Checked in this order, before anything is written:
///
/// - [`LedgerError::AbsentCharge`] - Nothing was captured.
/// - [`LedgerError::DuplicateReversal`] - The charge was already reversed.
/// - [`LedgerError::PartialReversal`] - Amount differs from the captured amount.
pub fn accumulate(
    state: &mut PaymentGroupState,
    event: &Arc<PaymentEvent>,
) -> Result<(), LedgerError> {
    if !event.status.is_effective() {
        return Ok(());
    }

    let captured = state.require_captured(EventKind::ReverseCharge)?;
    let reverse_charged = state.require_reverse_charged(EventKind::ReverseCharge)?;

    if captured.is_zero() {
        return Err(LedgerError::AbsentCharge);
    }
    if !reverse_charged.is_zero() {
        return Err(LedgerError::DuplicateReversal);
    }
    if captured.compare(&event.amount)? != Ordering::Equal {
        return Err(LedgerError::PartialReversal);
    }

    state.set_reverse_charged(event.amount);
    Ok(())
}

/// The origin of a reverse charge is always its charge.
pub fn combine(
    _state: &PaymentGroupState,
    _other: &PaymentGroupState,
) -> Result<PaymentGroupState, LedgerError> {
    Err(LedgerError::IllegalCombination(EventKind::ReverseCharge))
}
