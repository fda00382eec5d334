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

//! Event handlers.
//!
//! One module per [`EventKind`], each exposing the same two operations:
//!
//! - `accumulate` applies one event to a [`PaymentGroupState`] in place.
//! - `combine` merges two states that share the same origin event.
//!
//! | Kind | Accumulate | Combine |
//! |------|------------|---------|
//! | Reserve | Sets `available`, resets every other total | Never |
//! | ModifyReserve | Replaces `available` | Never |
//! | CancelReserve | Zeroes `available` | Never |
//! | Charge | Moves `available` into `captured` | Sums refunds and reversals |
//! | Credit, ManualCredit | Adds to `refunded` | Never |
//! | ReverseCharge | Reverses the full `captured` amount | Never |
//!
//! Dispatch is a fixed `match`; no handler knows about any other kind.

pub mod cancel_reserve;
pub mod charge;
pub mod credit;
pub mod modify_reserve;
pub mod reserve;
pub mod reverse_charge;

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::group_state::PaymentGroupState;
use std::sync::Arc;

/// Applies `event` to `state` using the handler for the event's kind.
///
/// # Errors
///
/// - [`LedgerError::OverCapture`] - Charge exceeds the available balance.
/// - [`LedgerError::OverRefund`] - Credits exceed the captured amount.
/// - [`LedgerError::AbsentCharge`] - Reverse charge with nothing captured.
/// - [`LedgerError::DuplicateReversal`] - Charge was already reversed.
/// - [`LedgerError::PartialReversal`] - Reverse charge differs from the captured amount.
/// - [`LedgerError::CurrencyMismatch`] - Event currency differs from the group's.
/// - [`LedgerError::UninitializedGroup`] - Group has no reservation yet.
pub fn accumulate(
    state: &mut PaymentGroupState,
    event: &Arc<PaymentEvent>,
) -> Result<(), LedgerError> {
    match event.kind {
        EventKind::Reserve => reserve::accumulate(state, event),
        EventKind::ModifyReserve => modify_reserve::accumulate(state, event),
        EventKind::CancelReserve => cancel_reserve::accumulate(state, event),
        EventKind::Charge => charge::accumulate(state, event),
        EventKind::Credit | EventKind::ManualCredit => credit::accumulate(state, event),
        EventKind::ReverseCharge => reverse_charge::accumulate(state, event),
    }
}

/// Merges two states whose origin is an event of kind `origin`.
///
/// # Errors
///
/// [`LedgerError::IllegalCombination`] for every origin except
/// [`EventKind::Charge`].
pub fn combine(
    origin: EventKind,
    state: &PaymentGroupState,
    other: &PaymentGroupState,
) -> Result<PaymentGroupState, LedgerError> {
    match origin {
        EventKind::Reserve => reserve::combine(state, other),
        EventKind::ModifyReserve => modify_reserve::combine(state, other),
        EventKind::CancelReserve => cancel_reserve::combine(state, other),
        EventKind::Charge => charge::combine(state, other),
        EventKind::Credit | EventKind::ManualCredit => credit::combine(state, other),
        EventKind::ReverseCharge => reverse_charge::combine(state, other),
    }
}
