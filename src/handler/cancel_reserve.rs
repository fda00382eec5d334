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

//! Reservation cancellation handler.

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::group_state::PaymentGroupState;
use crate::money::Money;
use std::sync::Arc;

/// Zeroes the available balance whatever the gateway reported.
pub fn accumulate(
    state: &mut PaymentGroupState,
    event: &Arc<PaymentEvent>,
) -> Result<(), LedgerError> {
    state.set_available(Money::zero(event.amount.currency()));
    state.set_last_event(Arc::clone(event));
    Ok(())
}

pub fn combine(
    _state: &PaymentGroupState,
    _other: &PaymentGroupState,
) -> Result<PaymentGroupState, LedgerError> {
    Err(LedgerError::IllegalCombination(EventKind::CancelReserve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PaymentStatus;
    use crate::handler::reserve;
    use crate::handler::test_support::{event, event_with_id, money};
    use rust_decimal_macros::dec;

    #[test]
    fn cancellation_ignores_status() {
        for status in [
            PaymentStatus::Approved,
            PaymentStatus::Skipped,
            PaymentStatus::Failed,
        ] {
            let mut state = PaymentGroupState::new();
            reserve::accumulate(
                &mut state,
                &event(EventKind::Reserve, PaymentStatus::Approved, dec!(50)),
            )
            .unwrap();

            let cancel = event_with_id(2, EventKind::CancelReserve, status, dec!(50));
            accumulate(&mut state, &cancel).unwrap();

            assert_eq!(state.available(), Some(money(dec!(0))), "status {status:?}");
            assert_eq!(state.last_event(), Some(&cancel));
        }
    }

    #[test]
    fn cancellations_never_combine() {
        let state = PaymentGroupState::new();
        assert_eq!(
            combine(&state, &state),
            Err(LedgerError::IllegalCombination(EventKind::CancelReserve))
        );
    }
}
