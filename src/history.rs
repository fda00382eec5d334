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

//! Reconciliation driver.
//!
//! [`PaymentHistory`] turns an unordered batch of payment events for one
//! instrument into settled totals:
//!
//! 1. Events are split into root-to-leaf chains ([`build_chains`]).
//! 2. Each chain is checked by the configured [`ChainValidator`]s.
//! 3. Each chain is folded into a fresh [`PaymentGroupState`].
//! 4. States that end on the same event are combined through the handler of
//!    that event's kind. Only charges may be shared this way; any other
//!    shared origin is an illegal combination.
//!
//! # Example
//!
//! ```
//! use payment_ledger_rs::{
//!     Currency, EventId, EventKind, InstrumentId, Money, PaymentEvent, PaymentHistory,
//!     PaymentStatus,
//! };
//! use chrono::{TimeZone, Utc};
//! use rust_decimal::Decimal;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let cad: Currency = "CAD".parse().unwrap();
//! let event = |id: u32, parent: Option<u32>, kind: EventKind, amount: Decimal, minute: u32| {
//!     Arc::new(PaymentEvent {
//!         id: EventId(id),
//!         parent: parent.map(EventId),
//!         instrument: InstrumentId(1),
//!         kind,
//!         status: PaymentStatus::Approved,
//!         amount: Money::new(amount, cad),
//!         date: Utc.with_ymd_and_hms(2019, 1, 1, 1, minute, 0).unwrap(),
//!     })
//! };
//!
//! let events = vec![
//!     event(1, None, EventKind::Reserve, dec!(100), 0),
//!     event(2, Some(1), EventKind::Charge, dec!(60), 1),
//!     event(3, Some(2), EventKind::Credit, dec!(20), 2),
//! ];
//!
//! let reconciliation = PaymentHistory::new().reconcile(cad, &events).unwrap();
//! assert_eq!(reconciliation.charged(), Money::new(dec!(60), cad));
//! assert_eq!(reconciliation.refunded(), Money::new(dec!(20), cad));
//! ```

use crate::LedgerError;
use crate::base::{EventId, InstrumentId};
use crate::chain::{PaymentEventChain, build_chains};
use crate::event::PaymentEvent;
use crate::group_state::PaymentGroupState;
use crate::handler;
use crate::money::{Currency, Money};
use crate::validator::{ChainValidator, default_validators};
use log::debug;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// Order payment instrument with its reservation limit.
///
/// A zero limit means the instrument is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderPaymentInstrument {
    pub id: InstrumentId,
    pub limit: Money,
}

impl OrderPaymentInstrument {
    pub fn is_unlimited(&self) -> bool {
        self.limit.is_zero()
    }
}

/// Settled view of one instrument's payment events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    currency: Currency,
    groups: Vec<PaymentGroupState>,
    available_reserved: Money,
    captured: Money,
    refunded: Money,
    reverse_charged: Money,
    chargeable: Vec<(Arc<PaymentEvent>, Money)>,
    refundable: Vec<(Arc<PaymentEvent>, Money)>,
}

impl Reconciliation {
    fn new(currency: Currency, groups: Vec<PaymentGroupState>) -> Result<Self, LedgerError> {
        let total = |field: fn(&PaymentGroupState) -> Option<Money>| {
            Money::sum(currency, groups.iter().filter_map(field))
        };
        let available_reserved = total(PaymentGroupState::available)?;
        let captured = total(PaymentGroupState::captured)?;
        let refunded = total(PaymentGroupState::refunded)?;
        let reverse_charged = total(PaymentGroupState::reverse_charged)?;

        let chargeable = groups
            .iter()
            .filter_map(|group| Some((Arc::clone(group.last_event()?), group.available()?)))
            .filter(|(_, available)| available.is_positive())
            .collect();

        // A reversed charge freezes every refund on the instrument.
        let mut refundable = Vec::new();
        if !reverse_charged.is_positive() {
            for group in &groups {
                let (Some(origin), Some(group_captured), Some(group_refunded)) =
                    (group.last_event(), group.captured(), group.refunded())
                else {
                    continue;
                };
                let balance = group_captured.minus(&group_refunded)?;
                if balance.is_positive() {
                    refundable.push((Arc::clone(origin), balance));
                }
            }
        }

        Ok(Self {
            currency,
            groups,
            available_reserved,
            captured,
            refunded,
            reverse_charged,
            chargeable,
            refundable,
        })
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Group states after combination, one per distinct origin.
    pub fn groups(&self) -> &[PaymentGroupState] {
        &self.groups
    }

    /// Total amount still reserved and available to capture.
    pub fn available_reserved(&self) -> Money {
        self.available_reserved
    }

    /// Total captured, including charges that were later reversed.
    pub fn captured(&self) -> Money {
        self.captured
    }

    /// Total captured minus reversed charges.
    pub fn charged(&self) -> Money {
        Money::new(
            self.captured.amount() - self.reverse_charged.amount(),
            self.currency,
        )
    }

    pub fn refunded(&self) -> Money {
        self.refunded
    }

    pub fn reverse_charged(&self) -> Money {
        self.reverse_charged
    }

    /// Reservation events that still have a balance to capture.
    pub fn chargeable_events(&self) -> &[(Arc<PaymentEvent>, Money)] {
        &self.chargeable
    }

    /// Amount that can still be reserved against `limit`: the limit minus
    /// what is reserved or charged and not refunded. A zero limit is
    /// unlimited and yields zero.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CurrencyMismatch`] if `limit` is in another currency.
    pub fn reservable_amount(&self, limit: Money) -> Result<Money, LedgerError> {
        if limit.is_zero() {
            return Ok(Money::zero(limit.currency()));
        }
        let used = self
            .available_reserved
            .plus(&self.charged())?
            .minus(&self.refunded)?;
        limit.minus(&used)
    }

    /// Charge events that can still be refunded, with their refundable balance.
    ///
    /// Empty as soon as any charge of the instrument was reversed.
    pub fn refundable_events(&self) -> &[(Arc<PaymentEvent>, Money)] {
        &self.refundable
    }
}

/// Reconciliation driver.
pub struct PaymentHistory {
    validators: Vec<Box<dyn ChainValidator>>,
}

impl PaymentHistory {
    /// Creates a driver with the [default validators](default_validators).
    pub fn new() -> Self {
        Self::with_validators(default_validators())
    }

    pub fn with_validators(validators: Vec<Box<dyn ChainValidator>>) -> Self {
        Self { validators }
    }

    /// Reconciles `events`, which must all belong to one instrument.
    ///
    /// `currency` is the instrument's currency; it is also the currency of
    /// the zero totals returned for an empty history.
    ///
    /// # Errors
    ///
    /// Any chain building, validation, handler or combination error, as
    /// described on [`LedgerError`].
    pub fn reconcile(
        &self,
        currency: Currency,
        events: &[Arc<PaymentEvent>],
    ) -> Result<Reconciliation, LedgerError> {
        let chains = build_chains(events)?;

        let mut groups = Vec::with_capacity(chains.len());
        for chain in &chains {
            self.validate(chain)?;
            groups.push(fold(chain)?);
        }

        let groups = combine_groups(groups)?;
        debug!(
            "reconciled {} events into {} groups",
            events.len(),
            groups.len()
        );
        Reconciliation::new(currency, groups)
    }

    /// Amount that can still be reserved against `limit`.
    ///
    /// An unlimited (zero) limit yields zero.
    ///
    /// # Errors
    ///
    /// Same as [`PaymentHistory::reconcile`].
    pub fn reservable_amount(
        &self,
        limit: Money,
        events: &[Arc<PaymentEvent>],
    ) -> Result<Money, LedgerError> {
        if limit.is_zero() {
            return Ok(Money::zero(limit.currency()));
        }
        if events.is_empty() {
            return Ok(limit);
        }

        self.reconcile(limit.currency(), events)?
            .reservable_amount(limit)
    }

    /// Instruments that can take another reservation, with the reservable
    /// amount.
    ///
    /// Unlimited instruments are always listed, with a zero amount. Limited
    /// instruments are listed only while their reservable amount is positive.
    ///
    /// # Errors
    ///
    /// Same as [`PaymentHistory::reconcile`].
    pub fn reservable_instruments(
        &self,
        ledger: &[Arc<PaymentEvent>],
        instruments: &[OrderPaymentInstrument],
    ) -> Result<Vec<(OrderPaymentInstrument, Money)>, LedgerError> {
        let mut reservable = Vec::new();
        for instrument in instruments {
            if instrument.is_unlimited() {
                reservable.push((*instrument, Money::zero(instrument.limit.currency())));
                continue;
            }

            let events: Vec<Arc<PaymentEvent>> = ledger
                .iter()
                .filter(|event| event.instrument == instrument.id)
                .cloned()
                .collect();
            let amount = self.reservable_amount(instrument.limit, &events)?;
            if amount.is_positive() {
                reservable.push((*instrument, amount));
            }
        }
        Ok(reservable)
    }

    fn validate(&self, chain: &PaymentEventChain) -> Result<(), LedgerError> {
        self.validators
            .iter()
            .try_for_each(|validator| validator.validate(chain))
    }
}

impl Default for PaymentHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds one chain into a fresh group state. The fold is strictly sequential.
fn fold(chain: &PaymentEventChain) -> Result<PaymentGroupState, LedgerError> {
    let mut state = PaymentGroupState::new();
    for event in chain {
        handler::accumulate(&mut state, event)?;
    }
    Ok(state)
}

/// Merges states ending on the same event, keeping first-seen order.
fn combine_groups(groups: Vec<PaymentGroupState>) -> Result<Vec<PaymentGroupState>, LedgerError> {
    let mut combined: Vec<PaymentGroupState> = Vec::with_capacity(groups.len());
    let mut positions: HashMap<EventId, usize> = HashMap::new();

    for state in groups {
        let Some((origin, kind)) = state.last_event().map(|event| (event.id, event.kind)) else {
            combined.push(state);
            continue;
        };
        match positions.entry(origin) {
            Entry::Occupied(slot) => {
                let position = *slot.get();
                debug!("combining fragments of {kind} event {origin}");
                combined[position] = handler::combine(kind, &combined[position], &state)?;
            }
            Entry::Vacant(slot) => {
                slot.insert(combined.len());
                combined.push(state);
            }
        }
    }
    Ok(combined)
}
