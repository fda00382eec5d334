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

//! Multi-instrument payment ledger.
//!
//! The [`Ledger`] records payment events for any number of order payment
//! instruments and reconciles them on demand.
//!
//! # Recording
//!
//! - Event IDs are unique across the whole ledger.
//! - An instrument is created by its first event (or limit), which fixes
//!   its currency.
//! - Sequencing rules are not checked on record; a badly sequenced history
//!   is reported when the instrument is reconciled.
//!
//! # Thread Safety
//!
//! Instruments live in a [`DashMap`], each guarding its events with its own
//! mutex, so events for different instruments are recorded in parallel.

use crate::base::{EventId, InstrumentId};
use crate::event::PaymentEvent;
use crate::history::{OrderPaymentInstrument, PaymentHistory, Reconciliation};
use crate::instrument::{InstrumentLedger, InstrumentSummary};
use crate::money::Money;
use crate::{EventLog, LedgerError};
use dashmap::DashMap;
use log::trace;
use std::sync::Arc;

/// Payment events of many instruments.
pub struct Ledger {
    instruments: DashMap<InstrumentId, InstrumentLedger>,
    /// Global event log for deduplication.
    events: EventLog,
    history: PaymentHistory,
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_history(PaymentHistory::new())
    }

    /// Creates a ledger that reconciles with a custom driver.
    pub fn with_history(history: PaymentHistory) -> Self {
        Ledger {
            instruments: DashMap::new(),
            events: EventLog::new(),
            history,
        }
    }

    /// Records an event against its instrument.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - Amount is negative.
    /// - [`LedgerError::DuplicateEvent`] - Event ID already recorded.
    /// - [`LedgerError::CurrencyMismatch`] - Event currency differs from the instrument's.
    pub fn record(&self, event: PaymentEvent) -> Result<(), LedgerError> {
        if event.amount.is_negative() {
            return Err(LedgerError::InvalidAmount);
        }

        let event = Arc::new(event);
        self.events.push(Arc::clone(&event))?;

        let result = self
            .instruments
            .entry(event.instrument)
            .or_insert_with(|| InstrumentLedger::new(event.instrument, event.amount.currency()))
            .record(Arc::clone(&event));

        // A rejected event must not hold on to its ID.
        if result.is_err() {
            self.events.remove(event.id);
        } else {
            trace!("recorded {} event {} for instrument {}", event.kind, event.id, event.instrument);
        }
        result
    }

    /// Sets the reservation limit of an instrument, creating it if needed.
    ///
    /// A zero limit marks the instrument unlimited.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CurrencyMismatch`] or [`LedgerError::InvalidAmount`].
    pub fn set_limit(&self, instrument: InstrumentId, limit: Money) -> Result<(), LedgerError> {
        self.instruments
            .entry(instrument)
            .or_insert_with(|| InstrumentLedger::new(instrument, limit.currency()))
            .set_limit(limit)
    }

    /// Reconciles one instrument. Returns `None` for an unknown instrument.
    pub fn reconcile(&self, instrument: InstrumentId) -> Option<Result<Reconciliation, LedgerError>> {
        let snapshot = self.instruments.get(&instrument)?.snapshot();
        Some(snapshot.reconcile(&self.history))
    }

    /// Reconciled totals of one instrument. Returns `None` for an unknown
    /// instrument.
    pub fn summary(&self, instrument: InstrumentId) -> Option<Result<InstrumentSummary, LedgerError>> {
        let snapshot = self.instruments.get(&instrument)?.snapshot();
        Some(snapshot.summary(&self.history))
    }

    /// Instruments with a known limit that can take another reservation,
    /// ordered by instrument ID.
    ///
    /// # Errors
    ///
    /// The first reconciliation error met.
    pub fn reservable_instruments(
        &self,
    ) -> Result<Vec<(OrderPaymentInstrument, Money)>, LedgerError> {
        let mut reservable = Vec::new();
        for id in self.instruments() {
            // Snapshot first so no map guard is held while reconciling.
            let Some((limit, events)) = self
                .instruments
                .get(&id)
                .and_then(|entry| entry.limit().map(|limit| (limit, entry.events())))
            else {
                continue;
            };
            let instrument = OrderPaymentInstrument { id, limit };
            reservable.extend(self.history.reservable_instruments(&events, &[instrument])?);
        }
        Ok(reservable)
    }

    /// Known instrument IDs in ascending order.
    pub fn instruments(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<InstrumentId> = self.instruments.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshot of the events recorded for an instrument.
    pub fn events(&self, instrument: InstrumentId) -> Vec<Arc<PaymentEvent>> {
        self.instruments
            .get(&instrument)
            .map(|entry| entry.events())
            .unwrap_or_default()
    }

    /// Looks up a recorded event by ID.
    pub fn event(&self, id: EventId) -> Option<Arc<PaymentEvent>> {
        self.events.get(id)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, PaymentStatus};
    use crate::money::Currency;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn cad() -> Currency {
        "CAD".parse().unwrap()
    }

    fn event(
        id: u32,
        parent: Option<u32>,
        instrument: u16,
        kind: EventKind,
        amount: Decimal,
        currency: Currency,
    ) -> PaymentEvent {
        PaymentEvent {
            id: EventId(id),
            parent: parent.map(EventId),
            instrument: InstrumentId(instrument),
            kind,
            status: PaymentStatus::Approved,
            amount: Money::new(amount, currency),
            date: Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(id.into()),
        }
    }

    #[test]
    fn first_event_creates_instrument() {
        let ledger = Ledger::new();
        ledger
            .record(event(1, None, 4, EventKind::Reserve, dec!(10), cad()))
            .unwrap();
        assert_eq!(ledger.instruments(), vec![InstrumentId(4)]);
        assert_eq!(ledger.event_count(), 1);
    }

    #[test]
    fn duplicate_event_is_rejected_across_instruments() {
        let ledger = Ledger::new();
        ledger
            .record(event(1, None, 1, EventKind::Reserve, dec!(10), cad()))
            .unwrap();
        let result = ledger.record(event(1, None, 2, EventKind::Reserve, dec!(10), cad()));
        assert_eq!(result, Err(LedgerError::DuplicateEvent(EventId(1))));
        assert_eq!(ledger.instruments(), vec![InstrumentId(1)]);
    }

    #[test]
    fn currency_mismatch_releases_event_id() {
        let ledger = Ledger::new();
        ledger
            .record(event(1, None, 1, EventKind::Reserve, dec!(10), cad()))
            .unwrap();
        let usd: Currency = "USD".parse().unwrap();
        let result = ledger.record(event(2, Some(1), 1, EventKind::Charge, dec!(5), usd));
        assert!(matches!(result, Err(LedgerError::CurrencyMismatch { .. })));
        assert!(ledger.event(EventId(2)).is_none());

        ledger
            .record(event(2, Some(1), 1, EventKind::Charge, dec!(5), cad()))
            .unwrap();
    }

    #[test]
    fn negative_amount_is_rejected() {
        let ledger = Ledger::new();
        let result = ledger.record(event(1, None, 1, EventKind::Reserve, dec!(-1), cad()));
        assert_eq!(result, Err(LedgerError::InvalidAmount));
        assert!(ledger.instruments().is_empty());
    }

    #[test]
    fn reconcile_unknown_instrument_is_none() {
        let ledger = Ledger::new();
        assert!(ledger.reconcile(InstrumentId(9)).is_none());
        assert!(ledger.summary(InstrumentId(9)).is_none());
    }

    #[test]
    fn instruments_are_sorted() {
        let ledger = Ledger::new();
        for (id, instrument) in [(1, 30), (2, 10), (3, 20)] {
            ledger
                .record(event(id, None, instrument, EventKind::Reserve, dec!(1), cad()))
                .unwrap();
        }
        assert_eq!(
            ledger.instruments(),
            vec![InstrumentId(10), InstrumentId(20), InstrumentId(30)]
        );
    }

    #[test]
    fn reservable_instruments_skip_instruments_without_limit() {
        let ledger = Ledger::new();
        ledger
            .record(event(1, None, 1, EventKind::Reserve, dec!(40), cad()))
            .unwrap();
        ledger
            .record(event(2, None, 2, EventKind::Reserve, dec!(40), cad()))
            .unwrap();
        ledger.set_limit(InstrumentId(2), Money::new(dec!(100), cad())).unwrap();
        ledger.set_limit(InstrumentId(3), Money::zero(cad())).unwrap();

        let reservable = ledger.reservable_instruments().unwrap();

        let ids: Vec<(InstrumentId, Decimal)> = reservable
            .iter()
            .map(|(instrument, amount)| (instrument.id, amount.amount()))
            .collect();
        assert_eq!(
            ids,
            vec![(InstrumentId(2), dec!(60)), (InstrumentId(3), dec!(0))]
        );
    }

    #[test]
    fn limit_currency_must_match_instrument() {
        let ledger = Ledger::new();
        ledger
            .record(event(1, None, 1, EventKind::Reserve, dec!(40), cad()))
            .unwrap();
        let result = ledger.set_limit(InstrumentId(1), Money::new(dec!(5), "EUR".parse().unwrap()));
        assert!(matches!(result, Err(LedgerError::CurrencyMismatch { .. })));
    }
}
