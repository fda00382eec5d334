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

//! Per-instrument event storage.
//!
//! # Example
//!
//! ```
//! use payment_ledger_rs::{InstrumentId, InstrumentLedger};
//!
//! let instrument = InstrumentLedger::new(InstrumentId(1), "CAD".parse().unwrap());
//! assert!(instrument.events().is_empty());
//! assert!(instrument.limit().is_none());
//! ```

use crate::LedgerError;
use crate::base::InstrumentId;
use crate::event::PaymentEvent;
use crate::history::{PaymentHistory, Reconciliation};
use crate::money::{Currency, Money};
use parking_lot::Mutex;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub(crate) struct InstrumentData {
    id: InstrumentId,
    currency: Currency,
    limit: Option<Money>,
    /// Events in the order they were recorded.
    events: Vec<Arc<PaymentEvent>>,
}

impl InstrumentData {
    fn new(id: InstrumentId, currency: Currency) -> Self {
        Self {
            id,
            currency,
            limit: None,
            events: Vec::new(),
        }
    }

    fn ensure_currency(&self, amount: &Money) -> Result<(), LedgerError> {
        if amount.currency() != self.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: self.currency,
                found: amount.currency(),
            });
        }
        Ok(())
    }

    fn record(&mut self, event: Arc<PaymentEvent>) -> Result<(), LedgerError> {
        if event.instrument != self.id {
            return Err(LedgerError::InstrumentMismatch {
                expected: self.id,
                found: event.instrument,
            });
        }
        if event.amount.is_negative() {
            return Err(LedgerError::InvalidAmount);
        }
        self.ensure_currency(&event.amount)?;
        self.events.push(event);
        Ok(())
    }

    fn set_limit(&mut self, limit: Money) -> Result<(), LedgerError> {
        if limit.is_negative() {
            return Err(LedgerError::InvalidAmount);
        }
        self.ensure_currency(&limit)?;
        self.limit = Some(limit);
        Ok(())
    }

    pub(crate) fn reconcile(&self, history: &PaymentHistory) -> Result<Reconciliation, LedgerError> {
        history.reconcile(self.currency, &self.events)
    }

    pub(crate) fn summary(&self, history: &PaymentHistory) -> Result<InstrumentSummary, LedgerError> {
        let reconciliation = self.reconcile(history)?;
        let reservable = match self.limit {
            Some(limit) => Some(reconciliation.reservable_amount(limit)?),
            None => None,
        };
        Ok(InstrumentSummary {
            instrument: self.id,
            reconciliation,
            reservable,
        })
    }
}

/// Payment events of one order payment instrument.
#[derive(Debug)]
pub struct InstrumentLedger {
    inner: Mutex<InstrumentData>,
}

impl InstrumentLedger {
    pub fn new(id: InstrumentId, currency: Currency) -> Self {
        Self {
            inner: Mutex::new(InstrumentData::new(id, currency)),
        }
    }

    pub fn id(&self) -> InstrumentId {
        self.inner.lock().id
    }

    pub fn currency(&self) -> Currency {
        self.inner.lock().currency
    }

    pub fn limit(&self) -> Option<Money> {
        self.inner.lock().limit
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<Arc<PaymentEvent>> {
        self.inner.lock().events.clone()
    }

    /// Appends an event.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InstrumentMismatch`] - Event belongs to another instrument.
    /// - [`LedgerError::CurrencyMismatch`] - Event is not in the instrument's currency.
    /// - [`LedgerError::InvalidAmount`] - Amount is negative.
    pub fn record(&self, event: Arc<PaymentEvent>) -> Result<(), LedgerError> {
        self.inner.lock().record(event)
    }

    /// Sets the reservation limit; zero means unlimited.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CurrencyMismatch`] or [`LedgerError::InvalidAmount`].
    pub fn set_limit(&self, limit: Money) -> Result<(), LedgerError> {
        self.inner.lock().set_limit(limit)
    }

    /// Copy of the instrument state. Events are shared, not cloned.
    pub(crate) fn snapshot(&self) -> InstrumentData {
        self.inner.lock().clone()
    }

    /// Reconciles a snapshot of the recorded events. The lock is not held
    /// while folding.
    pub fn reconcile(&self, history: &PaymentHistory) -> Result<Reconciliation, LedgerError> {
        self.snapshot().reconcile(history)
    }

    /// Reconciled totals, plus the reservable amount when a limit is set.
    pub fn summary(&self, history: &PaymentHistory) -> Result<InstrumentSummary, LedgerError> {
        self.snapshot().summary(history)
    }
}

/// Output row for one instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSummary {
    pub instrument: InstrumentId,
    pub reconciliation: Reconciliation,
    pub reservable: Option<Money>,
}

impl InstrumentSummary {
    const DECIMAL_PRECISION: u32 = 4;
}

impl Serialize for InstrumentSummary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let precision = InstrumentSummary::DECIMAL_PRECISION;
        let totals = &self.reconciliation;
        let mut state = serializer.serialize_struct("InstrumentSummary", 7)?;
        state.serialize_field("instrument", &self.instrument)?;
        state.serialize_field("currency", &totals.currency())?;
        state.serialize_field(
            "available",
            &totals.available_reserved().amount().round_dp(precision),
        )?;
        state.serialize_field("charged", &totals.charged().amount().round_dp(precision))?;
        state.serialize_field("refunded", &totals.refunded().amount().round_dp(precision))?;
        state.serialize_field(
            "reverse_charged",
            &totals.reverse_charged().amount().round_dp(precision),
        )?;
        state.serialize_field(
            "reservable",
            &self
                .reservable
                .map(|amount| amount.amount().round_dp(precision)),
        )?;
        state.end()
    }
}
