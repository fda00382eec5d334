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

//! # Payment Ledger
//!
//! This library reconciles the payment events of order payment instruments:
//! reservations, charges against them, credits (refunds) and reverse
//! charges (chargebacks).
//!
//! ## Core Components
//!
//! - [`Ledger`]: Records events for many instruments and reconciles them
//! - [`PaymentHistory`]: Reconciliation driver over one instrument's events
//! - [`handler`]: Per-kind accumulate and combine rules
//! - [`PaymentGroupState`]: Running totals of one reservation group
//! - [`LedgerError`]: Error types for reconciliation failures
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use payment_ledger_rs::{
//!     EventId, EventKind, InstrumentId, Ledger, Money, PaymentEvent, PaymentStatus,
//! };
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new();
//! let cad = "CAD".parse().unwrap();
//!
//! ledger
//!     .record(PaymentEvent {
//!         id: EventId(1),
//!         parent: None,
//!         instrument: InstrumentId(1),
//!         kind: EventKind::Reserve,
//!         status: PaymentStatus::Approved,
//!         amount: Money::new(dec!(100.00), cad),
//!         date: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
//!     })
//!     .unwrap();
//! ledger
//!     .record(PaymentEvent {
//!         id: EventId(2),
//!         parent: Some(EventId(1)),
//!         instrument: InstrumentId(1),
//!         kind: EventKind::Charge,
//!         status: PaymentStatus::Approved,
//!         amount: Money::new(dec!(60.00), cad),
//!         date: Utc.with_ymd_and_hms(2024, 1, 1, 9, 5, 0).unwrap(),
//!     })
//!     .unwrap();
//!
//! let totals = ledger.reconcile(InstrumentId(1)).unwrap().unwrap();
//! assert_eq!(totals.charged(), Money::new(dec!(60.00), cad));
//! assert!(totals.available_reserved().is_zero());
//! ```
//!
//! ## Thread Safety
//!
//! The ledger handles concurrent recording, allowing events of different
//! instruments to be recorded in parallel.

mod base;
mod chain;
pub mod error;
mod event;
mod event_log;
mod group_state;
pub mod handler;
mod history;
pub mod instrument;
mod ledger;
mod money;
pub mod validator;

pub use base::{EventId, InstrumentId};
pub use chain::{PaymentEventChain, build_chains};
pub use error::LedgerError;
pub use event::{EventKind, PaymentEvent, PaymentStatus};
pub use event_log::EventLog;
pub use group_state::PaymentGroupState;
pub use history::{OrderPaymentInstrument, PaymentHistory, Reconciliation};
pub use instrument::{InstrumentLedger, InstrumentSummary};
pub use ledger::Ledger;
pub use money::{Currency, Money};
pub use validator::{
    AmountValidator, ChainValidator, ChronologyValidator, CurrencyValidator, SequenceValidator,
    default_validators,
};
