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

//! Error types for payment event reconciliation.

use crate::base::{EventId, InstrumentId};
use crate::event::EventKind;
use crate::money::Currency;
use thiserror::Error;

/// Reconciliation errors.
///
/// Every variant describes a violated ledger invariant or a mis-sequenced
/// event stream. None of them is retried by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Two amounts of different currencies were compared or added
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    /// Charge amount exceeds the reservation's available balance
    #[error("attempting to charge more than was reserved")]
    OverCapture,

    /// Cumulative refund exceeds the captured amount
    #[error("attempting to refund more than was charged")]
    OverRefund,

    /// Charge has already been reversed
    #[error("attempting a second reverse operation")]
    DuplicateReversal,

    /// Reverse charge amount differs from the captured amount
    #[error("attempting to reverse more than was charged")]
    PartialReversal,

    /// Reverse charge with nothing captured
    #[error("attempting to reverse an absent charge")]
    AbsentCharge,

    /// Groups originating from this kind of event are never merged
    #[error("groups originating from {0} events cannot be combined")]
    IllegalCombination(EventKind),

    /// Event applied to a group that has not been reserved yet
    #[error("{0} event applied to a group without a reservation")]
    UninitializedGroup(EventKind),

    /// Event kind is not allowed at its position in the chain
    #[error("event {event} of kind {kind} is out of sequence")]
    IllegalSequence { event: EventId, kind: EventKind },

    /// Event is not dated strictly after its predecessor
    #[error("event {event} is not dated after its predecessor")]
    UnorderedEvents { event: EventId },

    /// Referenced parent event does not exist
    #[error("event {event} references unknown parent {parent}")]
    OrphanEvent { event: EventId, parent: EventId },

    /// Duplicate event ID
    #[error("duplicate event ID {0}")]
    DuplicateEvent(EventId),

    /// Event recorded against the wrong instrument
    #[error("event belongs to instrument {found}, not {expected}")]
    InstrumentMismatch {
        expected: InstrumentId,
        found: InstrumentId,
    },

    /// Sum or difference of two amounts does not fit in a decimal
    #[error("amount overflow")]
    AmountOverflow,

    /// Amount is negative
    #[error("invalid amount (must not be negative)")]
    InvalidAmount,

    /// Currency code is not three ASCII letters
    #[error("invalid currency code {0:?}")]
    InvalidCurrency(String),
}
