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

//! Payment events.
//!
//! A [`PaymentEvent`] is an immutable fact produced by the payment subsystem.
//! Events link to their causal parent, which lets the reconciliation driver
//! rebuild the reservation tree:
//!
//! ```text
//! Reserve ──► ModifyReserve ──► Charge ──► Credit ──► Credit
//!    │                             └────► ReverseCharge
//!    └──► CancelReserve
//! ```

use crate::base::{EventId, InstrumentId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of payment lifecycle event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Reserve,
    ModifyReserve,
    CancelReserve,
    Charge,
    Credit,
    /// Credit issued by an operator outside the payment gateway.
    ManualCredit,
    ReverseCharge,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::ModifyReserve => "modify_reserve",
            Self::CancelReserve => "cancel_reserve",
            Self::Charge => "charge",
            Self::Credit => "credit",
            Self::ManualCredit => "manual_credit",
            Self::ReverseCharge => "reverse_charge",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the payment gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    /// The gateway was not called but the operation counts as done.
    Skipped,
    Failed,
}

impl PaymentStatus {
    /// `true` for approved and skipped events.
    pub fn is_effective(&self) -> bool {
        matches!(self, Self::Approved | Self::Skipped)
    }
}

/// Immutable payment lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentEvent {
    pub id: EventId,
    /// Event this one was caused by; `None` for reservations.
    pub parent: Option<EventId>,
    pub instrument: InstrumentId,
    pub kind: EventKind,
    pub status: PaymentStatus,
    pub amount: Money,
    pub date: DateTime<Utc>,
}
