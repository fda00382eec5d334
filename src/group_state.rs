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

//! Ledger aggregate for one group of payment events.

use crate::LedgerError;
use crate::event::{EventKind, PaymentEvent};
use crate::money::Money;
use std::sync::Arc;

/// Reconciled totals for one reservation-rooted group.
///
/// The record has no behavior of its own: every transition lives in the
/// event handlers. The money fields stay unset until the group's reservation
/// has been accumulated.
///
/// The state is not synchronized. A single owner mutates it for the duration
/// of one fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentGroupState {
    /// Most recently applied event that owns this group.
    last_event: Option<Arc<PaymentEvent>>,
    /// Balance that can still be captured.
    available: Option<Money>,
    captured: Option<Money>,
    refunded: Option<Money>,
    reverse_charged: Option<Money>,
}

impl PaymentGroupState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_event(&self) -> Option<&Arc<PaymentEvent>> {
        self.last_event.as_ref()
    }

    pub fn available(&self) -> Option<Money> {
        self.available
    }

    pub fn captured(&self) -> Option<Money> {
        self.captured
    }

    pub fn refunded(&self) -> Option<Money> {
        self.refunded
    }

    pub fn reverse_charged(&self) -> Option<Money> {
        self.reverse_charged
    }

    pub fn set_last_event(&mut self, event: Arc<PaymentEvent>) {
        self.last_event = Some(event);
    }

    pub fn set_available(&mut self, available: Money) {
        self.available = Some(available);
    }

    pub fn set_captured(&mut self, captured: Money) {
        self.captured = Some(captured);
    }

    pub fn set_refunded(&mut self, refunded: Money) {
        self.refunded = Some(refunded);
    }

    pub fn set_reverse_charged(&mut self, reverse_charged: Money) {
        self.reverse_charged = Some(reverse_charged);
    }

    /// `true` once a reservation has been accumulated.
    pub fn is_initialized(&self) -> bool {
        self.available.is_some()
            && self.captured.is_some()
            && self.refunded.is_some()
            && self.reverse_charged.is_some()
    }

    pub(crate) fn require_available(&self, kind: EventKind) -> Result<Money, LedgerError> {
        self.available.ok_or(LedgerError::UninitializedGroup(kind))
    }

    pub(crate) fn require_captured(&self, kind: EventKind) -> Result<Money, LedgerError> {
        self.captured.ok_or(LedgerError::UninitializedGroup(kind))
    }

    pub(crate) fn require_refunded(&self, kind: EventKind) -> Result<Money, LedgerError> {
        self.refunded.ok_or(LedgerError::UninitializedGroup(kind))
    }

    pub(crate) fn require_reverse_charged(&self, kind: EventKind) -> Result<Money, LedgerError> {
        self.reverse_charged
            .ok_or(LedgerError::UninitializedGroup(kind))
    }
}
