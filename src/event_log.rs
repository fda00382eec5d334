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

//! Thread-safe event log with deduplication.

use crate::LedgerError;
use crate::base::EventId;
use crate::event::PaymentEvent;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Every event accepted by a [`Ledger`](crate::Ledger), indexed by ID.
///
/// Event IDs are global: the log guarantees no two events share one, across
/// all instruments.
#[derive(Debug, Default)]
pub struct EventLog {
    events: DashMap<EventId, Arc<PaymentEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event to the log.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateEvent`] if an event with the same ID
    /// is already logged.
    pub fn push(&self, event: Arc<PaymentEvent>) -> Result<(), LedgerError> {
        // Entry API keeps check-and-insert atomic.
        match self.events.entry(event.id) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateEvent(event.id)),
            Entry::Vacant(entry) => {
                entry.insert(event);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: EventId) -> Option<Arc<PaymentEvent>> {
        self.events.get(&id).map(|event| Arc::clone(event.value()))
    }

    pub(crate) fn remove(&self, id: EventId) {
        self.events.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::InstrumentId;
    use crate::event::{EventKind, PaymentStatus};
    use crate::money::Money;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn event(id: u32) -> Arc<PaymentEvent> {
        Arc::new(PaymentEvent {
            id: EventId(id),
            parent: None,
            instrument: InstrumentId(1),
            kind: EventKind::Reserve,
            status: PaymentStatus::Approved,
            amount: Money::new(dec!(1), "CAD".parse().unwrap()),
            date: Utc::now(),
        })
    }

    #[test]
    fn push_rejects_duplicates() {
        let log = EventLog::new();
        log.push(event(1)).unwrap();
        assert_eq!(log.push(event(1)), Err(LedgerError::DuplicateEvent(EventId(1))));
        log.push(event(2)).unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn removed_id_can_be_reused() {
        let log = EventLog::new();
        log.push(event(1)).unwrap();
        log.remove(EventId(1));
        assert!(log.is_empty());
        log.push(event(1)).unwrap();
        assert_eq!(log.get(EventId(1)).map(|e| e.id), Some(EventId(1)));
    }
}
