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

//! Chain validation.
//!
//! Validators run on every chain before it is folded. They reject streams the
//! handlers could technically fold but that cannot come from a well-behaved
//! payment subsystem.

use crate::LedgerError;
use crate::chain::PaymentEventChain;
use crate::event::EventKind;

/// Check applied to every chain before reconciliation.
pub trait ChainValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns the violation found in `chain`.
    fn validate(&self, chain: &PaymentEventChain) -> Result<(), LedgerError>;
}

/// A chain starts with its reservation and contains no other.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceValidator;

impl ChainValidator for SequenceValidator {
    fn validate(&self, chain: &PaymentEventChain) -> Result<(), LedgerError> {
        for (position, event) in chain.iter().enumerate() {
            let is_root = position == 0;
            if is_root != (event.kind == EventKind::Reserve) {
                return Err(LedgerError::IllegalSequence {
                    event: event.id,
                    kind: event.kind,
                });
            }
        }
        Ok(())
    }
}

/// Every amount in a chain uses the root's currency.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrencyValidator;

impl ChainValidator for CurrencyValidator {
    fn validate(&self, chain: &PaymentEventChain) -> Result<(), LedgerError> {
        let Some(root) = chain.first() else {
            return Ok(());
        };
        let expected = root.amount.currency();
        match chain
            .iter()
            .find(|event| event.amount.currency() != expected)
        {
            Some(event) => Err(LedgerError::CurrencyMismatch {
                expected,
                found: event.amount.currency(),
            }),
            None => Ok(()),
        }
    }
}

/// Dates strictly increase along a chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChronologyValidator;

impl ChainValidator for ChronologyValidator {
    fn validate(&self, chain: &PaymentEventChain) -> Result<(), LedgerError> {
        match chain.windows(2).find(|pair| pair[1].date <= pair[0].date) {
            Some(pair) => Err(LedgerError::UnorderedEvents { event: pair[1].id }),
            None => Ok(()),
        }
    }
}

/// No event carries a negative amount.
#[derive(Debug, Default, Clone, Copy)]
pub struct AmountValidator;

impl ChainValidator for AmountValidator {
    fn validate(&self, chain: &PaymentEventChain) -> Result<(), LedgerError> {
        if chain.iter().any(|event| event.amount.is_negative()) {
            return Err(LedgerError::InvalidAmount);
        }
        Ok(())
    }
}

/// Validators applied by [`PaymentHistory::new`](crate::PaymentHistory::new).
pub fn default_validators() -> Vec<Box<dyn ChainValidator>> {
    vec![
        Box::new(SequenceValidator),
        Box::new(CurrencyValidator),
        Box::new(ChronologyValidator),
        Box::new(AmountValidator),
    ]
}
