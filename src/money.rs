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

//! Currency-aware money arithmetic.
//!
//! [`Money`] pairs a [`Decimal`] amount with a [`Currency`]. Amounts of
//! different currencies can never be compared or added: every binary
//! operation returns [`LedgerError::CurrencyMismatch`] instead.
//!
//! # Example
//!
//! ```
//! use payment_ledger_rs::{Currency, Money};
//! use rust_decimal_macros::dec;
//!
//! let cad: Currency = "CAD".parse().unwrap();
//! let total = Money::new(dec!(60), cad).plus(&Money::new(dec!(40), cad)).unwrap();
//! assert_eq!(total, Money::new(dec!(100), cad));
//! ```

use crate::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Three-letter currency code, stored upper case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub fn code(&self) -> &str {
        // Constructed only from ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        match code.as_bytes() {
            [a, b, c] if code.bytes().all(|byte| byte.is_ascii_alphabetic()) => Ok(Currency([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(LedgerError::InvalidCurrency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

/// Immutable monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns `self + other`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CurrencyMismatch`] if the currencies differ,
    /// [`LedgerError::AmountOverflow`] if the sum is out of range.
    pub fn plus(&self, other: &Money) -> Result<Money, LedgerError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(LedgerError::AmountOverflow)?;
        Ok(Money::new(amount, self.currency))
    }

    /// Returns `self - other`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CurrencyMismatch`] if the currencies differ,
    /// [`LedgerError::AmountOverflow`] if the difference is out of range.
    pub fn minus(&self, other: &Money) -> Result<Money, LedgerError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(LedgerError::AmountOverflow)?;
        Ok(Money::new(amount, self.currency))
    }

    /// Three-way comparison of the amounts.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CurrencyMismatch`] if the currencies differ.
    pub fn compare(&self, other: &Money) -> Result<Ordering, LedgerError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// `true` when the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Sums `amounts`, starting from zero in `currency`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CurrencyMismatch`] on the first amount not in `currency`,
    /// [`LedgerError::AmountOverflow`] if the running total is out of range.
    pub fn sum<I>(currency: Currency, amounts: I) -> Result<Money, LedgerError>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |total, amount| total.plus(&amount))
    }

    /// Rounds the amount to `dp` decimal places using banker's rounding.
    pub fn round_dp(&self, dp: u32) -> Money {
        Money::new(self.amount.round_dp(dp), self.currency)
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), LedgerError> {
        if self.currency != other.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
