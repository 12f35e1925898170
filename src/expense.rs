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

//! Expense records and the predicates used to select them.

use crate::LedgerError;
use crate::base::ExpenseId;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A stored expense. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
}

impl ExpenseRecord {
    pub(crate) fn from_new(id: ExpenseId, expense: NewExpense) -> Self {
        Self {
            id,
            amount: expense.amount,
            category: expense.category,
            date: expense.date,
        }
    }
}

/// A validated creation payload.
///
/// Produced by [`crate::validation`]; the ledger trusts its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
}

impl NewExpense {
    pub fn new(amount: Decimal, category: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            amount,
            category: category.into(),
            date,
        }
    }

    /// Returns `true` if `record` carries exactly this payload.
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        self.amount == record.amount && self.category == record.category && self.date == record.date
    }
}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        ((0..=9999).contains(&year) && (1..=12).contains(&month)).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Same result as comparing against the first 7 characters of the
    /// date's `YYYY-MM-DD` rendering.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for YearMonth {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidMonth(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let digits = |range: std::ops::Range<usize>| {
            bytes[range.clone()]
                .iter()
                .all(u8::is_ascii_digit)
                .then(|| &s[range])
        };
        let year = digits(0..4).and_then(|y| y.parse().ok()).ok_or_else(invalid)?;
        let month = digits(5..7).and_then(|m| m.parse().ok()).ok_or_else(invalid)?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Optional predicates applied with AND semantics.
///
/// Serializes only the keys that were supplied, so "not filtered" and
/// "filtered to a value that matches nothing" stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpenseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<YearMonth>,
}

impl ExpenseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn month(mut self, month: YearMonth) -> Self {
        self.month = Some(month);
        self
    }

    /// Category comparison is exact and case-sensitive.
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        self.category
            .as_deref()
            .is_none_or(|category| record.category == category)
            && self.month.is_none_or(|month| month.contains(record.date))
    }
}
