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

//! In-memory expense ledger.
//!
//! The [`LedgerStore`] owns every [`ExpenseRecord`] and answers filter and
//! aggregate queries over them.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use expense_ledger_rs::{ExpenseFilter, LedgerStore, NewExpense};
//! use rust_decimal_macros::dec;
//!
//! let ledger = LedgerStore::new();
//! let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
//! ledger.create(NewExpense::new(dec!(10.5), "food", date));
//! ledger.create(NewExpense::new(dec!(20.75), "food", date));
//!
//! let summary = ledger.summarize(&ExpenseFilter::all().category("food"));
//! assert_eq!(summary.total, dec!(31.25));
//! assert_eq!(summary.count, 2);
//! ```
//!
//! # Thread Safety
//!
//! Records sit behind a single [`RwLock`]. An append holds the write lock, so
//! readers observe either the whole record or none of it.

use crate::base::ExpenseId;
use crate::expense::{ExpenseFilter, ExpenseRecord, NewExpense};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

/// Aggregate over the records selected by a filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub count: usize,
    pub filters: ExpenseFilter,
}

/// Insertion-ordered expense ledger.
///
/// # Invariants
///
/// - Record IDs are unique.
/// - Records are never mutated after [`LedgerStore::create`] returns.
/// - Every query returns owned copies; callers cannot reach internal storage.
#[derive(Debug, Default)]
pub struct LedgerStore {
    records: RwLock<Vec<ExpenseRecord>>,
}

impl LedgerStore {
    /// Currency amounts carry two decimal places.
    pub const DECIMAL_PRECISION: u32 = 2;

    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Stores a validated expense under a fresh ID and returns the stored copy.
    pub fn create(&self, expense: NewExpense) -> ExpenseRecord {
        let record = ExpenseRecord::from_new(ExpenseId::new_v4(), expense);
        self.records.write().push(record.clone());
        debug!(id = %record.id, category = %record.category, "expense created");
        record
    }

    /// Returns matching records in insertion order.
    pub fn filter(&self, filter: &ExpenseFilter) -> Vec<ExpenseRecord> {
        self.records
            .read()
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    /// Sums and counts matching records, echoing back the supplied filters.
    ///
    /// A total beyond [`Decimal::MAX`] saturates there instead of panicking.
    pub fn summarize(&self, filter: &ExpenseFilter) -> Summary {
        let records = self.records.read();
        let (total, count) = records
            .iter()
            .filter(|record| filter.matches(record))
            .fold((Some(Decimal::ZERO), 0usize), |(total, count), record| {
                (total.and_then(|sum| sum.checked_add(record.amount)), count + 1)
            });
        drop(records);

        let total = total.unwrap_or_else(|| {
            warn!(count, "expense total overflowed, saturating");
            Decimal::MAX
        });

        Summary {
            total: total.round_dp(Self::DECIMAL_PRECISION),
            count,
            filters: filter.clone(),
        }
    }

    pub fn get(&self, id: &ExpenseId) -> Option<ExpenseRecord> {
        self.records.read().iter().find(|record| record.id == *id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drops every record. Intended for test harnesses.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}
