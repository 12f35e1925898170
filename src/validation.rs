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

//! Request DTOs and their validation into domain values.
//!
//! Everything that reaches the [`crate::LedgerStore`] or the pagination
//! engine has passed through here first.

use crate::LedgerError;
use crate::expense::{ExpenseFilter, NewExpense, YearMonth};
use crate::pagination::PageRequest;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Largest amount a single expense may carry.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Body of `POST /expenses`.
///
/// ```json
/// {"amount": 12.5, "category": "food", "date": "2025-01-15"}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
    pub date: String,
}

impl ExpenseRequest {
    pub fn validate(self) -> Result<NewExpense, LedgerError> {
        if self.amount <= Decimal::ZERO
            || self.amount > MAX_AMOUNT
            || self.amount.normalize().scale() > 2
        {
            return Err(LedgerError::InvalidAmount);
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(LedgerError::EmptyCategory);
        }

        let date = parse_date(&self.date)?;
        Ok(NewExpense::new(self.amount, category, date))
    }
}

/// Query string of `GET /expenses`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    pub month: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListQuery {
    pub fn validate(self) -> Result<(ExpenseFilter, PageRequest), LedgerError> {
        let filter = build_filter(self.category, self.month)?;

        let page = self.page.unwrap_or(PageRequest::DEFAULT_PAGE);
        if page < 1 {
            return Err(LedgerError::InvalidPage);
        }
        let page_size = self.page_size.unwrap_or(PageRequest::DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(LedgerError::InvalidPageSize { max: MAX_PAGE_SIZE });
        }

        Ok((filter, PageRequest::new(page, page_size)))
    }
}

/// Query string of `GET /expenses/summary`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    pub category: Option<String>,
    pub month: Option<String>,
}

impl SummaryQuery {
    pub fn validate(self) -> Result<ExpenseFilter, LedgerError> {
        build_filter(self.category, self.month)
    }
}

fn build_filter(category: Option<String>, month: Option<String>) -> Result<ExpenseFilter, LedgerError> {
    Ok(ExpenseFilter {
        category,
        month: month.as_deref().map(str::parse::<YearMonth>).transpose()?,
    })
}

/// Parses a strict `YYYY-MM-DD` date that names an existing calendar day.
pub fn parse_date(input: &str) -> Result<NaiveDate, LedgerError> {
    let bytes = input.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(LedgerError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| LedgerError::InvalidDate(input.to_string()))
}
