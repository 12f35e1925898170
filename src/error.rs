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

//! Error types for request handling.

use thiserror::Error;

/// Errors surfaced to the HTTP layer.
///
/// Validation variants map to `400`, [`LedgerError::ExpenseNotFound`] to `404`,
/// [`LedgerError::RateLimitExceeded`] to `429` and [`LedgerError::Internal`]
/// to `500`. The ledger and pagination operations themselves are infallible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is zero, negative or has more than two decimal places
    #[error("invalid amount (must be positive with at most two decimal places)")]
    InvalidAmount,

    /// Category is empty after trimming
    #[error("category must not be empty")]
    EmptyCategory,

    /// Date is not an existing `YYYY-MM-DD` calendar day
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// Month filter is not a valid `YYYY-MM` value
    #[error("invalid month '{0}' (expected YYYY-MM)")]
    InvalidMonth(String),

    /// Page number is below 1
    #[error("page must be at least 1")]
    InvalidPage,

    /// Page size is outside `1..=100`
    #[error("page size must be between 1 and {max}")]
    InvalidPageSize { max: u32 },

    /// Temperature value is not finite or lies below absolute zero
    #[error("invalid temperature: {0}")]
    InvalidTemperature(String),

    /// Body or query string could not be decoded
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// No expense with the requested ID
    #[error("expense not found")]
    ExpenseNotFound,

    /// Write quota exhausted for the current window
    #[error("too many requests, retry after {retry_after_secs} seconds")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Programming or configuration fault, such as serving without peer
    /// addresses
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns `true` for errors caused by malformed caller input.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            LedgerError::ExpenseNotFound
                | LedgerError::RateLimitExceeded { .. }
                | LedgerError::Internal(_)
        )
    }
}
