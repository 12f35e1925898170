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

//! # Expense Ledger
//!
//! This library backs a small JSON API: an in-memory expense ledger with
//! filtering, aggregation and pagination, a temperature converter, and a
//! per-route admission limiter guarding the write endpoints.
//!
//! ## Core Components
//!
//! - [`RateLimitRegistry`]: Fixed-window quota per `(route, client)` pair
//! - [`LedgerStore`]: Insertion-ordered expense records with filter and summary
//! - [`paginate`]: Slices a filtered sequence into a page plus metadata
//! - [`LedgerError`]: Error types surfaced to the HTTP layer
//!
//! ## Example
//!
//! ```
//! use expense_ledger_rs::{
//!     ClientIdentity, ManualClock, RateLimitConfig, RateLimitRegistry, RouteId, Timestamp,
//! };
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::new(Timestamp::from_millis(0)));
//! let limiter = RateLimitRegistry::new(RateLimitConfig::default(), clock);
//!
//! let route = RouteId::new("POST", "/expenses");
//! let client = ClientIdentity::from("203.0.113.7");
//! let decision = limiter.admit(&route, &client, Timestamp::from_millis(0));
//! assert!(decision.allowed);
//! assert_eq!(decision.remaining, 99);
//! ```
//!
//! ## Thread Safety
//!
//! Rate-limit buckets sit in a sharded map with per-entry locking and the
//! ledger behind a read-write lock, so handlers share both through an `Arc`.

mod base;
pub mod clock;
pub mod config;
pub mod convert;
pub mod error;
pub mod expense;
pub mod ledger;
mod pagination;
pub mod rate_limit;
pub mod server;
pub mod validation;

pub use base::{ClientIdentity, ExpenseId, RouteId};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::Config;
pub use convert::{TemperatureUnit, convert};
pub use error::LedgerError;
pub use expense::{ExpenseFilter, ExpenseRecord, NewExpense, YearMonth};
pub use ledger::{LedgerStore, Summary};
pub use pagination::{Page, PageInfo, PageRequest, paginate};
pub use rate_limit::{Decision, RateLimitConfig, RateLimitRegistry};
pub use server::{AppState, create_router};
