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

//! Property-based tests for the ledger, pagination and admission limiter.
//!
//! These tests verify invariants that should hold for any sequence of
//! valid operations.

use chrono::NaiveDate;
use expense_ledger_rs::{
    ClientIdentity, ExpenseFilter, LedgerStore, ManualClock, NewExpense, PageRequest,
    RateLimitConfig, RateLimitRegistry, RouteId, Timestamp, YearMonth, paginate,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a positive amount (0.01 to 10000.00 with 2 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_category() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["food", "transport", "rent", "Food"]).prop_map(str::to_string)
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2024i32..=2025, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_expense() -> impl Strategy<Value = NewExpense> {
    (arb_amount(), arb_category(), arb_date())
        .prop_map(|(amount, category, date)| NewExpense::new(amount, category, date))
}

fn arb_filter() -> impl Strategy<Value = ExpenseFilter> {
    (
        prop::option::of(arb_category()),
        prop::option::of((2024i32..=2025, 1u32..=12)),
    )
        .prop_map(|(category, month)| ExpenseFilter {
            category,
            month: month.and_then(|(y, m)| YearMonth::new(y, m)),
        })
}

// =============================================================================
// Ledger Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Summary total and count agree with the filtered records.
    #[test]
    fn summary_matches_filter(
        expenses in prop::collection::vec(arb_expense(), 0..40),
        filter in arb_filter(),
    ) {
        let ledger = LedgerStore::new();
        for expense in expenses {
            ledger.create(expense);
        }

        let matched = ledger.filter(&filter);
        let summary = ledger.summarize(&filter);

        prop_assert_eq!(summary.count, matched.len());
        prop_assert_eq!(summary.total, matched.iter().map(|r| r.amount).sum::<Decimal>());
        prop_assert_eq!(summary.filters, filter);
    }

    /// Filtering keeps insertion order and only returns matching records.
    #[test]
    fn filter_is_ordered_subsequence(
        expenses in prop::collection::vec(arb_expense(), 0..40),
        filter in arb_filter(),
    ) {
        let ledger = LedgerStore::new();
        for expense in expenses {
            ledger.create(expense);
        }

        let all = ledger.filter(&ExpenseFilter::all());
        let expected: Vec<_> = all.iter().filter(|r| filter.matches(r)).cloned().collect();
        prop_assert_eq!(ledger.filter(&filter), expected);
    }

    /// Every created record comes back with its payload intact.
    #[test]
    fn create_round_trips(expense in arb_expense()) {
        let ledger = LedgerStore::new();
        let record = ledger.create(expense.clone());
        prop_assert!(expense.matches(&record));
        prop_assert_eq!(ledger.get(&record.id), Some(record));
    }
}

// =============================================================================
// Pagination Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Metadata is consistent and the page is the expected slice.
    #[test]
    fn page_is_correct_slice(
        total in 0usize..300,
        page in 1u32..40,
        page_size in 1u32..=100,
    ) {
        let items: Vec<usize> = (0..total).collect();
        let result = paginate(items.clone(), PageRequest::new(page, page_size));

        let size = page_size as usize;
        let start = ((page - 1) as usize * size).min(total);
        let end = (start + size).min(total);

        prop_assert_eq!(result.pagination.total_items, total);
        prop_assert_eq!(result.pagination.total_pages, total.div_ceil(size));
        prop_assert_eq!(result.pagination.current_page, page);
        prop_assert_eq!(result.pagination.page_size, page_size);
        prop_assert_eq!(&result.data[..], &items[start..end]);
    }
}

// =============================================================================
// Admission Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Within one window exactly `limit` calls are admitted, in order.
    #[test]
    fn admits_exactly_limit_per_window(
        limit in 1u32..50,
        extra in 1usize..50,
        offsets in prop::collection::vec(0u64..59_999, 1..100),
    ) {
        let clock = Arc::new(ManualClock::new(Timestamp(0)));
        let registry = RateLimitRegistry::new(
            RateLimitConfig::new(limit, Duration::from_secs(60)),
            clock,
        );
        let route = RouteId::new("POST", "/expenses");
        let client = ClientIdentity::from("10.0.0.1");

        let mut offsets = offsets;
        offsets.sort_unstable();
        let calls = limit as usize + extra;

        let decisions: Vec<_> = (0..calls)
            .map(|i| {
                let offset = offsets[i.min(offsets.len() - 1)];
                let now = Timestamp(offset);
                (registry.admit(&route, &client, now), now)
            })
            .collect();

        for (i, (decision, now)) in decisions.iter().enumerate() {
            if i < limit as usize {
                prop_assert!(decision.allowed);
                prop_assert_eq!(decision.remaining, limit - 1 - i as u32);
            } else {
                prop_assert!(!decision.allowed);
                prop_assert_eq!(decision.remaining, 0);
                let retry = decision.retry_after_secs(*now);
                prop_assert!(retry > 0 && retry <= 60);
            }
        }
    }

    /// Distinct routes never share a quota.
    #[test]
    fn routes_are_isolated(spent in 0u32..20) {
        let clock = Arc::new(ManualClock::new(Timestamp(0)));
        let registry = RateLimitRegistry::new(
            RateLimitConfig::new(10, Duration::from_secs(60)),
            clock,
        );
        let client = ClientIdentity::from("10.0.0.1");
        let convert = RouteId::new("POST", "/convert");
        let expenses = RouteId::new("POST", "/expenses");

        for _ in 0..spent {
            registry.admit(&convert, &client, Timestamp(0));
        }
        let decision = registry.admit(&expenses, &client, Timestamp(0));
        prop_assert!(decision.allowed);
        prop_assert_eq!(decision.remaining, 9);
    }
}
