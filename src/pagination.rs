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

//! Page slicing over an already filtered, ordered sequence.
//!
//! Out-of-range pages are not an error: the caller gets an empty `data`
//! with accurate metadata and the requested page number echoed back.
//!
//! ```
//! use expense_ledger_rs::{PageRequest, paginate};
//!
//! let page = paginate((1..=25).collect::<Vec<_>>(), PageRequest::new(3, 10));
//! assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
//! assert_eq!(page.pagination.total_pages, 3);
//! ```

use serde::Serialize;

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PAGE_SIZE: u32 = 20;

    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_items: usize,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

/// Slices `items` into the requested page.
///
/// `page_size` is echoed as given; clamping is the caller's job. A zero
/// `page_size` yields no pages and no data.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total_items = items.len();
    let page_size = request.page_size as usize;
    let total_pages = match page_size {
        0 => 0,
        size => total_items.div_ceil(size),
    };

    let start = (request.page.saturating_sub(1) as usize).saturating_mul(page_size);
    let data = if page_size == 0 || start >= total_items {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(page_size).collect()
    };

    Page {
        data,
        pagination: PageInfo {
            total_items,
            current_page: request.page,
            page_size: request.page_size,
            total_pages,
        },
    }
}
