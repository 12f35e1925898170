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

//! Server configuration from command-line flags and environment variables.

use crate::rate_limit::RateLimitConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Expense Ledger - JSON API for expenses and unit conversion
///
/// Every flag can also be set through the environment variable shown.
#[derive(Parser, Debug, Clone)]
#[command(name = "expense-ledger-rs")]
#[command(about = "A JSON API for an in-memory expense ledger", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Take the client address from the first X-Forwarded-For entry
    ///
    /// Only enable behind a proxy that overwrites the header.
    #[arg(long, env = "TRUST_PROXY")]
    pub trust_proxy: bool,

    /// Write requests admitted per route and client in one window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = RateLimitConfig::DEFAULT_LIMIT)]
    pub rate_limit: u32,

    /// Length of the rate-limit window in seconds
    #[arg(
        long,
        env = "RATE_LIMIT_WINDOW_SECS",
        default_value_t = RateLimitConfig::DEFAULT_WINDOW.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_limit_window_secs: u64,
}

impl Config {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(
            self.rate_limit,
            Duration::from_secs(self.rate_limit_window_secs),
        )
    }
}
