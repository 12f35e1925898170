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

//! Temperature conversion.

use crate::LedgerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[serde(alias = "C")]
    Celsius,
    #[serde(alias = "F")]
    Fahrenheit,
    #[serde(alias = "K")]
    Kelvin,
}

impl TemperatureUnit {
    fn to_celsius(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            Self::Kelvin => value - 273.15,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            Self::Kelvin => celsius + 273.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ConvertRequest {
    pub value: f64,
    pub from: TemperatureUnit,
    pub to: TemperatureUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvertResponse {
    pub value: f64,
    pub from: TemperatureUnit,
    pub to: TemperatureUnit,
    pub result: f64,
}

/// Absolute zero in degrees Celsius.
const ABSOLUTE_ZERO_C: f64 = -273.15;

/// Converts `value` between units, rounded to two decimals.
///
/// # Errors
///
/// [`LedgerError::InvalidTemperature`] for non-finite input or a value below
/// absolute zero.
pub fn convert(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> Result<f64, LedgerError> {
    if !value.is_finite() {
        return Err(LedgerError::InvalidTemperature(format!("{value} is not a number")));
    }
    let celsius = from.to_celsius(value);
    // Small tolerance: -459.67 F lands a hair under -273.15 C.
    if celsius < ABSOLUTE_ZERO_C - 1e-9 {
        return Err(LedgerError::InvalidTemperature(format!(
            "{value} is below absolute zero"
        )));
    }
    Ok((to.from_celsius(celsius) * 100.0).round() / 100.0)
}

impl ConvertRequest {
    pub fn execute(self) -> Result<ConvertResponse, LedgerError> {
        let result = convert(self.value, self.from, self.to)?;
        Ok(ConvertResponse {
            value: self.value,
            from: self.from,
            to: self.to,
            result,
        })
    }
}
