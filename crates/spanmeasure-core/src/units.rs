//! Unit conversion utilities
//!
//! Distances are stored in meters everywhere inside the measurement core.
//! This module is the single place where meters become display strings:
//! millimeters with one decimal, inches with two.
//! Parsing accepts the same strings back, including fractional inches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters in one meter
pub const MILLIMETERS_PER_METER: f64 = 1000.0;

/// Inches in one meter (display conversion factor)
pub const INCHES_PER_METER: f64 = 39.3701;

/// Linear display unit for a measurement session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Millimeters, one decimal place
    #[serde(rename = "mm", alias = "millimeters")]
    Millimeters,
    /// Inches, two decimal places
    #[serde(rename = "in", alias = "inches")]
    Inches,
}

impl Default for LengthUnit {
    fn default() -> Self {
        Self::Millimeters
    }
}

impl LengthUnit {
    /// Short label used as the display suffix ("mm" or "in")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Millimeters => "mm",
            Self::Inches => "in",
        }
    }

    /// Number of display units in one meter
    pub fn per_meter(&self) -> f64 {
        match self {
            Self::Millimeters => MILLIMETERS_PER_METER,
            Self::Inches => INCHES_PER_METER,
        }
    }

    /// Decimal places shown when formatting
    pub fn decimals(&self) -> usize {
        match self {
            Self::Millimeters => 1,
            Self::Inches => 2,
        }
    }

    /// Convert meters into this unit (no rounding)
    pub fn from_meters(&self, meters: f64) -> f64 {
        meters * self.per_meter()
    }

    /// Convert a value in this unit back into meters
    pub fn to_meters(&self, value: f64) -> f64 {
        value / self.per_meter()
    }

    /// Smallest displayed step, expressed in meters
    pub fn display_step_meters(&self) -> f64 {
        let step = 10f64.powi(-(self.decimals() as i32));
        self.to_meters(step)
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" | "metric" => Ok(Self::Millimeters),
            "in" | "inch" | "inches" | "imperial" | "\"" => Ok(Self::Inches),
            _ => Err(format!("Unknown length unit: {}", s)),
        }
    }
}

/// Format a distance for display
///
/// * `meters` - Raw distance in meters
/// * `unit` - Target display unit
///
/// Millimeters are shown with one decimal (`"1000.0 mm"`), inches with two
/// (`"39.37 in"`). This never fails.
pub fn format_distance(meters: f64, unit: LengthUnit) -> String {
    format!(
        "{:.*} {}",
        unit.decimals(),
        unit.from_meters(meters),
        unit.label()
    )
}

/// Parse a distance string back to meters
///
/// * `input` - Display string, with or without the unit suffix
/// * `unit` - Unit the number is expressed in
///
/// Inches also accept fractions such as `"1 1/2"` or `"3/8 in"`.
pub fn parse_distance(input: &str, unit: LengthUnit) -> Result<f64, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0.0);
    }

    let number = strip_unit_suffix(input, unit)?;
    let value = match unit {
        LengthUnit::Millimeters => number.parse::<f64>().map_err(|e| e.to_string())?,
        LengthUnit::Inches if number.contains('/') => parse_fractional(number)?,
        LengthUnit::Inches => number.parse::<f64>().map_err(|e| e.to_string())?,
    };

    if !value.is_finite() {
        return Err(format!("Distance is not a finite number: {}", input));
    }

    Ok(unit.to_meters(value))
}

fn strip_unit_suffix(input: &str, unit: LengthUnit) -> Result<&str, String> {
    let other = match unit {
        LengthUnit::Millimeters => LengthUnit::Inches,
        LengthUnit::Inches => LengthUnit::Millimeters,
    };

    if let Some(rest) = input.strip_suffix(unit.label()) {
        return Ok(rest.trim_end());
    }
    if unit == LengthUnit::Inches {
        if let Some(rest) = input.strip_suffix('"') {
            return Ok(rest.trim_end());
        }
    }
    if input.ends_with(other.label()) {
        return Err(format!(
            "Expected a distance in {}, got {}",
            unit.label(),
            other.label()
        ));
    }
    Ok(input)
}

/// Whole and fractional inch parts, e.g. "5 1/8" or "-1/2"
fn parse_fractional(input: &str) -> Result<f64, String> {
    let (sign, body) = match input.strip_prefix('-') {
        Some(rest) => (-1.0, rest.trim_start()),
        None => (1.0, input),
    };

    let mut total = 0.0;
    for part in body.split_whitespace() {
        if part.contains('/') {
            let frac_parts: Vec<&str> = part.split('/').collect();
            if frac_parts.len() != 2 {
                return Err("Invalid fraction format".to_string());
            }
            let num = frac_parts[0]
                .parse::<f64>()
                .map_err(|_| "Invalid numerator")?;
            let den = frac_parts[1]
                .parse::<f64>()
                .map_err(|_| "Invalid denominator")?;
            if den == 0.0 {
                return Err("Division by zero".to_string());
            }
            total += num / den;
        } else {
            total += part.parse::<f64>().map_err(|_| "Invalid number part")?;
        }
    }
    Ok(sign * total)
}
