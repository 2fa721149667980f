use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AdapterError;
use crate::model::ConversionCounters;
use crate::table::RawTable;

/// A numeric setting that can also be switched off.
///
/// `false` clears the value, `true` keeps whatever default applies and a
/// number replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericSetting {
    Value(f64),
    Enabled(bool),
}

impl NumericSetting {
    pub fn resolve(self, default: Option<f64>) -> Option<f64> {
        match self {
            NumericSetting::Value(value) => Some(value),
            NumericSetting::Enabled(true) => default,
            NumericSetting::Enabled(false) => None,
        }
    }
}

/// Reads an optional number that may be given as `false` to disable it.
pub(crate) fn deserialize_optional_setting<'de, D>(
    deserializer: D,
    default: Option<f64>,
) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumericSetting::deserialize(deserializer)?.resolve(default))
}

/// Writes a disabled setting back as `false`.
pub(crate) fn serialize_optional_setting<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(value) => NumericSetting::Value(*value),
        None => NumericSetting::Enabled(false),
    }
    .serialize(serializer)
}

/// Parses a temperature cell. Blank and `nan` cells are missing; anything
/// else that is not a finite number is malformed.
pub(crate) fn parse_optional_f64(value: &str) -> Result<Option<f64>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("na")
    {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
        Ok(parsed) => Err(format!("non-finite value {parsed}")),
        Err(err) => Err(format!("'{trimmed}' is not a number: {err}")),
    }
}

/// Temperature cell with malformed values absorbed as missing.
pub(crate) fn temperature_cell(
    value: &str,
    sentinel: Option<f64>,
    counters: &mut ConversionCounters,
) -> Option<f64> {
    match parse_optional_f64(value) {
        Ok(Some(parsed)) => match sentinel {
            Some(marker) if (parsed - marker).abs() < f64::EPSILON => None,
            _ => Some(parsed),
        },
        Ok(None) => None,
        Err(_) => {
            counters.malformed_values += 1;
            None
        }
    }
}

pub(crate) fn parse_optional_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

pub(crate) fn parse_required_i64(
    adapter: &'static str,
    table: &RawTable,
    row: usize,
    column: usize,
) -> Result<i64, AdapterError> {
    let value = table.cell(row, column).trim();
    value.parse::<i64>().map_err(|err| AdapterError::InvalidField {
        adapter,
        source_id: table.source_id.clone(),
        line_index: line_index(row),
        column: table.headers.get(column).cloned().unwrap_or_default(),
        message: if value.is_empty() {
            "value is absent".to_string()
        } else {
            format!("failed to parse '{value}' as integer: {err}")
        },
    })
}

/// 1-based file line of a data row; the header occupies line 1.
pub(crate) fn line_index(row: usize) -> usize {
    row + 2
}

/// Degrees Fahrenheit to Celsius, rounded to one decimal place.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    let celsius = (fahrenheit - 32.0) * 5.0 / 9.0;
    (celsius * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_conversion_rounds_to_one_decimal() {
        assert_eq!(fahrenheit_to_celsius(32.0), 0.0);
        assert_eq!(fahrenheit_to_celsius(98.6), 37.0);
        assert_eq!(fahrenheit_to_celsius(212.0), 100.0);
        assert_eq!(fahrenheit_to_celsius(-40.0), -40.0);
        assert_eq!(fahrenheit_to_celsius(50.5), 10.3);
    }

    #[test]
    fn temperature_cells_absorb_bad_values() {
        let mut counters = ConversionCounters::default();
        assert_eq!(temperature_cell(" 12.5 ", None, &mut counters), Some(12.5));
        assert_eq!(temperature_cell("", None, &mut counters), None);
        assert_eq!(temperature_cell("NaN", None, &mut counters), None);
        assert_eq!(temperature_cell("abc", None, &mut counters), None);
        assert_eq!(temperature_cell("inf", None, &mut counters), None);
        assert_eq!(temperature_cell("-99", Some(-99.0), &mut counters), None);
        assert_eq!(temperature_cell("-99", None, &mut counters), Some(-99.0));
        assert_eq!(counters.malformed_values, 2);
    }
}
