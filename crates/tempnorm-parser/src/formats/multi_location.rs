use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::calendar::date_from_parts;
use crate::errors::AdapterError;
use crate::model::{CanonicalSeries, Conversion, ConversionCounters, Reading};
use crate::registry::TemperatureAdapter;
use crate::table::RawTable;

use super::common::fahrenheit_to_celsius;
use super::{
    deserialize_optional_setting, parse_optional_i64, serialize_optional_setting, temperature_cell,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiLocationColumns {
    pub year: String,
    pub month: String,
    pub day: String,
    pub temperature: String,
    pub region: String,
    pub city: String,
}

impl Default for MultiLocationColumns {
    fn default() -> Self {
        Self {
            year: "Year".to_string(),
            month: "Month".to_string(),
            day: "Day".to_string(),
            temperature: "AvgTemperature".to_string(),
            region: "Region".to_string(),
            city: "City".to_string(),
        }
    }
}

fn default_missing_sentinel() -> Option<f64> {
    Some(-99.0)
}

fn missing_sentinel_setting<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_setting(deserializer, default_missing_sentinel())
}

/// Many-city daily table in Fahrenheit, narrowed to one region and one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLocationAdapter {
    pub target_region: String,
    pub target_year: i32,
    #[serde(default)]
    pub columns: MultiLocationColumns,
    /// Reading that stands for "no data"; `false` in config disables it.
    #[serde(
        default = "default_missing_sentinel",
        deserialize_with = "missing_sentinel_setting",
        serialize_with = "serialize_optional_setting"
    )]
    pub missing_sentinel: Option<f64>,
}

struct ColumnIndices {
    year: usize,
    month: usize,
    day: usize,
    temperature: usize,
    region: usize,
    city: usize,
}

impl MultiLocationAdapter {
    const NAME: &'static str = "multi_location";

    pub fn new(target_region: impl Into<String>, target_year: i32) -> Self {
        Self {
            target_region: target_region.into(),
            target_year,
            columns: MultiLocationColumns::default(),
            missing_sentinel: default_missing_sentinel(),
        }
    }

    pub fn with_columns(mut self, columns: MultiLocationColumns) -> Self {
        self.columns = columns;
        self
    }

    fn indices(&self, table: &RawTable) -> Result<ColumnIndices, AdapterError> {
        Ok(ColumnIndices {
            year: table.column_index(Self::NAME, &self.columns.year)?,
            month: table.column_index(Self::NAME, &self.columns.month)?,
            day: table.column_index(Self::NAME, &self.columns.day)?,
            temperature: table.column_index(Self::NAME, &self.columns.temperature)?,
            region: table.column_index(Self::NAME, &self.columns.region)?,
            city: table.column_index(Self::NAME, &self.columns.city)?,
        })
    }

    fn row_date(
        &self,
        table: &RawTable,
        row: usize,
        idx: &ColumnIndices,
    ) -> Option<NaiveDate> {
        let month = parse_optional_i64(table.cell(row, idx.month))?;
        let day = parse_optional_i64(table.cell(row, idx.day))?;
        date_from_parts(
            self.target_year,
            u32::try_from(month).ok()?,
            u32::try_from(day).ok()?,
        )
    }
}

impl TemperatureAdapter for MultiLocationAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn multi_location(&self) -> bool {
        true
    }

    fn convert(&self, table: &RawTable) -> Result<Conversion, AdapterError> {
        let idx = self.indices(table)?;
        let target_region = self.target_region.trim();

        let mut counters = ConversionCounters::default();
        let mut readings = Vec::new();
        let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();

        for row in 0..table.height() {
            if !table.cell(row, idx.region).trim().eq_ignore_ascii_case(target_region) {
                counters.out_of_scope += 1;
                continue;
            }

            match parse_optional_i64(table.cell(row, idx.year)) {
                Some(year) if year == i64::from(self.target_year) => {}
                Some(_) => {
                    counters.out_of_scope += 1;
                    continue;
                }
                None => {
                    counters.invalid_dates += 1;
                    continue;
                }
            }

            let Some(date) = self.row_date(table, row, &idx) else {
                counters.invalid_dates += 1;
                continue;
            };

            let city = table.cell(row, idx.city).trim();
            if city.is_empty() {
                counters.malformed_values += 1;
                continue;
            }

            if !seen.insert((city.to_string(), date)) {
                counters.duplicates += 1;
                continue;
            }

            let temperature = temperature_cell(
                table.cell(row, idx.temperature),
                self.missing_sentinel,
                &mut counters,
            )
            .map(fahrenheit_to_celsius);

            readings.push(Reading::at(date, temperature, city));
        }

        if readings.is_empty() {
            return Err(AdapterError::EmptyData {
                adapter: Self::NAME,
                source_id: table.source_id.clone(),
            });
        }

        if counters.duplicates > 0 {
            warn!(
                source = %table.source_id,
                duplicates = counters.duplicates,
                "dropped repeated city/date readings"
            );
        }

        Ok(Conversion {
            series: CanonicalSeries::new(table.source_id.clone(), readings),
            counters,
        })
    }
}
