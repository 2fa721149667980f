use serde::{Deserialize, Serialize};

use crate::calendar::date_from_parts;
use crate::errors::AdapterError;
use crate::model::{CanonicalSeries, Conversion, ConversionCounters, Reading};
use crate::registry::TemperatureAdapter;
use crate::table::RawTable;

use super::{line_index, parse_required_i64, temperature_cell};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationLogColumns {
    pub year: String,
    pub month: String,
    pub day: String,
    pub temperature: String,
}

impl Default for StationLogColumns {
    fn default() -> Self {
        Self {
            year: "year".to_string(),
            month: "month".to_string(),
            day: "day".to_string(),
            temperature: "temperature".to_string(),
        }
    }
}

/// Observatory log with explicit date parts and a single temperature column.
///
/// Date parts are structural: a row without a usable date aborts the
/// conversion instead of being skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationLogAdapter {
    pub columns: StationLogColumns,
}

impl StationLogAdapter {
    const NAME: &'static str = "station_log";

    pub fn new(columns: StationLogColumns) -> Self {
        Self { columns }
    }

    fn date_part(
        table: &RawTable,
        row: usize,
        column: usize,
    ) -> Result<u32, AdapterError> {
        let value = parse_required_i64(Self::NAME, table, row, column)?;
        u32::try_from(value).map_err(|_| AdapterError::InvalidField {
            adapter: Self::NAME,
            source_id: table.source_id.clone(),
            line_index: line_index(row),
            column: table.headers.get(column).cloned().unwrap_or_default(),
            message: format!("{value} is not a calendar component"),
        })
    }
}

impl TemperatureAdapter for StationLogAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn convert(&self, table: &RawTable) -> Result<Conversion, AdapterError> {
        let year_idx = table.column_index(Self::NAME, &self.columns.year)?;
        let month_idx = table.column_index(Self::NAME, &self.columns.month)?;
        let day_idx = table.column_index(Self::NAME, &self.columns.day)?;
        let temp_idx = table.column_index(Self::NAME, &self.columns.temperature)?;

        if table.height() == 0 {
            return Err(AdapterError::EmptyData {
                adapter: Self::NAME,
                source_id: table.source_id.clone(),
            });
        }

        let mut counters = ConversionCounters::default();
        let mut readings = Vec::with_capacity(table.height());

        for row in 0..table.height() {
            let year = parse_required_i64(Self::NAME, table, row, year_idx)?;
            let month = Self::date_part(table, row, month_idx)?;
            let day = Self::date_part(table, row, day_idx)?;

            let date = i32::try_from(year)
                .ok()
                .and_then(|year| date_from_parts(year, month, day))
                .ok_or_else(|| AdapterError::InvalidField {
                    adapter: Self::NAME,
                    source_id: table.source_id.clone(),
                    line_index: line_index(row),
                    column: format!(
                        "{}/{}/{}",
                        self.columns.year, self.columns.month, self.columns.day
                    ),
                    message: format!("{year}-{month:02}-{day:02} is not a calendar date"),
                })?;

            let temperature = temperature_cell(table.cell(row, temp_idx), None, &mut counters);
            readings.push(Reading::new(date, temperature));
        }

        let series = CanonicalSeries::new(table.source_id.clone(), readings);
        series.ensure_unique_dates(Self::NAME)?;

        Ok(Conversion { series, counters })
    }
}
