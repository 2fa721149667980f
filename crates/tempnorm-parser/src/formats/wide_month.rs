use serde::{Deserialize, Serialize};

use crate::calendar::{date_from_parts, MonthLabel};
use crate::errors::AdapterError;
use crate::model::{CanonicalSeries, Conversion, ConversionCounters, Reading};
use crate::registry::TemperatureAdapter;
use crate::table::RawTable;

use super::temperature_cell;

/// One column per calendar month, one row per day of month.
///
/// Row `n` (zero-based) holds day `n + 1` of every month. Short months leave
/// trailing rows that do not name a real date; those cells are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WideMonthAdapter {
    pub reference_year: i32,
    pub month_columns: Vec<String>,
}

impl Default for WideMonthAdapter {
    fn default() -> Self {
        Self {
            reference_year: 2023,
            month_columns: MonthLabel::ALL
                .iter()
                .map(|month| month.as_str().to_string())
                .collect(),
        }
    }
}

impl WideMonthAdapter {
    const NAME: &'static str = "wide_month";

    pub fn new(reference_year: i32) -> Self {
        Self {
            reference_year,
            ..Self::default()
        }
    }

    pub fn with_month_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.month_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    fn month_indices(&self, table: &RawTable) -> Result<Vec<(MonthLabel, usize)>, AdapterError> {
        if self.month_columns.len() != MonthLabel::ALL.len() {
            return Err(AdapterError::Configuration {
                adapter: Self::NAME,
                message: format!(
                    "expected 12 month columns, found {}",
                    self.month_columns.len()
                ),
            });
        }

        MonthLabel::ALL
            .iter()
            .zip(&self.month_columns)
            .map(|(month, column)| Ok((*month, table.column_index(Self::NAME, column)?)))
            .collect()
    }
}

impl TemperatureAdapter for WideMonthAdapter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn convert(&self, table: &RawTable) -> Result<Conversion, AdapterError> {
        let months = self.month_indices(table)?;
        if table.height() == 0 {
            return Err(AdapterError::EmptyData {
                adapter: Self::NAME,
                source_id: table.source_id.clone(),
            });
        }

        let mut counters = ConversionCounters::default();
        let mut readings = Vec::with_capacity(table.height() * months.len());

        for (month, column) in months {
            for row in 0..table.height() {
                let temperature = temperature_cell(table.cell(row, column), None, &mut counters);
                let day = (row + 1) as u32;
                match date_from_parts(self.reference_year, month.number(), day) {
                    Some(date) => readings.push(Reading::new(date, temperature)),
                    None => counters.invalid_dates += 1,
                }
            }
        }

        Ok(Conversion {
            series: CanonicalSeries::new(table.source_id.clone(), readings),
            counters,
        })
    }
}
