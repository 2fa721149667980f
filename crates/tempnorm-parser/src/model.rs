use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AdapterError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub location: Option<String>,
}

impl Reading {
    pub fn new(date: NaiveDate, temperature: Option<f64>) -> Self {
        Self {
            date,
            temperature,
            location: None,
        }
    }

    pub fn at(date: NaiveDate, temperature: Option<f64>, location: impl Into<String>) -> Self {
        Self {
            date,
            temperature,
            location: Some(location.into()),
        }
    }
}

/// Daily temperature readings from one source, optionally tagged by location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSeries {
    pub source_id: String,
    pub readings: Vec<Reading>,
}

impl CanonicalSeries {
    pub fn new(source_id: impl Into<String>, readings: Vec<Reading>) -> Self {
        Self {
            source_id: source_id.into(),
            readings,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn has_locations(&self) -> bool {
        self.readings.iter().any(|reading| reading.location.is_some())
    }

    /// Distinct locations in first-seen order.
    pub fn locations(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for reading in &self.readings {
            if let Some(location) = reading.location.as_deref() {
                if seen.insert(location) {
                    order.push(location);
                }
            }
        }
        order
    }

    /// Readings belonging to one location, in series order.
    pub fn readings_at<'a>(&'a self, location: &'a str) -> impl Iterator<Item = &'a Reading> + 'a {
        self.readings
            .iter()
            .filter(move |reading| reading.location.as_deref() == Some(location))
    }

    pub fn missing_count(&self) -> usize {
        self.readings
            .iter()
            .filter(|reading| reading.temperature.is_none())
            .count()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().filter_map(|reading| reading.temperature)
    }

    /// Fails if two readings of the same location share a date.
    pub fn ensure_unique_dates(&self, adapter: &'static str) -> Result<(), AdapterError> {
        let mut seen: HashSet<(Option<&str>, NaiveDate)> = HashSet::with_capacity(self.len());
        for reading in &self.readings {
            if !seen.insert((reading.location.as_deref(), reading.date)) {
                return Err(AdapterError::DuplicateDate {
                    adapter,
                    source_id: self.source_id.clone(),
                    date: reading.date,
                });
            }
        }
        Ok(())
    }
}

/// Row-level problems an adapter absorbed while converting a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounters {
    pub malformed_values: usize,
    pub invalid_dates: usize,
    pub out_of_scope: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub series: CanonicalSeries,
    pub counters: ConversionCounters,
}
