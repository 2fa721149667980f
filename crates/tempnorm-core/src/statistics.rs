//! Read-only summaries over cleaned series.

use std::collections::BTreeMap;

use serde::Serialize;
use tempnorm_parser::{CanonicalSeries, MonthLabel};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (N - 1); absent below two values.
    pub std_dev: Option<f64>,
}

impl SummaryStats {
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let std_dev = if values.len() >= 2 {
            let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            Some((m2 / (n - 1.0)).sqrt())
        } else {
            None
        };

        Some(Self {
            count: values.len(),
            mean,
            min,
            max,
            std_dev,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub month: MonthLabel,
    pub stats: SummaryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationStats {
    pub location: String,
    pub stats: SummaryStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthComparison {
    pub month: MonthLabel,
    pub left_mean: Option<f64>,
    pub right_mean: Option<f64>,
    pub delta: Option<f64>,
}

fn values_by_month(series: &CanonicalSeries) -> BTreeMap<MonthLabel, Vec<f64>> {
    let mut grouped: BTreeMap<MonthLabel, Vec<f64>> = BTreeMap::new();
    for reading in &series.readings {
        if let Some(value) = reading.temperature {
            grouped
                .entry(MonthLabel::from_date(reading.date))
                .or_default()
                .push(value);
        }
    }
    grouped
}

/// Per calendar month, in calendar order. Months without values are omitted.
pub fn monthly_stats(series: &CanonicalSeries) -> Vec<MonthlyStats> {
    values_by_month(series)
        .into_iter()
        .filter_map(|(month, values)| {
            SummaryStats::compute(&values).map(|stats| MonthlyStats { month, stats })
        })
        .collect()
}

pub fn annual_stats(series: &CanonicalSeries) -> Option<SummaryStats> {
    let values: Vec<f64> = series.values().collect();
    SummaryStats::compute(&values)
}

/// Per location, in first-seen order.
pub fn location_stats(series: &CanonicalSeries) -> Vec<LocationStats> {
    series
        .locations()
        .into_iter()
        .filter_map(|location| {
            let values: Vec<f64> = series
                .readings_at(location)
                .filter_map(|reading| reading.temperature)
                .collect();
            SummaryStats::compute(&values).map(|stats| LocationStats {
                location: location.to_string(),
                stats,
            })
        })
        .collect()
}

/// Month-by-month mean of two series side by side; `delta` is right minus left.
pub fn compare_monthly(left: &CanonicalSeries, right: &CanonicalSeries) -> Vec<MonthComparison> {
    let left_stats = monthly_stats(left);
    let right_stats = monthly_stats(right);
    let mean_of = |stats: &[MonthlyStats], month: MonthLabel| {
        stats
            .iter()
            .find(|entry| entry.month == month)
            .map(|entry| entry.stats.mean)
    };

    MonthLabel::ALL
        .iter()
        .map(|&month| {
            let left_mean = mean_of(&left_stats, month);
            let right_mean = mean_of(&right_stats, month);
            let delta = match (left_mean, right_mean) {
                (Some(l), Some(r)) => Some(r - l),
                _ => None,
            };
            MonthComparison {
                month,
                left_mean,
                right_mean,
                delta,
            }
        })
        .collect()
}
