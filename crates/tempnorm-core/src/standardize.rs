use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tempnorm_parser::{CanonicalSeries, Reading};
use tracing::debug;

/// How missing points are replaced once outliers have been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Mean of every remaining value of the location.
    #[default]
    Mean,
    /// Linear interpolation between the nearest valid neighbors, by day distance.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub jump_threshold: Option<f64>,
    pub fill: FillPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::global()
    }
}

impl FilterConfig {
    /// Widest recorded surface extremes.
    pub const fn global() -> Self {
        Self {
            low: Some(-60.0),
            high: Some(50.0),
            jump_threshold: Some(17.0),
            fill: FillPolicy::Mean,
        }
    }

    /// Sources known to come from a warm climate.
    pub const fn warm_climate() -> Self {
        Self {
            low: Some(-30.0),
            high: Some(50.0),
            jump_threshold: Some(15.0),
            fill: FillPolicy::Mean,
        }
    }

    /// No rejection, only gap filling.
    pub const fn fill_only(fill: FillPolicy) -> Self {
        Self {
            low: None,
            high: None,
            jump_threshold: None,
            fill,
        }
    }

    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.low = Some(low);
        self.high = Some(high);
        self
    }

    pub fn with_jump_threshold(mut self, threshold: f64) -> Self {
        self.jump_threshold = Some(threshold);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub range_rejected: usize,
    pub jump_rejected: usize,
    pub filled: usize,
    pub unfilled: usize,
}

impl FilterReport {
    fn absorb(&mut self, other: FilterReport) {
        self.range_rejected += other.range_rejected;
        self.jump_rejected += other.jump_rejected;
        self.filled += other.filled;
        self.unfilled += other.unfilled;
    }
}

/// Sorts the series by date, rejects implausible points and fills the gaps.
///
/// Each location is cleaned on its own; readings without a location form
/// one group. Rows are never added or removed.
pub fn standardize(series: &mut CanonicalSeries, config: &FilterConfig) -> FilterReport {
    series.readings.sort_by_key(|reading| reading.date);

    let mut report = FilterReport::default();
    for indices in location_groups(&series.readings) {
        report.absorb(standardize_group(&mut series.readings, &indices, config));
    }

    debug!(
        source = %series.source_id,
        range_rejected = report.range_rejected,
        jump_rejected = report.jump_rejected,
        filled = report.filled,
        unfilled = report.unfilled,
        "standardized series"
    );
    report
}

/// Reading indices per location, in first-seen order.
fn location_groups(readings: &[Reading]) -> Vec<Vec<usize>> {
    let mut slots: HashMap<Option<&str>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, reading) in readings.iter().enumerate() {
        let slot = *slots
            .entry(reading.location.as_deref())
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[slot].push(idx);
    }
    groups
}

fn standardize_group(
    readings: &mut [Reading],
    indices: &[usize],
    config: &FilterConfig,
) -> FilterReport {
    let dates: Vec<NaiveDate> = indices.iter().map(|&idx| readings[idx].date).collect();
    let mut values: Vec<Option<f64>> = indices
        .iter()
        .map(|&idx| readings[idx].temperature)
        .collect();

    let range_rejected = reject_out_of_range(&mut values, config.low, config.high);
    let jump_rejected = match config.jump_threshold {
        Some(threshold) => reject_jumps(&mut values, threshold),
        None => 0,
    };

    let missing_before = count_missing(&values);
    match config.fill {
        FillPolicy::Mean => fill_mean(&mut values),
        FillPolicy::Linear => fill_linear(&mut values, &dates),
    }
    let unfilled = count_missing(&values);

    for (&idx, value) in indices.iter().zip(values) {
        readings[idx].temperature = value;
    }

    FilterReport {
        range_rejected,
        jump_rejected,
        filled: missing_before - unfilled,
        unfilled,
    }
}

fn count_missing(values: &[Option<f64>]) -> usize {
    values.iter().filter(|value| value.is_none()).count()
}

/// Marks values above `high` or below `low` missing. Returns how many were marked.
pub fn reject_out_of_range(values: &mut [Option<f64>], low: Option<f64>, high: Option<f64>) -> usize {
    let mut rejected = 0;
    for value in values.iter_mut() {
        let Some(v) = *value else { continue };
        let too_low = low.is_some_and(|low| v < low);
        let too_high = high.is_some_and(|high| v > high);
        if too_low || too_high {
            *value = None;
            rejected += 1;
        }
    }
    rejected
}

/// Marks values whose difference to an adjacent value exceeds `threshold`.
///
/// Differences are taken from one snapshot, so both sides of a spike are
/// marked. Comparisons against a missing neighbor are skipped.
pub fn reject_jumps(values: &mut [Option<f64>], threshold: f64) -> usize {
    let snapshot = values.to_vec();
    let mut rejected = 0;

    for (idx, current) in snapshot.iter().enumerate() {
        let Some(v) = *current else { continue };
        let previous = idx.checked_sub(1).and_then(|prev| snapshot[prev]);
        let next = snapshot.get(idx + 1).copied().flatten();

        let exceeds = |neighbor: Option<f64>| neighbor.is_some_and(|n| (v - n).abs() > threshold);
        if exceeds(previous) || exceeds(next) {
            values[idx] = None;
            rejected += 1;
        }
    }
    rejected
}

pub fn fill_mean(values: &mut [Option<f64>]) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    for value in values.iter_mut().filter(|value| value.is_none()) {
        *value = Some(mean);
    }
}

/// Interpolates each gap from the nearest valid values on either side.
///
/// Gaps at either end have only one anchor and stay missing.
pub fn fill_linear(values: &mut [Option<f64>], dates: &[NaiveDate]) {
    let len = values.len().min(dates.len());

    let mut next_anchor: Vec<Option<(usize, f64)>> = vec![None; len];
    let mut upcoming = None;
    for idx in (0..len).rev() {
        if let Some(v) = values[idx] {
            upcoming = Some((idx, v));
        }
        next_anchor[idx] = upcoming;
    }

    let mut previous: Option<(usize, f64)> = None;
    for idx in 0..len {
        if let Some(v) = values[idx] {
            previous = Some((idx, v));
            continue;
        }
        let (Some((lo_idx, lo)), Some((hi_idx, hi))) = (previous, next_anchor[idx]) else {
            continue;
        };
        let span = (dates[hi_idx] - dates[lo_idx]).num_days() as f64;
        let offset = (dates[idx] - dates[lo_idx]).num_days() as f64;
        values[idx] = if span > 0.0 {
            Some(lo + (hi - lo) * offset / span)
        } else {
            Some(lo)
        };
    }
}
