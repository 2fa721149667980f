use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tempnorm_parser::CanonicalSeries;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationScore {
    pub location: String,
    /// Sum of absolute daily differences against the reference.
    pub deviation: f64,
    pub overlap_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Comparable locations, lowest deviation first.
    pub scores: Vec<LocationScore>,
    /// Locations sharing no dated value with the reference.
    pub unmatched: Vec<String>,
}

impl MatchResult {
    pub fn best(&self) -> Option<&LocationScore> {
        self.scores.first()
    }

    pub fn score_for(&self, location: &str) -> Option<&LocationScore> {
        self.scores.iter().find(|score| score.location == location)
    }
}

/// Scores every candidate location by cumulative absolute deviation from the
/// reference over the dates both carry a value for.
pub fn match_locations(
    reference: &CanonicalSeries,
    candidates: &CanonicalSeries,
) -> Result<MatchResult> {
    if reference.has_locations() {
        return Err(PipelineError::Matching(format!(
            "reference series {} carries locations; expected a single-location series",
            reference.source_id
        )));
    }

    let reference_by_date: HashMap<NaiveDate, f64> = reference
        .readings
        .iter()
        .filter_map(|reading| reading.temperature.map(|value| (reading.date, value)))
        .collect();

    let mut scores = Vec::new();
    let mut unmatched = Vec::new();

    for location in candidates.locations() {
        let mut deviation = 0.0;
        let mut overlap_days = 0usize;
        for reading in candidates.readings_at(location) {
            let (Some(value), Some(reference_value)) =
                (reading.temperature, reference_by_date.get(&reading.date))
            else {
                continue;
            };
            deviation += (value - reference_value).abs();
            overlap_days += 1;
        }

        if overlap_days == 0 {
            warn!(location, "no comparable data against reference");
            unmatched.push(location.to_string());
        } else {
            scores.push(LocationScore {
                location: location.to_string(),
                deviation,
                overlap_days,
            });
        }
    }

    scores.sort_by(|a, b| {
        a.deviation
            .total_cmp(&b.deviation)
            .then_with(|| a.location.cmp(&b.location))
    });

    debug!(
        reference = %reference.source_id,
        candidates = %candidates.source_id,
        scored = scores.len(),
        unmatched = unmatched.len(),
        "matched locations"
    );

    Ok(MatchResult { scores, unmatched })
}
