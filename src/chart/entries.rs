use serde::{Deserialize, Serialize};

use crate::scoring::TopicAggregate;

/// Which tally drives a sector's radius and tooltip.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ChartBasis {
    #[default]
    #[strum(serialize = "correct")]
    Correct,
    #[strum(serialize = "first try")]
    FirstAttempt,
}

impl ChartBasis {
    pub fn toggled(self) -> Self {
        match self {
            ChartBasis::Correct => ChartBasis::FirstAttempt,
            ChartBasis::FirstAttempt => ChartBasis::Correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartEntry {
    pub label: String,
    pub correct_count: u64,
    pub total_count: u64,
    pub slice_weight: f64,
}

impl ChartEntry {
    /// Correctness ratio in `0..=1`, zero when the topic has no attempts.
    pub fn ratio(&self) -> f64 {
        if self.total_count > 0 {
            self.correct_count as f64 / self.total_count as f64
        } else {
            0.0
        }
    }

    pub fn percent(&self) -> u32 {
        (self.ratio() * 100.0).round() as u32
    }
}

/// Build chart entries from an aggregate. When every weight is zero but topics
/// exist, each topic gets weight 1 so the chart still shows equal sectors.
pub fn compute_entries(aggregate: &TopicAggregate, basis: ChartBasis) -> Vec<ChartEntry> {
    let mut entries: Vec<ChartEntry> = aggregate
        .iter()
        .map(|(label, score)| {
            let correct = match basis {
                ChartBasis::Correct => score.correct_count,
                ChartBasis::FirstAttempt => score.first_attempt_correct_count,
            };
            let total = score.total_count;
            let slice_weight = if total > 0 {
                (correct as f64 / total as f64) * total as f64
            } else {
                0.0
            };
            ChartEntry {
                label: label.to_string(),
                correct_count: correct,
                total_count: total,
                slice_weight,
            }
        })
        .collect();

    if total_weight(&entries) == 0.0 {
        for e in entries.iter_mut() {
            e.slice_weight = 1.0;
        }
    }
    entries
}

pub fn total_weight(entries: &[ChartEntry]) -> f64 {
    entries.iter().map(|e| e.slice_weight).sum()
}
