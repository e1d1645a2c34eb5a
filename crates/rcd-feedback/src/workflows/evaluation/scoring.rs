use serde::{Deserialize, Serialize};

use super::domain::{Classification, EvaluationRecord, Score};

const TIER_A_FLOOR: f64 = 4.5;
const TIER_B_FLOOR: f64 = 3.5;
const TIER_C_FLOOR: f64 = 2.5;

/// Locally computed outcome of the four block scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub average_score: f64,
    pub classification: Classification,
}

pub fn aggregate(record: &EvaluationRecord) -> ScoreSummary {
    aggregate_scores(record.scores())
}

pub fn aggregate_scores(scores: [Score; 4]) -> ScoreSummary {
    let total: u32 = scores.iter().map(|score| u32::from(score.value())).sum();
    let average_score = f64::from(total) / scores.len() as f64;

    ScoreSummary {
        average_score,
        classification: Classification::from_average(average_score),
    }
}

impl Classification {
    /// Thresholds are inclusive lower bounds, checked from the top tier down.
    pub fn from_average(average: f64) -> Self {
        if average >= TIER_A_FLOOR {
            Self::A
        } else if average >= TIER_B_FLOOR {
            Self::B
        } else if average >= TIER_C_FLOOR {
            Self::C
        } else {
            Self::D
        }
    }
}
