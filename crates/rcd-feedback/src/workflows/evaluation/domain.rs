use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Highest value an evaluator can award to a block.
pub const MAX_SCORE: u8 = 5;

/// Integer score in `0..=5` awarded to a single evaluation block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const ZERO: Score = Score(0);

    pub fn new(value: u8) -> Result<Self, ScoreOutOfRange> {
        if value > MAX_SCORE {
            return Err(ScoreOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, MAX_SCORE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("score {0} is outside the 0-5 scale")]
pub struct ScoreOutOfRange(pub u8);

/// The four fixed dimensions every evaluation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Deliveries,
    Attitude,
    Relationship,
    Development,
}

impl BlockKind {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Deliveries,
            Self::Attitude,
            Self::Relationship,
            Self::Development,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Deliveries => "Deliveries & Technical Quality",
            Self::Attitude => "Responsibility & Attitude",
            Self::Relationship => "Relationship & Teamwork",
            Self::Development => "Learning & Development",
        }
    }

    /// Prompt shown to the evaluator while filling in the narrative.
    pub const fn guiding_question(self) -> &'static str {
        match self {
            Self::Deliveries => {
                "How consistent were the clinical deliveries and their technical quality?"
            }
            Self::Attitude => "How did the professional own commitments, protocols, and punctuality?",
            Self::Relationship => "How did the professional collaborate with the team and patients?",
            Self::Development => "What did the professional learn and apply during the period?",
        }
    }

    pub const fn step(self) -> Step {
        match self {
            Self::Deliveries => Step::DeliveriesQuality,
            Self::Attitude => Step::Attitude,
            Self::Relationship => Step::Relationship,
            Self::Development => Step::Development,
        }
    }
}

/// Narrative plus score for one evaluation block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredBlock {
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub score: Score,
}

/// Everything collected about one employee during a wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub role: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub deliveries: ScoredBlock,
    #[serde(default)]
    pub attitude: ScoredBlock,
    #[serde(default)]
    pub relationship: ScoredBlock,
    #[serde(default)]
    pub development: ScoredBlock,
    #[serde(default)]
    pub commitment_text: String,
}

impl EvaluationRecord {
    /// Fresh record for a session started on `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            employee_name: String::new(),
            role: String::new(),
            date: today,
            period: String::new(),
            deliveries: ScoredBlock::default(),
            attitude: ScoredBlock::default(),
            relationship: ScoredBlock::default(),
            development: ScoredBlock::default(),
            commitment_text: String::new(),
        }
    }

    pub fn block(&self, kind: BlockKind) -> &ScoredBlock {
        match kind {
            BlockKind::Deliveries => &self.deliveries,
            BlockKind::Attitude => &self.attitude,
            BlockKind::Relationship => &self.relationship,
            BlockKind::Development => &self.development,
        }
    }

    pub fn block_mut(&mut self, kind: BlockKind) -> &mut ScoredBlock {
        match kind {
            BlockKind::Deliveries => &mut self.deliveries,
            BlockKind::Attitude => &mut self.attitude,
            BlockKind::Relationship => &mut self.relationship,
            BlockKind::Development => &mut self.development,
        }
    }

    pub fn scores(&self) -> [Score; 4] {
        BlockKind::ordered().map(|kind| self.block(kind).score)
    }

    /// Merge the populated fields of `patch` into the record.
    pub fn apply(&mut self, patch: RecordPatch) {
        let RecordPatch {
            employee_name,
            role,
            date,
            period,
            deliveries,
            attitude,
            relationship,
            development,
            commitment_text,
        } = patch;

        if let Some(value) = employee_name {
            self.employee_name = value;
        }
        if let Some(value) = role {
            self.role = value;
        }
        if let Some(value) = date {
            self.date = value;
        }
        if let Some(value) = period {
            self.period = value;
        }
        for (kind, block) in [
            (BlockKind::Deliveries, deliveries),
            (BlockKind::Attitude, attitude),
            (BlockKind::Relationship, relationship),
            (BlockKind::Development, development),
        ] {
            if let Some(block) = block {
                block.merge_into(self.block_mut(kind));
            }
        }
        if let Some(value) = commitment_text {
            self.commitment_text = value;
        }
    }
}

/// Partial update for a record; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub deliveries: Option<BlockPatch>,
    #[serde(default)]
    pub attitude: Option<BlockPatch>,
    #[serde(default)]
    pub relationship: Option<BlockPatch>,
    #[serde(default)]
    pub development: Option<BlockPatch>,
    #[serde(default)]
    pub commitment_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub score: Option<Score>,
}

impl BlockPatch {
    fn merge_into(self, block: &mut ScoredBlock) {
        if let Some(narrative) = self.narrative {
            block.narrative = narrative;
        }
        if let Some(score) = self.score {
            block.score = score;
        }
    }
}

/// Position in the wizard. Report is display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Identification,
    DeliveriesQuality,
    Attitude,
    Relationship,
    Development,
    Commitment,
    Report,
}

impl Step {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Identification,
            Self::DeliveriesQuality,
            Self::Attitude,
            Self::Relationship,
            Self::Development,
            Self::Commitment,
            Self::Report,
        ]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Identification => "Identification",
            Self::DeliveriesQuality => "Deliveries & Quality",
            Self::Attitude => "Attitude",
            Self::Relationship => "Relationship",
            Self::Development => "Development",
            Self::Commitment => "Commitment",
            Self::Report => "Report",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ordered().get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index()
            .checked_sub(1)
            .and_then(|idx| Self::ordered().get(idx).copied())
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Report)
    }

    /// Required fields still blank before the wizard may leave this step.
    pub fn missing_fields(self, record: &EvaluationRecord) -> Vec<&'static str> {
        let required: Vec<(&'static str, &str)> = match self {
            Self::Identification => vec![
                ("employee_name", record.employee_name.as_str()),
                ("role", record.role.as_str()),
            ],
            Self::Commitment => vec![("commitment_text", record.commitment_text.as_str())],
            _ => Vec::new(),
        };

        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect()
    }

    pub fn is_complete(self, record: &EvaluationRecord) -> bool {
        self.missing_fields(record).is_empty()
    }
}

/// Overall standing derived from the average block score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classification {
    A,
    B,
    C,
    D,
}

impl Classification {
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Clinical excellence",
            Self::B => "Practice standard",
            Self::C => "Improving",
            Self::D => "Needs retraining",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One recommended development action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlanItem {
    pub action: String,
    pub how: String,
    pub responsible: String,
    pub deadline: String,
    pub success_indicator: String,
}

/// Feedback produced once per completed session.
///
/// `average_score` and `classification` always come from local aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiReport {
    pub recognition: String,
    pub correction: String,
    pub direction: String,
    pub action_plan: Vec<ActionPlanItem>,
    pub average_score: f64,
    pub classification: Classification,
}
