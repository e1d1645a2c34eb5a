use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{ActionPlanItem, AiReport, BlockKind, Classification, EvaluationRecord};

#[derive(Debug, Clone, Serialize)]
pub struct BlockScoreEntry {
    pub block: BlockKind,
    pub block_label: &'static str,
    pub score: u8,
    pub narrative: String,
}

/// Read model of a finished report for display.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub employee_name: String,
    pub role: String,
    pub date: NaiveDate,
    pub period: String,
    pub blocks: Vec<BlockScoreEntry>,
    pub average_score: f64,
    pub average_label: String,
    pub classification: Classification,
    pub classification_label: &'static str,
    pub recognition: String,
    pub correction: String,
    pub direction: String,
    pub action_plan: Vec<ActionPlanItem>,
    pub commitment_text: String,
}

impl ReportView {
    pub fn new(record: &EvaluationRecord, report: &AiReport) -> Self {
        let blocks = BlockKind::ordered()
            .into_iter()
            .map(|kind| {
                let block = record.block(kind);
                BlockScoreEntry {
                    block: kind,
                    block_label: kind.label(),
                    score: block.score.value(),
                    narrative: block.narrative.clone(),
                }
            })
            .collect();

        Self {
            employee_name: record.employee_name.clone(),
            role: record.role.clone(),
            date: record.date,
            period: record.period.clone(),
            blocks,
            average_score: report.average_score,
            average_label: format!("{:.1}", report.average_score),
            classification: report.classification,
            classification_label: report.classification.label(),
            recognition: report.recognition.clone(),
            correction: report.correction.clone(),
            direction: report.direction.clone(),
            action_plan: report.action_plan.clone(),
            commitment_text: record.commitment_text.clone(),
        }
    }
}

/// Plain-text rendering used by the command line.
pub fn render_text(view: &ReportView) -> String {
    let mut out = String::new();

    out.push_str("Professional Performance Report\n");
    out.push_str(&format!("Employee: {} ({})\n", view.employee_name, view.role));
    out.push_str(&format!("Date: {}", view.date));
    if !view.period.trim().is_empty() {
        out.push_str(&format!(" | Period: {}", view.period));
    }
    out.push('\n');
    out.push_str(&format!(
        "Average: {} | Level {} - {}\n",
        view.average_label, view.classification, view.classification_label
    ));

    out.push_str("\nScores\n");
    for entry in &view.blocks {
        out.push_str(&format!("- {}: {}/5\n", entry.block_label, entry.score));
    }

    for (heading, body) in [
        ("Recognize", &view.recognition),
        ("Correct", &view.correction),
        ("Direct", &view.direction),
    ] {
        out.push_str(&format!("\n{heading}\n{body}\n"));
    }

    out.push_str("\nDevelopment plan\n");
    for (idx, item) in view.action_plan.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, item.action));
        out.push_str(&format!("   How: {}\n", item.how));
        if !item.responsible.trim().is_empty() {
            out.push_str(&format!("   Responsible: {}\n", item.responsible));
        }
        out.push_str(&format!("   Deadline: {}\n", item.deadline));
        out.push_str(&format!("   Success indicator: {}\n", item.success_indicator));
    }

    if !view.commitment_text.trim().is_empty() {
        out.push_str(&format!("\nCommitment\n\"{}\"\n", view.commitment_text));
    }

    out
}
