use serde::Serialize;
use serde_json::{json, Value};

use super::domain::{BlockKind, EvaluationRecord};
use super::scoring::ScoreSummary;

/// Minimum number of action plan entries the brief asks the collaborator for.
pub const REQUESTED_ACTION_ITEMS: usize = 3;

/// Payload handed to a [`ReportGenerator`](super::generation::ReportGenerator).
///
/// The brief is free prose; `output_contract` is the structured shape the
/// collaborator must return and is the part other systems depend on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub brief: String,
    pub output_contract: Value,
    pub summary: ScoreSummary,
}

/// Build the generation request. Record contents are not validated here.
pub fn build_request(record: &EvaluationRecord, summary: &ScoreSummary) -> ReportRequest {
    ReportRequest {
        brief: compose_brief(record, summary),
        output_contract: output_contract(),
        summary: *summary,
    }
}

fn compose_brief(record: &EvaluationRecord, summary: &ScoreSummary) -> String {
    let mut brief = String::from(
        "Act as a people-management and HR specialist.\n\
         Write structured feedback in the R.C.D. format (Recognize, Correct, Direct) \
         and a detailed 30-day action plan focused on professional development.\n\n",
    );

    brief.push_str("Employee\n");
    brief.push_str(&format!("Name: {}\n", record.employee_name));
    brief.push_str(&format!("Role: {}\n", record.role));
    brief.push_str(&format!("Evaluation date: {}\n", record.date));
    if !record.period.trim().is_empty() {
        brief.push_str(&format!("Period: {}\n", record.period));
    }
    brief.push_str(&format!(
        "Qualitative average: {:.1} (classification {})\n\n",
        summary.average_score, summary.classification
    ));

    brief.push_str("Performance details\n");
    for kind in BlockKind::ordered() {
        let block = record.block(kind);
        brief.push_str(&format!(
            "- {}: {} (score: {})\n",
            kind.label(),
            block.narrative,
            block.score
        ));
    }

    brief.push_str("\nCommitment stated by the employee\n");
    brief.push_str(&format!("\"{}\"\n\n", record.commitment_text));

    brief.push_str("Requirements\n");
    brief.push_str(
        "1. The R.C.D. feedback must be humane and focus on behavioral and technical competencies.\n",
    );
    brief.push_str(&format!(
        "2. The action plan must contain at least {REQUESTED_ACTION_ITEMS} items that help the \
         employee raise their professional level.\n"
    ));
    brief.push_str(
        "3. Every action plan item must name the action, how to do it, who is responsible, \
         a deadline, and a success indicator.\n",
    );

    brief
}

/// Response schema in the collaborator's structured-output dialect.
pub fn output_contract() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recognition": {
                "type": "STRING",
                "description": "Strengths and praise (Recognize)"
            },
            "correction": {
                "type": "STRING",
                "description": "Gaps and points to improve (Correct)"
            },
            "direction": {
                "type": "STRING",
                "description": "Career direction (Direct)"
            },
            "actionPlan": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "action": { "type": "STRING" },
                        "how": { "type": "STRING" },
                        "responsible": { "type": "STRING" },
                        "deadline": { "type": "STRING" },
                        "successIndicator": { "type": "STRING" }
                    },
                    "required": ["action", "how", "responsible", "deadline", "successIndicator"]
                }
            }
        },
        "required": ["recognition", "correction", "direction", "actionPlan"]
    })
}
