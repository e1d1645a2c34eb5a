use crate::infra::load_record;
use chrono::NaiveDate;
use clap::Args;
use rcd_feedback::config::AppConfig;
use rcd_feedback::error::AppError;
use rcd_feedback::telemetry;
use rcd_feedback::workflows::evaluation::{
    evaluate_record, render_text, GeminiReportClient, ReportView,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Path to a JSON evaluation record
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the evaluation date stored in the record (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs { input, date, json } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut record = load_record(&input)?;
    if let Some(date) = date {
        record.date = date;
    }

    let client = Arc::new(GeminiReportClient::new(&config.generation)?);
    info!(input = %input.display(), endpoint = client.endpoint(), "evaluating record");

    let view = evaluate_record(client, record).await?;
    print!("{}", render_output(&view, json)?);

    Ok(())
}

fn render_output(view: &ReportView, json: bool) -> Result<String, AppError> {
    if json {
        let mut out = serde_json::to_string_pretty(view).map_err(AppError::Output)?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(render_text(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcd_feedback::workflows::evaluation::{
        ActionPlanItem, AiReport, Classification, EvaluationRecord,
    };

    fn view() -> ReportView {
        let mut record =
            EvaluationRecord::new(NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"));
        record.employee_name = "Carlos".to_string();
        record.role = "Hygienist".to_string();
        let report = AiReport {
            recognition: "Gentle with patients".to_string(),
            correction: "Late charting".to_string(),
            direction: "Lead prevention talks".to_string(),
            action_plan: vec![ActionPlanItem {
                action: "Chart same day".to_string(),
                how: "Block time".to_string(),
                responsible: "Carlos".to_string(),
                deadline: "30 days".to_string(),
                success_indicator: "No open charts".to_string(),
            }],
            average_score: 0.0,
            classification: Classification::D,
        };
        ReportView::new(&record, &report)
    }

    #[test]
    fn json_output_is_a_parseable_report_view() {
        let out = render_output(&view(), true).expect("renders");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed["employee_name"], "Carlos");
        assert_eq!(parsed["classification"], "D");
    }

    #[test]
    fn text_output_uses_the_plain_report() {
        let out = render_output(&view(), false).expect("renders");
        assert!(out.contains("Level D - Needs retraining"));
    }
}
