use super::common::{completed_record, score};
use crate::workflows::evaluation::{aggregate, aggregate_scores, Classification};

fn scores(values: [u8; 4]) -> [crate::workflows::evaluation::Score; 4] {
    values.map(score)
}

#[test]
fn high_scores_land_in_tier_a() {
    let summary = aggregate_scores(scores([5, 5, 4, 4]));
    assert_eq!(summary.average_score, 4.5);
    assert_eq!(summary.classification, Classification::A);
}

#[test]
fn uniform_threes_land_in_tier_c() {
    let summary = aggregate_scores(scores([3, 3, 3, 3]));
    assert_eq!(summary.average_score, 3.0);
    assert_eq!(summary.classification, Classification::C);
}

#[test]
fn untouched_scores_land_in_tier_d() {
    let summary = aggregate_scores(scores([0, 0, 0, 0]));
    assert_eq!(summary.average_score, 0.0);
    assert_eq!(summary.classification, Classification::D);
}

#[test]
fn three_and_a_half_is_tier_b() {
    let summary = aggregate_scores(scores([4, 4, 3, 3]));
    assert_eq!(summary.average_score, 3.5);
    assert_eq!(summary.classification, Classification::B);
}

#[test]
fn thresholds_are_inclusive_lower_bounds() {
    assert_eq!(Classification::from_average(4.49), Classification::B);
    assert_eq!(Classification::from_average(3.49), Classification::C);
    assert_eq!(Classification::from_average(2.49), Classification::D);
    assert_eq!(Classification::from_average(2.5), Classification::C);
    assert_eq!(Classification::from_average(5.0), Classification::A);
}

#[test]
fn aggregate_reads_every_block_of_the_record() {
    let summary = aggregate(&completed_record());
    assert_eq!(summary.average_score, 4.5);
    assert_eq!(summary.classification, Classification::A);
}

#[test]
fn scores_above_five_are_rejected() {
    assert!(crate::workflows::evaluation::Score::new(6).is_err());
    let parsed: Result<crate::workflows::evaluation::Score, _> = serde_json::from_str("9");
    assert!(parsed.is_err());
}
