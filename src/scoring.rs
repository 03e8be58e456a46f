//! Return-to-work scoring.
//!
//! A fixed point formula over the intake answers. Missing or unreadable numbers
//! count as zero and missing or unreadable flags as `"false"`, so scoring never
//! fails, whatever shape the stored record has.

use crate::models::{fields, ClientRecord, Intervention, WorkScore};

pub const BASE_SCORE: i64 = 20;

pub const WORK_EXPERIENCE_CAP: i64 = 10;
pub const CANADA_WORK_EXPERIENCE_CAP: i64 = 5;
pub const SKILL_SCALE_CAP: i64 = 10;

pub const PRIME_AGE_BONUS: i64 = 5;
pub const MID_AGE_BONUS: i64 = 3;

pub const FELONY_PENALTY: i64 = 5;
pub const SUBSTANCE_USE_PENALTY: i64 = 3;
pub const MENTAL_HEALTH_PENALTY: i64 = 2;

pub const TRANSPORTATION_BONUS: i64 = 2;
pub const EMPLOYED_BONUS: i64 = 5;

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 100;

/// Candidate interventions, highest projected impact first.
const INTERVENTIONS: [(f64, &str); 3] = [
    (8.5, "Job training"),
    (6.3, "Counseling"),
    (5.0, "Mentorship programs"),
];

/// Scores a record and attaches the recommended interventions.
pub fn score(record: &ClientRecord) -> WorkScore {
    let baseline = baseline(record);
    tracing::debug!(
        "Computed baseline {} for client '{}'",
        baseline,
        record.id().unwrap_or("-")
    );

    WorkScore {
        baseline,
        interventions: recommended_interventions(),
    }
}

/// The clamped 0-100 baseline.
pub fn baseline(record: &ClientRecord) -> u8 {
    const SKILLS: [&str; 5] = [
        fields::READING_ENGLISH_SCALE,
        fields::SPEAKING_ENGLISH_SCALE,
        fields::WRITING_ENGLISH_SCALE,
        fields::NUMERACY_SCALE,
        fields::COMPUTER_SCALE,
    ];

    let mut total = BASE_SCORE;
    total = total.saturating_add(capped(record, fields::WORK_EXPERIENCE, WORK_EXPERIENCE_CAP));
    total = total.saturating_add(capped(record, fields::CANADA_WORKEX, CANADA_WORK_EXPERIENCE_CAP));
    total = total.saturating_add(age_bonus(record.count(fields::AGE)));
    for skill in SKILLS {
        total = total.saturating_add(capped(record, skill, SKILL_SCALE_CAP));
    }

    if is_set(record, fields::FELONY) {
        total = total.saturating_sub(FELONY_PENALTY);
    }
    if is_set(record, fields::SUBSTANCE_USE) {
        total = total.saturating_sub(SUBSTANCE_USE_PENALTY);
    }
    if is_set(record, fields::MENTAL_HEALTH_SUPPORT) {
        total = total.saturating_sub(MENTAL_HEALTH_PENALTY);
    }

    if is_set(record, fields::TRANSPORTATION) {
        total = total.saturating_add(TRANSPORTATION_BONUS);
    }
    if is_set(record, fields::CURRENTLY_EMPLOYED) {
        total = total.saturating_add(EMPLOYED_BONUS);
    }

    // Clamped into 0..=100, so the cast cannot truncate.
    total.clamp(MIN_SCORE, MAX_SCORE) as u8
}

/// The intervention list does not depend on the record.
pub fn recommended_interventions() -> Vec<Intervention> {
    INTERVENTIONS
        .iter()
        .map(|(impact, label)| Intervention(*impact, vec![(*label).to_string()]))
        .collect()
}

/// Only the ceiling applies; a negative value subtracts. Unreadable values count as zero.
fn capped(record: &ClientRecord, field: &str, cap: i64) -> i64 {
    record.count(field).unwrap_or(0).min(cap)
}

fn age_bonus(age: Option<i64>) -> i64 {
    match age {
        Some(18..=35) => PRIME_AGE_BONUS,
        Some(36..=50) => MID_AGE_BONUS,
        _ => 0,
    }
}

fn is_set(record: &ClientRecord, field: &str) -> bool {
    record.flag(field).is_true()
}
