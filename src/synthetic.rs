use chrono::{Days, NaiveDate};
use rand::Rng;

use crate::types::{HealthHistory, HealthRecord};

/// Generates `days` consecutive daily records starting at `start`, with
/// values drawn from typical adult ranges.
pub fn sample_history<R: Rng>(start: NaiveDate, days: u32, rng: &mut R) -> HealthHistory {
    (0..days)
        .filter_map(|offset| start.checked_add_days(Days::new(offset.into())))
        .map(|timestamp| HealthRecord {
            timestamp,
            heart_rate: rng.gen_range(60.0..80.0),
            steps: rng.gen_range(3000..15000),
            sleep_hours: rng.gen_range(5.5..8.5),
            calories: rng.gen_range(1800..3000),
        })
        .collect()
}

pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}
