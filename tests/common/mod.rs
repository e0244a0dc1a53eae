use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;

use scaledown::telemetry::{get_subscriber, init_subscriber};
use scaledown::{HealthHistory, HealthRecord};

// Installs the tracing stack once per test binary. Set TEST_LOG to see output.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "debug".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

pub fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(offset.into())
}

/// A year of near-constant daily metrics.
pub fn steady_year() -> HealthHistory {
    (0..365u32)
        .map(|i| HealthRecord {
            timestamp: day(i),
            heart_rate: 70.0 + (i % 5) as f64 - 2.0,
            steps: 8000 + (i % 4) * 100,
            sleep_hours: 7.0 + (i % 3) as f64 * 0.25,
            calories: 2400 + (i % 6) * 10,
        })
        .collect()
}

pub fn single_record() -> HealthHistory {
    HealthHistory::new(vec![HealthRecord {
        timestamp: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        heart_rate: 72.0,
        steps: 9000,
        sleep_hours: 7.5,
        calories: 2100,
    }])
}
