use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use scaledown::settings::get_settings;
use scaledown::synthetic::{default_start, sample_history};
use scaledown::telemetry::{get_subscriber, init_subscriber};
use scaledown::{CompressedHistory, CompressionReporter};

#[derive(Parser, Debug)]
#[command(name = "healthsync-scaledown", about = "Health history compression report")]
struct Args {
    #[arg(long, default_value = "user123")]
    user_id: String,

    #[arg(long, default_value_t = 365)]
    days: u32,

    /// Seed for reproducible sample data
    #[arg(long, env = "SCALEDOWN_SEED")]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = get_settings().context("Failed to read settings")?;

    let subscriber = get_subscriber(
        "healthsync-scaledown".into(),
        settings.log_level.clone(),
        std::io::stderr,
    );
    init_subscriber(subscriber);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let history = sample_history(default_start(), args.days, &mut rng);

    let reporter = CompressionReporter::from_settings(&settings)?;
    let report = reporter.compress_history(&args.user_id, &history);
    println!("{}", serde_json::to_string_pretty(&report)?);
    tracing::info!(summary = %report, "Report ready");

    if !report.success {
        anyhow::bail!(report.error.unwrap_or_default());
    }

    let archive = CompressedHistory::compress(&history, reporter.compressor())?;
    let restored = CompressedHistory::from_blob(&archive.to_blob())?.decompress()?;
    anyhow::ensure!(
        restored == history,
        "archive round trip changed the history"
    );
    tracing::info!(
        blob_bytes = archive.to_blob().len(),
        records = restored.len(),
        "Archive round trip verified"
    );

    Ok(())
}
