use anyhow::{Context, Result};
use chrono::Utc;

use tennis_odds::config::OddsConfig;
use tennis_odds::logging::init_logging;
use tennis_odds::odds_api::HttpOddsApi;
use tennis_odds::pipeline::run_snapshot;
use tennis_odds::throttle::Throttle;

fn main() -> Result<()> {
    let cfg = OddsConfig::from_env().context("failed to load configuration")?;
    init_logging(&cfg.log_filter);

    let mut api = HttpOddsApi::new(&cfg);
    let mut throttle = Throttle::new(cfg.throttle);
    let report = run_snapshot(&cfg, &mut api, &mut throttle, Utc::now())
        .context("snapshot run failed")?;

    println!("Snapshot complete");
    println!(
        "Competitions: {} ({} failed)",
        report.competitions, report.failed_competitions
    );
    println!("Rows: {}", report.rows.len());
    if report.drops.total() > 0 {
        println!(
            "Dropped events: {} (no h2h={} too few outcomes={})",
            report.drops.total(),
            report.drops.no_head_to_head,
            report.drops.too_few_outcomes
        );
    }
    println!("Latest: {}", report.paths.latest_csv.display());
    println!("Latest JSON: {}", report.paths.latest_json.display());
    if let Some(path) = &report.paths.archive_csv {
        println!("Archive: {}", path.display());
    }
    if let Some(remaining) = api.quota().remaining {
        println!("Quota remaining: {remaining}");
    }
    Ok(())
}
