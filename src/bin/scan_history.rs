use anyhow::{Context, Result};
use chrono::Utc;

use tennis_odds::config::OddsConfig;
use tennis_odds::logging::init_logging;
use tennis_odds::odds_api::HttpOddsApi;
use tennis_odds::pipeline::run_history_scan;
use tennis_odds::throttle::Throttle;

fn main() -> Result<()> {
    let cfg = OddsConfig::from_env().context("failed to load configuration")?;
    init_logging(&cfg.log_filter);

    let mut api = HttpOddsApi::new(&cfg);
    let mut throttle = Throttle::new(cfg.throttle);
    let report = run_history_scan(&cfg, &mut api, &mut throttle, Utc::now())
        .context("history scan failed")?;

    let failed = report.rows.iter().filter(|r| r.is_failure()).count();
    println!("Scan complete");
    println!("History: {}", report.path.display());
    println!("Rows appended: {} ({} failed)", report.rows.len(), failed);
    for row in report.rows.iter().filter(|r| r.is_failure()).take(6) {
        println!("   - {} [{}] fetch failed", row.competition_key, row.region);
    }
    if let Some(remaining) = api.quota().remaining {
        println!("Quota remaining: {remaining}");
    }
    Ok(())
}
