use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use tennis_odds::config::{OddsConfig, Region};
use tennis_odds::logging::init_logging;
use tennis_odds::odds_api::HttpOddsApi;
use tennis_odds::pipeline::{FetchOptions, fetch_competition, list_tennis};
use tennis_odds::throttle::Throttle;

/// Tennis head-to-head odds for a single competition.
#[derive(Parser, Debug)]
#[command(name = "tennis_odds", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List active tennis competitions.
    Sports,
    /// Fetch h2h odds for one competition key.
    Fetch {
        competition: String,
        /// Keep only events whose player names match this pattern (case-insensitive).
        #[arg(long)]
        include: Option<String>,
        /// Also write odds_{key}.csv.
        #[arg(long)]
        csv: bool,
        #[arg(long, value_enum)]
        region: Option<Region>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = OddsConfig::from_env().context("failed to load configuration")?;
    init_logging(&cfg.log_filter);

    let mut api = HttpOddsApi::new(&cfg);
    let mut throttle = Throttle::new(cfg.throttle);

    match cli.command {
        Command::Sports => {
            let comps = list_tennis(&mut api, &mut throttle).context("sports catalog fetch failed")?;
            println!("{}", serde_json::to_string_pretty(&comps)?);
        }
        Command::Fetch {
            competition,
            include,
            csv,
            region,
        } => {
            let opts = FetchOptions {
                region,
                include,
                csv,
            };
            let report = fetch_competition(
                &cfg,
                &mut api,
                &mut throttle,
                &competition,
                &opts,
                Utc::now(),
            )
            .with_context(|| format!("odds fetch failed for {competition}"))?;

            println!("Fetched {} events ({})", report.events.len(), report.region);
            println!("JSON: {}", report.paths.json.display());
            if let Some(path) = &report.paths.csv {
                println!("CSV: {}", path.display());
            }
            if report.drops.total() > 0 {
                println!("Dropped: {} events without a usable h2h market", report.drops.total());
            }
        }
    }

    let quota = api.quota();
    info!(
        requests = api.requests_made(),
        remaining = ?quota.remaining,
        used = ?quota.used,
        "done"
    );
    Ok(())
}
