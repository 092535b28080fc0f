use std::path::PathBuf;

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use tracing::{debug, info, warn};

use crate::config::{OddsConfig, Region};
use crate::csv_out::to_csv;
use crate::error::Result;
use crate::extract::{DropTally, Extraction, FirstHeadToHead, MarketSelector, extract_with};
use crate::history::{HISTORY_FILE, ScanHistoryRow, append_history};
use crate::normalize::overround;
use crate::odds_api::{
    CompetitionDescriptor, FailurePolicy, MarketFetch, OddsApi, fetch_markets,
    list_active_tennis_competitions,
};
use crate::rows::{EventOdds, NormalizedRow, SnapshotRow, to_records};
use crate::snapshot::{
    CompetitionPaths, SnapshotMeta, SnapshotPaths, write_competition_output, write_snapshot,
};
use crate::throttle::{Pause, Throttle};

#[derive(Debug, Clone)]
pub struct CompetitionHarvest {
    pub competition: CompetitionDescriptor,
    pub region: Region,
    /// Events returned by the upstream before extraction.
    pub events_seen: usize,
    pub rows: Vec<NormalizedRow>,
    pub drops: DropTally,
    pub failure: Option<String>,
}

pub fn list_tennis<P: Pause>(
    api: &mut dyn OddsApi,
    throttle: &mut Throttle<P>,
) -> Result<Vec<CompetitionDescriptor>> {
    throttle.wait();
    let comps = list_active_tennis_competitions(api)?;
    info!(count = comps.len(), "active tennis competitions");
    Ok(comps)
}

pub fn harvest_competition<P: Pause>(
    api: &mut dyn OddsApi,
    throttle: &mut Throttle<P>,
    competition: &CompetitionDescriptor,
    region: Region,
    policy: FailurePolicy,
    selector: &dyn MarketSelector,
) -> Result<CompetitionHarvest> {
    throttle.wait();
    let fetch = fetch_markets(api, &competition.key, region, policy)?;

    let mut harvest = CompetitionHarvest {
        competition: competition.clone(),
        region,
        events_seen: 0,
        rows: Vec::new(),
        drops: DropTally::default(),
        failure: None,
    };
    let events = match fetch {
        MarketFetch::Events(events) => events,
        MarketFetch::Failed(reason) => {
            harvest.failure = Some(reason);
            return Ok(harvest);
        }
    };

    harvest.events_seen = events.len();
    for event in &events {
        match extract_with(selector, event) {
            Extraction::Kept(market) => {
                debug!(
                    event = %market.event_id,
                    bookmaker = %market.bookmaker,
                    overround = ?overround(&market.decimal_odds),
                    "kept market"
                );
                harvest.rows.push(NormalizedRow::new(market));
            }
            Extraction::Dropped(reason) => harvest.drops.record(reason),
        }
    }

    info!(
        competition = %competition.key,
        %region,
        events = harvest.events_seen,
        rows = harvest.rows.len(),
        "harvested"
    );
    if harvest.drops.total() > 0 {
        warn!(
            competition = %competition.key,
            no_h2h = harvest.drops.no_head_to_head,
            too_few_outcomes = harvest.drops.too_few_outcomes,
            "events dropped"
        );
    }
    Ok(harvest)
}

#[derive(Debug, Clone)]
pub struct SnapshotReport {
    pub competitions: usize,
    pub failed_competitions: usize,
    pub rows: Vec<SnapshotRow>,
    pub drops: DropTally,
    pub paths: SnapshotPaths,
}

pub fn run_snapshot<P: Pause>(
    cfg: &OddsConfig,
    api: &mut dyn OddsApi,
    throttle: &mut Throttle<P>,
    fetched_at: DateTime<Utc>,
) -> Result<SnapshotReport> {
    let region = cfg.default_region;
    let competitions = list_tennis(api, throttle)?;

    let mut rows = Vec::new();
    let mut drops = DropTally::default();
    let mut failed_competitions = 0usize;
    for competition in &competitions {
        let harvest = harvest_competition(
            api,
            throttle,
            competition,
            region,
            FailurePolicy::Lenient,
            &FirstHeadToHead,
        )?;
        if harvest.failure.is_some() {
            failed_competitions += 1;
        }
        drops.merge(harvest.drops);
        rows.extend(
            harvest
                .rows
                .iter()
                .map(|row| SnapshotRow::new(competition, row)),
        );
    }

    let records = to_records(&rows)?;
    let paths = write_snapshot(
        &cfg.out_dir,
        &records,
        SnapshotMeta { fetched_at, region },
        true,
    )?;
    info!(
        rows = rows.len(),
        competitions = competitions.len(),
        failed = failed_competitions,
        dropped = drops.total(),
        "snapshot written"
    );

    Ok(SnapshotReport {
        competitions: competitions.len(),
        failed_competitions,
        rows,
        drops,
        paths,
    })
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub rows: Vec<ScanHistoryRow>,
    pub path: PathBuf,
}

/// History scan: one row per (competition, region) with the raw event count,
/// or the failure sentinel when the fetch failed.
pub fn run_history_scan<P: Pause>(
    cfg: &OddsConfig,
    api: &mut dyn OddsApi,
    throttle: &mut Throttle<P>,
    scanned_at: DateTime<Utc>,
) -> Result<ScanReport> {
    let competitions = list_tennis(api, throttle)?;

    let mut rows = Vec::with_capacity(competitions.len() * cfg.scan_regions.len());
    for competition in &competitions {
        for region in &cfg.scan_regions {
            let harvest = harvest_competition(
                api,
                throttle,
                competition,
                *region,
                FailurePolicy::Lenient,
                &FirstHeadToHead,
            )?;
            let row = if harvest.failure.is_some() {
                ScanHistoryRow::failed(scanned_at, &competition.key, &competition.title, *region)
            } else {
                ScanHistoryRow::fetched(
                    scanned_at,
                    &competition.key,
                    &competition.title,
                    *region,
                    harvest.events_seen,
                )
            };
            rows.push(row);
        }
    }

    let path = cfg.out_dir.join(HISTORY_FILE);
    append_history(&path, &rows)?;
    info!(rows = rows.len(), path = %path.display(), "scan history appended");

    Ok(ScanReport { rows, path })
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub region: Option<Region>,
    /// Case-insensitive pattern matched against the joined participant names.
    pub include: Option<String>,
    pub csv: bool,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub region: Region,
    pub events: Vec<EventOdds>,
    pub drops: DropTally,
    pub paths: CompetitionPaths,
}

pub fn fetch_competition<P: Pause>(
    cfg: &OddsConfig,
    api: &mut dyn OddsApi,
    throttle: &mut Throttle<P>,
    competition_key: &str,
    opts: &FetchOptions,
    fetched_at: DateTime<Utc>,
) -> Result<FetchReport> {
    let include = opts
        .include
        .as_deref()
        .map(|pattern| RegexBuilder::new(pattern).case_insensitive(true).build())
        .transpose()?;
    let region = opts.region.unwrap_or(cfg.default_region);
    let competition = CompetitionDescriptor {
        key: competition_key.to_string(),
        title: competition_key.to_string(),
        active: true,
    };

    let harvest = harvest_competition(
        api,
        throttle,
        &competition,
        region,
        FailurePolicy::Strict,
        &FirstHeadToHead,
    )?;
    let rows: Vec<&NormalizedRow> = harvest
        .rows
        .iter()
        .filter(|row| include.as_ref().is_none_or(|re| re.is_match(&row.matchup())))
        .collect();

    let events: Vec<EventOdds> = rows.iter().map(|row| EventOdds::from(*row)).collect();
    let csv = if opts.csv {
        let flat: Vec<SnapshotRow> = rows
            .iter()
            .map(|row| SnapshotRow::new(&competition, row))
            .collect();
        Some(to_csv(&to_records(&flat)?))
    } else {
        None
    };
    let paths = write_competition_output(
        &cfg.out_dir,
        competition_key,
        SnapshotMeta { fetched_at, region },
        &events,
        csv.as_deref(),
    )?;

    Ok(FetchReport {
        region,
        events,
        drops: harvest.drops,
        paths,
    })
}
