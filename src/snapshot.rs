use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::Region;
use crate::csv_out::to_csv;
use crate::error::Result;
use crate::rows::Record;

pub const LATEST_CSV: &str = "odds_latest.csv";
pub const LATEST_JSON: &str = "odds_latest.json";

#[derive(Debug, Clone, Copy)]
pub struct SnapshotMeta {
    pub fetched_at: DateTime<Utc>,
    pub region: Region,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDocument<'a, T: Serialize> {
    fetched_at: String,
    region: Region,
    count: usize,
    rows: &'a [T],
}

#[derive(Debug, Clone)]
pub struct SnapshotPaths {
    pub latest_csv: PathBuf,
    pub latest_json: PathBuf,
    pub archive_csv: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CompetitionPaths {
    pub json: PathBuf,
    pub csv: Option<PathBuf>,
}

/// Minute-resolution UTC stamp with no separators, so names sort chronologically.
pub fn archive_stamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%d%H%M").to_string()
}

pub fn archive_file_name(ts: DateTime<Utc>) -> String {
    format!("odds_{}.csv", archive_stamp(ts))
}

/// Writes the overwritten latest CSV/JSON pair and, when `archive` is set, a new
/// timestamped CSV that never replaces an earlier one.
pub fn write_snapshot(
    dir: &Path,
    rows: &[Record],
    meta: SnapshotMeta,
    archive: bool,
) -> Result<SnapshotPaths> {
    fs::create_dir_all(dir)?;

    let csv = to_csv(rows);
    let doc = SnapshotDocument {
        fetched_at: meta.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        region: meta.region,
        count: rows.len(),
        rows,
    };
    let json = serde_json::to_string_pretty(&doc)?;

    let latest_csv = dir.join(LATEST_CSV);
    let latest_json = dir.join(LATEST_JSON);
    write_replacing(&latest_csv, csv.as_bytes())?;
    write_replacing(&latest_json, json.as_bytes())?;

    let archive_csv = if archive {
        Some(write_archive(dir, meta.fetched_at, csv.as_bytes())?)
    } else {
        None
    };

    Ok(SnapshotPaths {
        latest_csv,
        latest_json,
        archive_csv,
    })
}

/// Per-competition output of the single-competition fetch: `odds_{key}.json`
/// and optionally `odds_{key}.csv`.
pub fn write_competition_output<T: Serialize>(
    dir: &Path,
    competition_key: &str,
    meta: SnapshotMeta,
    events: &[T],
    csv: Option<&str>,
) -> Result<CompetitionPaths> {
    fs::create_dir_all(dir)?;

    let doc = SnapshotDocument {
        fetched_at: meta.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        region: meta.region,
        count: events.len(),
        rows: events,
    };
    let json_path = dir.join(format!("odds_{competition_key}.json"));
    write_replacing(&json_path, serde_json::to_string_pretty(&doc)?.as_bytes())?;

    let csv_path = match csv {
        Some(body) => {
            let path = dir.join(format!("odds_{competition_key}.csv"));
            write_replacing(&path, body.as_bytes())?;
            Some(path)
        }
        None => None,
    };

    Ok(CompetitionPaths {
        json: json_path,
        csv: csv_path,
    })
}

fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

fn write_archive(dir: &Path, ts: DateTime<Utc>, contents: &[u8]) -> Result<PathBuf> {
    let stamp = archive_stamp(ts);
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("odds_{stamp}.csv")
        } else {
            format!("odds_{stamp}_{attempt}.csv")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(contents)?;
                return Ok(path);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => return Err(err.into()),
        }
    }
}
