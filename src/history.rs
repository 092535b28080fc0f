use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::Region;
use crate::error::Result;

pub const HISTORY_FILE: &str = "scan_history.csv";
pub const HISTORY_HEADER: &str = "timestamp,key,title,region,count";

/// Count recorded when the fetch for a (competition, region) pair failed.
pub const FAILED_COUNT: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanHistoryRow {
    pub timestamp: DateTime<Utc>,
    pub competition_key: String,
    pub title: String,
    pub region: Region,
    pub event_count: i64,
}

impl ScanHistoryRow {
    pub fn fetched(
        timestamp: DateTime<Utc>,
        competition_key: &str,
        title: &str,
        region: Region,
        event_count: usize,
    ) -> Self {
        Self {
            timestamp,
            competition_key: competition_key.to_string(),
            title: title.to_string(),
            region,
            event_count: i64::try_from(event_count).unwrap_or(i64::MAX),
        }
    }

    pub fn failed(
        timestamp: DateTime<Utc>,
        competition_key: &str,
        title: &str,
        region: Region,
    ) -> Self {
        Self {
            timestamp,
            competition_key: competition_key.to_string(),
            title: title.to_string(),
            region,
            event_count: FAILED_COUNT,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.event_count == FAILED_COUNT
    }

    /// The title is written as a JSON string literal, not RFC 4180 quoted, so
    /// lines stay byte-compatible with existing history files.
    fn to_line(&self) -> Result<String> {
        Ok(format!(
            "{},{},{},{},{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.competition_key,
            serde_json::to_string(&self.title)?,
            self.region,
            self.event_count
        ))
    }
}

/// Appends rows to the history CSV, writing the header only when the file is new.
/// Returns the number of rows written.
pub fn append_history(path: &Path, rows: &[ScanHistoryRow]) -> Result<usize> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }

    let is_new = !path.exists();
    let mut buf = String::new();
    if is_new {
        buf.push_str(HISTORY_HEADER);
        buf.push('\n');
    }
    for row in rows {
        buf.push_str(&row.to_line()?);
        buf.push('\n');
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(buf.as_bytes())?;
    Ok(rows.len())
}
