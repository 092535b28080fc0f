use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{OddsError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.the-odds-api.com/v4";
pub const DEFAULT_OUT_DIR: &str = "data";
const DEFAULT_THROTTLE_MS: u64 = 200;

/// Bookmaker licensing jurisdiction used to scope upstream prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Eu,
    Uk,
    Us,
    Au,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Eu => "eu",
            Region::Uk => "uk",
            Region::Us => "us",
            Region::Au => "au",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = OddsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "eu" => Ok(Region::Eu),
            "uk" => Ok(Region::Uk),
            "us" => Ok(Region::Us),
            "au" => Ok(Region::Au),
            other => Err(OddsError::Config(format!(
                "unknown region {other:?}, expected eu, uk, us or au"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OddsConfig {
    pub api_key: String,
    pub api_base: String,
    pub default_region: Region,
    /// Regions walked by the history scan, in order.
    pub scan_regions: Vec<Region>,
    pub throttle: Duration,
    pub out_dir: PathBuf,
    pub log_filter: String,
}

impl OddsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            default_region: Region::default(),
            scan_regions: vec![Region::default()],
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            log_filter: "info".to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("ODDS_API_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OddsError::Config("ODDS_API_KEY missing".to_string()))?;

        let mut cfg = Self::new(api_key);

        if let Some(base) = non_blank(lookup("ODDS_API_BASE")) {
            cfg.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(region) = non_blank(lookup("ODDS_REGION")) {
            cfg.default_region = region.parse()?;
        }
        cfg.scan_regions = match non_blank(lookup("ODDS_SCAN_REGIONS")) {
            Some(raw) => parse_region_list(&raw)?,
            None => Vec::new(),
        };
        if cfg.scan_regions.is_empty() {
            cfg.scan_regions = vec![cfg.default_region];
        }
        let throttle_ms = lookup("ODDS_THROTTLE_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_THROTTLE_MS)
            .clamp(50, 5_000);
        cfg.throttle = Duration::from_millis(throttle_ms);
        if let Some(dir) = non_blank(lookup("ODDS_OUT_DIR")) {
            cfg.out_dir = PathBuf::from(dir);
        }
        if let Some(filter) = non_blank(lookup("RUST_LOG")).or_else(|| non_blank(lookup("LOG_LEVEL")))
        {
            cfg.log_filter = filter;
        }

        Ok(cfg)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_region_list(raw: &str) -> Result<Vec<Region>> {
    let mut out: Vec<Region> = Vec::new();
    for part in raw.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        let region: Region = part.parse()?;
        if !out.contains(&region) {
            out.push(region);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = OddsConfig::from_lookup(lookup_from(&[("ODDS_REGION", "uk")])).unwrap_err();
        assert!(matches!(err, OddsError::Config(_)));
    }

    #[test]
    fn blank_key_is_config_error() {
        let err = OddsConfig::from_lookup(lookup_from(&[("ODDS_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, OddsError::Config(_)));
    }

    #[test]
    fn scan_regions_default_to_default_region() {
        let cfg = OddsConfig::from_lookup(lookup_from(&[
            ("ODDS_API_KEY", "k"),
            ("ODDS_REGION", "US"),
        ]))
        .unwrap();
        assert_eq!(cfg.default_region, Region::Us);
        assert_eq!(cfg.scan_regions, vec![Region::Us]);
    }

    #[test]
    fn scan_regions_dedup_and_skip_blanks() {
        let cfg = OddsConfig::from_lookup(lookup_from(&[
            ("ODDS_API_KEY", "k"),
            ("ODDS_SCAN_REGIONS", "eu, uk,,EU ,au"),
        ]))
        .unwrap();
        assert_eq!(cfg.scan_regions, vec![Region::Eu, Region::Uk, Region::Au]);
    }

    #[test]
    fn unknown_region_rejected() {
        let err = OddsConfig::from_lookup(lookup_from(&[
            ("ODDS_API_KEY", "k"),
            ("ODDS_REGION", "mars"),
        ]))
        .unwrap_err();
        assert!(matches!(err, OddsError::Config(_)));
    }

    #[test]
    fn throttle_is_clamped() {
        let cfg = OddsConfig::from_lookup(lookup_from(&[
            ("ODDS_API_KEY", "k"),
            ("ODDS_THROTTLE_MS", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.throttle, Duration::from_millis(50));
    }
}
