use reqwest::blocking::Response;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{OddsConfig, Region};
use crate::error::{OddsError, Result};
use crate::http_client::http_client;

const BODY_SNIPPET_CHARS: usize = 220;

#[derive(Debug, Clone, Deserialize)]
pub struct SportEntry {
    pub key: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitionDescriptor {
    pub key: String,
    pub title: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMarketEvent {
    pub id: String,
    #[serde(default)]
    pub commence_time: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bookmaker {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub name: String,
    pub price: Option<f64>,
}

/// Request quota reported by the upstream in response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quota {
    pub remaining: Option<u32>,
    pub used: Option<u32>,
}

pub trait OddsApi {
    fn list_sports(&mut self) -> Result<Vec<SportEntry>>;
    fn fetch_odds(&mut self, competition_key: &str, region: Region) -> Result<Vec<RawMarketEvent>>;
}

pub struct HttpOddsApi {
    api_key: String,
    base_url: String,
    quota: Quota,
    requests_made: u32,
}

impl HttpOddsApi {
    pub fn new(cfg: &OddsConfig) -> Self {
        Self {
            api_key: cfg.api_key.clone(),
            base_url: cfg.api_base.clone(),
            quota: Quota::default(),
            requests_made: 0,
        }
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }

    pub fn requests_made(&self) -> u32 {
        self.requests_made
    }

    fn get_text(&mut self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let resp = http_client()?
            .get(&url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()?;
        self.requests_made += 1;
        self.record_quota(&resp);

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(OddsError::Upstream {
                status,
                endpoint: path.to_string(),
                body: body_snippet(&body),
            });
        }
        Ok(body)
    }

    fn record_quota(&mut self, resp: &Response) {
        let header = |name: &str| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u32>().ok())
        };
        if let Some(remaining) = header("x-requests-remaining") {
            self.quota.remaining = Some(remaining);
        }
        if let Some(used) = header("x-requests-used") {
            self.quota.used = Some(used);
        }
        debug!(
            remaining = ?self.quota.remaining,
            used = ?self.quota.used,
            "upstream quota"
        );
    }
}

impl OddsApi for HttpOddsApi {
    fn list_sports(&mut self) -> Result<Vec<SportEntry>> {
        let body = self.get_text("/sports/", &[])?;
        parse_sports_json(&body)
    }

    fn fetch_odds(&mut self, competition_key: &str, region: Region) -> Result<Vec<RawMarketEvent>> {
        let path = format!("/sports/{competition_key}/odds");
        let body = self.get_text(
            &path,
            &[
                ("regions", region.as_str()),
                ("markets", "h2h"),
                ("oddsFormat", "decimal"),
            ],
        )?;
        parse_odds_json(&body)
    }
}

pub fn parse_sports_json(raw: &str) -> Result<Vec<SportEntry>> {
    let parsed: Option<Vec<SportEntry>> = serde_json::from_str(raw).map_err(OddsError::Decode)?;
    Ok(parsed.unwrap_or_default())
}

pub fn parse_odds_json(raw: &str) -> Result<Vec<RawMarketEvent>> {
    let parsed: Option<Vec<RawMarketEvent>> =
        serde_json::from_str(raw).map_err(OddsError::Decode)?;
    Ok(parsed.unwrap_or_default())
}

pub fn is_tennis(sport: &SportEntry) -> bool {
    [&sport.group, &sport.details, &sport.title]
        .iter()
        .any(|field| field.to_ascii_lowercase().contains("tennis"))
}

/// Active tennis competitions from the catalog. Any failure here is fatal for the run.
pub fn list_active_tennis_competitions(api: &mut dyn OddsApi) -> Result<Vec<CompetitionDescriptor>> {
    let sports = api.list_sports()?;
    Ok(sports
        .into_iter()
        .filter(|s| s.active && is_tennis(s))
        .map(|s| CompetitionDescriptor {
            key: s.key,
            title: s.title,
            active: s.active,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Strict,
    Lenient,
}

#[derive(Debug)]
pub enum MarketFetch {
    Events(Vec<RawMarketEvent>),
    Failed(String),
}

impl MarketFetch {
    pub fn is_failed(&self) -> bool {
        matches!(self, MarketFetch::Failed(_))
    }

    pub fn into_events(self) -> Vec<RawMarketEvent> {
        match self {
            MarketFetch::Events(events) => events,
            MarketFetch::Failed(_) => Vec::new(),
        }
    }
}

pub fn fetch_markets(
    api: &mut dyn OddsApi,
    competition_key: &str,
    region: Region,
    policy: FailurePolicy,
) -> Result<MarketFetch> {
    match api.fetch_odds(competition_key, region) {
        Ok(events) => Ok(MarketFetch::Events(events)),
        Err(err) if policy == FailurePolicy::Lenient && err.is_upstream() => {
            warn!(competition = competition_key, %region, error = %err, "odds fetch failed");
            Ok(MarketFetch::Failed(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

fn body_snippet(body: &str) -> String {
    body.trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(BODY_SNIPPET_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sport(key: &str, group: &str, title: &str, details: &str, active: bool) -> SportEntry {
        SportEntry {
            key: key.to_string(),
            group: group.to_string(),
            title: title.to_string(),
            details: details.to_string(),
            active,
        }
    }

    struct Catalog(Vec<SportEntry>);

    impl OddsApi for Catalog {
        fn list_sports(&mut self) -> Result<Vec<SportEntry>> {
            Ok(self.0.clone())
        }

        fn fetch_odds(&mut self, _key: &str, _region: Region) -> Result<Vec<RawMarketEvent>> {
            Err(OddsError::Upstream {
                status: reqwest::StatusCode::TOO_MANY_REQUESTS,
                endpoint: "/sports/x/odds".to_string(),
                body: "quota".to_string(),
            })
        }
    }

    #[test]
    fn tennis_match_is_case_insensitive_on_any_field() {
        assert!(is_tennis(&sport("a", "Tennis", "ATP Paris", "", true)));
        assert!(is_tennis(&sport("b", "Other", "WTA Open", "Women's TENNIS", true)));
        assert!(is_tennis(&sport("c", "", "table tennis cup", "", true)));
        assert!(!is_tennis(&sport("d", "Soccer", "EPL", "English league", true)));
    }

    #[test]
    fn inactive_competitions_are_filtered() {
        let mut api = Catalog(vec![
            sport("tennis_atp_paris", "Tennis", "ATP Paris Masters", "", true),
            sport("tennis_wta_finals", "Tennis", "WTA Finals", "", false),
            sport("soccer_epl", "Soccer", "EPL", "", true),
        ]);
        let comps = list_active_tennis_competitions(&mut api).unwrap();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].key, "tennis_atp_paris");
        assert_eq!(comps[0].title, "ATP Paris Masters");
    }

    #[test]
    fn lenient_fetch_reports_failure_as_data() {
        let mut api = Catalog(Vec::new());
        let fetch = fetch_markets(&mut api, "tennis_x", Region::Eu, FailurePolicy::Lenient).unwrap();
        assert!(fetch.is_failed());
        assert!(fetch.into_events().is_empty());
    }

    #[test]
    fn strict_fetch_propagates_failure() {
        let mut api = Catalog(Vec::new());
        let err = fetch_markets(&mut api, "tennis_x", Region::Eu, FailurePolicy::Strict).unwrap_err();
        assert!(err.is_upstream());
    }

    #[test]
    fn body_snippet_flattens_and_truncates() {
        let body = format!("line1\nline2\r{}", "x".repeat(500));
        let snippet = body_snippet(&body);
        assert!(!snippet.contains('\n'));
        assert_eq!(snippet.chars().count(), BODY_SNIPPET_CHARS);
    }
}
