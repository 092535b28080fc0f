use serde::Serialize;
use serde_json::{Map, Value};

use crate::extract::ExtractedMarket;
use crate::normalize::{finite_field, normalize};
use crate::odds_api::CompetitionDescriptor;

/// Insertion-ordered field map shared by the CSV and JSON writers.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub market: ExtractedMarket,
    /// Same length as `market.decimal_odds`; `None` where no finite value exists.
    pub probabilities: Vec<Option<f64>>,
}

impl NormalizedRow {
    pub fn new(market: ExtractedMarket) -> Self {
        let probabilities = normalize(&market.decimal_odds)
            .into_iter()
            .map(finite_field)
            .collect();
        Self {
            market,
            probabilities,
        }
    }

    /// Participant names joined by a space, used for include filtering.
    pub fn matchup(&self) -> String {
        self.market.outcome_names.join(" ")
    }

    fn outcome(&self, idx: usize) -> (String, Option<f64>, Option<f64>) {
        (
            self.market
                .outcome_names
                .get(idx)
                .cloned()
                .unwrap_or_default(),
            self.market.decimal_odds.get(idx).copied().and_then(finite_field),
            self.probabilities.get(idx).copied().flatten(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub sport_key: String,
    pub sport_title: String,
    pub event_id: String,
    pub commence_time: String,
    pub bookmaker: String,
    pub player_1: String,
    pub player_2: String,
    pub odds_1: Option<f64>,
    pub odds_2: Option<f64>,
    pub prob_1: Option<f64>,
    pub prob_2: Option<f64>,
}

impl SnapshotRow {
    pub fn new(competition: &CompetitionDescriptor, row: &NormalizedRow) -> Self {
        let (player_1, odds_1, prob_1) = row.outcome(0);
        let (player_2, odds_2, prob_2) = row.outcome(1);
        Self {
            sport_key: competition.key.clone(),
            sport_title: competition.title.clone(),
            event_id: row.market.event_id.clone(),
            commence_time: row.market.start.clone(),
            bookmaker: row.market.bookmaker.clone(),
            player_1,
            player_2,
            odds_1,
            odds_2,
            prob_1,
            prob_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeOdds {
    pub name: String,
    pub price: Option<f64>,
    pub implied_prob: Option<f64>,
}

/// Nested per-event object written by the single-competition fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOdds {
    pub id: String,
    pub commence_time: String,
    pub bookmaker: String,
    pub outcomes: Vec<OutcomeOdds>,
}

impl From<&NormalizedRow> for EventOdds {
    fn from(row: &NormalizedRow) -> Self {
        let outcomes = (0..row.market.outcome_names.len())
            .map(|idx| {
                let (name, price, implied_prob) = row.outcome(idx);
                OutcomeOdds {
                    name,
                    price,
                    implied_prob,
                }
            })
            .collect();
        Self {
            id: row.market.event_id.clone(),
            commence_time: row.market.start.clone(),
            bookmaker: row.market.bookmaker.clone(),
            outcomes,
        }
    }
}

/// Serializes a row struct into an ordered record; field order follows the struct.
pub fn to_record<T: Serialize>(row: &T) -> serde_json::Result<Record> {
    match serde_json::to_value(row)? {
        Value::Object(map) => Ok(map),
        _ => Err(<serde_json::Error as serde::ser::Error>::custom(
            "row must serialize to an object",
        )),
    }
}

pub fn to_records<T: Serialize>(rows: &[T]) -> serde_json::Result<Vec<Record>> {
    rows.iter().map(to_record).collect()
}
