use serde::Serialize;

use crate::odds_api::{Bookmaker, Market, RawMarketEvent};

const HEAD_TO_HEAD: &str = "h2h";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedMarket {
    pub event_id: String,
    pub start: String,
    pub outcome_names: Vec<String>,
    pub decimal_odds: Vec<f64>,
    pub bookmaker: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NoHeadToHead,
    TooFewOutcomes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Kept(ExtractedMarket),
    Dropped(DropReason),
}

pub trait MarketSelector {
    fn select<'a>(&self, bookmakers: &'a [Bookmaker]) -> Option<(&'a Bookmaker, &'a Market)>;
}

/// No price or recency comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstHeadToHead;

impl MarketSelector for FirstHeadToHead {
    fn select<'a>(&self, bookmakers: &'a [Bookmaker]) -> Option<(&'a Bookmaker, &'a Market)> {
        bookmakers.iter().find_map(|bookmaker| {
            bookmaker
                .markets
                .iter()
                .find(|m| m.key.eq_ignore_ascii_case(HEAD_TO_HEAD))
                .map(|market| (bookmaker, market))
        })
    }
}

pub fn extract(event: &RawMarketEvent) -> Option<ExtractedMarket> {
    match extract_with(&FirstHeadToHead, event) {
        Extraction::Kept(market) => Some(market),
        Extraction::Dropped(_) => None,
    }
}

pub fn extract_with(selector: &dyn MarketSelector, event: &RawMarketEvent) -> Extraction {
    let Some((bookmaker, market)) = selector.select(&event.bookmakers) else {
        return Extraction::Dropped(DropReason::NoHeadToHead);
    };

    let priced = market.outcomes.iter().filter(|o| o.price.is_some()).count();
    if priced < 2 {
        return Extraction::Dropped(DropReason::TooFewOutcomes);
    }

    let label = if bookmaker.title.trim().is_empty() {
        bookmaker.key.clone()
    } else {
        bookmaker.title.clone()
    };

    Extraction::Kept(ExtractedMarket {
        event_id: event.id.clone(),
        start: event.commence_time.clone(),
        outcome_names: market.outcomes.iter().map(|o| o.name.clone()).collect(),
        // Unpriced outcomes hold their slot as NaN.
        decimal_odds: market
            .outcomes
            .iter()
            .map(|o| o.price.unwrap_or(f64::NAN))
            .collect(),
        bookmaker: label,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropTally {
    pub no_head_to_head: usize,
    pub too_few_outcomes: usize,
}

impl DropTally {
    pub fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::NoHeadToHead => self.no_head_to_head += 1,
            DropReason::TooFewOutcomes => self.too_few_outcomes += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.no_head_to_head + self.too_few_outcomes
    }

    pub fn merge(&mut self, other: DropTally) {
        self.no_head_to_head += other.no_head_to_head;
        self.too_few_outcomes += other.too_few_outcomes;
    }
}
