/// De-vigged implied probabilities for a set of decimal odds.
///
/// `p_i = (1/o_i) / sum_j(1/o_j)`. When any price is zero, negative or
/// non-finite the margin cannot be removed, so every output is NaN; callers
/// turn those into absent fields with [`finite_field`].
pub fn normalize(decimal_odds: &[f64]) -> Vec<f64> {
    if decimal_odds.iter().any(|o| !is_usable_price(*o)) {
        return vec![f64::NAN; decimal_odds.len()];
    }
    let implied: Vec<f64> = decimal_odds.iter().map(|o| 1.0 / o).collect();
    let sum: f64 = implied.iter().sum();
    implied.iter().map(|p| p / sum).collect()
}

/// Sum of raw implied probabilities; above 1.0 by the bookmaker margin.
pub fn overround(decimal_odds: &[f64]) -> Option<f64> {
    if decimal_odds.is_empty() || decimal_odds.iter().any(|o| !is_usable_price(*o)) {
        return None;
    }
    Some(decimal_odds.iter().map(|o| 1.0 / o).sum())
}

pub fn finite_field(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn is_usable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
