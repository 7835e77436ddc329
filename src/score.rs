//! fairness score: turns the state of one candidate into a comparable number

use chrono::NaiveDate;

use crate::config::{Frequency, Weights};
use crate::dates::weeks_between;

/// everything the score needs to know about one candidate for one slot
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub count_this_year: u32,
    pub last_service: Option<NaiveDate>,
    pub preference_level: u8,
    pub preferred_frequency: Frequency,
    /// a together-paired sibling is already assigned on the date
    pub together_sibling_on_date: bool,
    /// the position is still in the candidate's rotation bag
    pub position_in_bag: bool,
}

/// weighted sum over the score terms, higher is better
///
/// ties are broken outside, see the candidate ordering in the builder
pub fn score(weights: &Weights, date: NaiveDate, input: &ScoreInput) -> f64 {
    let fair = 1.0 / (f64::from(input.count_this_year) + 1.0);

    let (recency, frequency) = match input.last_service {
        // never served: no recency yet, but due immediately
        None => (0.0, 1.0),
        Some(last) => {
            let gap_weeks = weeks_between(last, date) as f64;
            let recency = ((gap_weeks - 1.0) / 12.0).clamp(0.0, 1.0);
            (recency, frequency_term(gap_weeks, input.preferred_frequency))
        }
    };

    weights.fair * fair
        + weights.recency * recency
        + weights.preference * f64::from(input.preference_level) / 10.0
        + weights.frequency * frequency
        + weights.sibling * f64::from(u8::from(input.together_sibling_on_date))
        + weights.rotation * f64::from(u8::from(input.position_in_bag))
}

/// 1 at the preferred gap, decaying linearly to 0 at twice the preferred gap
fn frequency_term(gap_weeks: f64, frequency: Frequency) -> f64 {
    let target = f64::from(frequency.target_gap_weeks());
    (1.0 - (gap_weeks - target).abs() / target).max(0.0)
}
