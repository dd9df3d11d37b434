//! Betting-market conversions
//!
//! Turns American moneylines into win probabilities for the static features and
//! the Vegas baseline.

use crate::{GridironError, Result};

/// Implied win probability of an American moneyline (vig included)
pub fn implied_probability(moneyline: i32) -> Result<f32> {
    if moneyline.unsigned_abs() < 100 {
        return Err(GridironError::InvalidOdds(moneyline));
    }
    let m = moneyline.unsigned_abs() as f32;
    if moneyline < 0 {
        Ok(m / (m + 100.0))
    } else {
        Ok(100.0 / (m + 100.0))
    }
}

/// Normalize two raw implied probabilities so they sum to one
pub fn remove_vig(home: f32, away: f32) -> (f32, f32) {
    let overround = home + away;
    if overround <= 0.0 {
        return (0.5, 0.5);
    }
    (home / overround, away / overround)
}

/// Fair (vig-free) home and away probabilities from a pair of moneylines
pub fn fair_probabilities(home_moneyline: i32, away_moneyline: i32) -> Result<(f32, f32)> {
    let home = implied_probability(home_moneyline)?;
    let away = implied_probability(away_moneyline)?;
    Ok(remove_vig(home, away))
}

/// Line movement from open to close, when the opener is known
pub fn spread_movement(opening: Option<f32>, current: f32) -> Option<f32> {
    opening.map(|open| current - open)
}
