//! Matchup-level situational context
//!
//! Venue, rest, weather, market and record features for one upcoming game.
//! Optional values are imputed with neutral defaults at projection time.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::GridironError;

/// Regular-season length used to normalize week numbers
pub const SEASON_WEEKS: f32 = 18.0;

pub const DEFAULT_TRAVEL_MILES: f32 = 0.0;
pub const DEFAULT_TIMEZONE_CHANGE: f32 = 0.0;
pub const DEFAULT_TEMPERATURE_F: f32 = 70.0;
pub const DEFAULT_WIND_MPH: f32 = 0.0;
pub const DEFAULT_HUMIDITY_PCT: f32 = 50.0;
pub const DEFAULT_ALTITUDE_FEET: f32 = 0.0;
pub const DEFAULT_OPENING_SPREAD: f32 = 0.0;
pub const DEFAULT_SPREAD_MOVEMENT: f32 = 0.0;
pub const DEFAULT_PLAYOFF_PROBABILITY: f32 = 0.5;

/// Playing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceType {
    Grass,
    Turf,
}

impl SurfaceType {
    pub fn code(&self) -> f32 {
        match self {
            SurfaceType::Grass => 0.0,
            SurfaceType::Turf => 1.0,
        }
    }
}

impl FromStr for SurfaceType {
    type Err = GridironError;

    /// Accepts the surface names used in play-by-play data
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grass" | "dessograss" => Ok(SurfaceType::Grass),
            "turf" | "fieldturf" | "a_turf" | "astroturf" | "astroplay" | "sportturf"
            | "matrixturf" => Ok(SurfaceType::Turf),
            _ => Err(GridironError::UnknownCategory {
                field: "surface_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Precipitation at kickoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precipitation {
    None,
    Rain,
    Snow,
}

impl Precipitation {
    pub fn code(&self) -> f32 {
        match self {
            Precipitation::None => 0.0,
            Precipitation::Rain => 1.0,
            Precipitation::Snow => 2.0,
        }
    }
}

impl FromStr for Precipitation {
    type Err = GridironError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "clear" | "dry" => Ok(Precipitation::None),
            "rain" | "drizzle" | "showers" => Ok(Precipitation::Rain),
            "snow" | "sleet" => Ok(Precipitation::Snow),
            _ => Err(GridironError::UnknownCategory {
                field: "precipitation",
                value: s.to_string(),
            }),
        }
    }
}

/// Context for one matchup, independent of team history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticFeatures {
    pub home_field: bool,
    pub is_division_game: bool,
    pub is_conference_game: bool,
    pub is_primetime: bool,
    pub week_number: u8,

    pub rest_days_home: u32,
    pub rest_days_away: u32,
    pub travel_distance_miles: Option<f32>,
    /// Hours of timezone shift for the travelling team
    pub timezone_change: Option<i32>,

    pub temperature: Option<f32>,
    pub wind_speed: Option<f32>,
    pub humidity: Option<f32>,
    pub is_dome: bool,
    pub precipitation: Option<Precipitation>,

    pub surface_type: SurfaceType,
    pub stadium_neutral: bool,
    pub altitude_feet: Option<f32>,

    /// Closing spread from the home team's perspective
    pub spread_line: f32,
    pub total_line: f32,
    pub opening_spread: Option<f32>,
    pub spread_movement: Option<f32>,

    pub vegas_implied_win_pct_home: f32,
    pub vegas_implied_win_pct_away: f32,

    pub home_wins: u32,
    pub home_losses: u32,
    pub away_wins: u32,
    pub away_losses: u32,
    pub home_win_pct: f32,
    pub away_win_pct: f32,

    pub playoff_probability_home: Option<f32>,
    pub playoff_probability_away: Option<f32>,
}

impl StaticFeatures {
    /// Dimension of feature vector
    pub const DIM: usize = 31;

    /// Column names of `to_vector`, in order
    pub const FEATURE_NAMES: [&'static str; Self::DIM] = [
        "home_field",
        "is_division_game",
        "is_conference_game",
        "is_primetime",
        "week_number",
        "rest_days_home",
        "rest_days_away",
        "travel_distance_miles",
        "timezone_change",
        "temperature",
        "wind_speed",
        "humidity",
        "is_dome",
        "precipitation",
        "surface_type",
        "stadium_neutral",
        "altitude_feet",
        "spread_line",
        "total_line",
        "opening_spread",
        "spread_movement",
        "vegas_implied_win_pct_home",
        "vegas_implied_win_pct_away",
        "home_wins",
        "home_losses",
        "away_wins",
        "away_losses",
        "home_win_pct",
        "away_win_pct",
        "playoff_probability_home",
        "playoff_probability_away",
    ];

    /// Convert to a fixed-order feature vector, imputing absent values
    pub fn to_vector(&self) -> [f32; Self::DIM] {
        [
            flag(self.home_field),
            flag(self.is_division_game),
            flag(self.is_conference_game),
            flag(self.is_primetime),
            self.week_number as f32 / SEASON_WEEKS,
            self.rest_days_home as f32,
            self.rest_days_away as f32,
            self.travel_distance_miles.unwrap_or(DEFAULT_TRAVEL_MILES),
            self.timezone_change
                .map(|tz| tz as f32)
                .unwrap_or(DEFAULT_TIMEZONE_CHANGE),
            self.temperature.unwrap_or(DEFAULT_TEMPERATURE_F),
            self.wind_speed.unwrap_or(DEFAULT_WIND_MPH),
            self.humidity.unwrap_or(DEFAULT_HUMIDITY_PCT),
            flag(self.is_dome),
            self.precipitation.unwrap_or(Precipitation::None).code(),
            self.surface_type.code(),
            flag(self.stadium_neutral),
            self.altitude_feet.unwrap_or(DEFAULT_ALTITUDE_FEET),
            self.spread_line,
            self.total_line,
            self.opening_spread.unwrap_or(DEFAULT_OPENING_SPREAD),
            self.spread_movement.unwrap_or(DEFAULT_SPREAD_MOVEMENT),
            self.vegas_implied_win_pct_home,
            self.vegas_implied_win_pct_away,
            self.home_wins as f32,
            self.home_losses as f32,
            self.away_wins as f32,
            self.away_losses as f32,
            self.home_win_pct,
            self.away_win_pct,
            self.playoff_probability_home
                .unwrap_or(DEFAULT_PLAYOFF_PROBABILITY),
            self.playoff_probability_away
                .unwrap_or(DEFAULT_PLAYOFF_PROBABILITY),
        ]
    }

    /// Look up a single projected value by column name
    pub fn feature(&self, name: &str) -> Option<f32> {
        Self::FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.to_vector()[idx])
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}
