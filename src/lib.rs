//! NFL home-win prediction using deep learning
//!
//! Fixed-shape feature records for team game history and matchup context, their
//! tensor encoding, and a transformer sequence model consuming them.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of NFL franchises
pub const NUM_TEAMS: usize = 32;

/// Current franchise abbreviations, indexed by `TeamId`
pub const TEAM_ABBRS: [&str; NUM_TEAMS] = [
    "ARI", "ATL", "BAL", "BUF", "CAR", "CHI", "CIN", "CLE", "DAL", "DEN", "DET", "GB", "HOU",
    "IND", "JAX", "KC", "LA", "LAC", "LV", "MIA", "MIN", "NE", "NO", "NYG", "NYJ", "PHI", "PIT",
    "SEA", "SF", "TB", "TEN", "WAS",
];

/// Dense team index (0..32) used for embedding lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    /// Resolve a team from its abbreviation, accepting relocated franchise codes
    pub fn from_abbr(abbr: &str) -> Result<Self> {
        let upper = abbr.trim().to_uppercase();
        let canonical = match upper.as_str() {
            "OAK" => "LV",
            "SD" => "LAC",
            "STL" | "LAR" => "LA",
            "WSH" => "WAS",
            "JAC" => "JAX",
            other => other,
        };

        TEAM_ABBRS
            .iter()
            .position(|a| *a == canonical)
            .map(|idx| TeamId(idx as u8))
            .ok_or_else(|| GridironError::UnknownTeam(abbr.to_string()))
    }

    pub fn abbr(&self) -> &'static str {
        TEAM_ABBRS
            .get(self.0 as usize)
            .copied()
            .unwrap_or("UNK")
    }

    /// Embedding row for this team
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbr())
    }
}

impl FromStr for TeamId {
    type Err = GridironError;

    fn from_str(s: &str) -> Result<Self> {
        TeamId::from_abbr(s)
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GridironError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Unknown {field} value: {value}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("Invalid moneyline: {0}")]
    InvalidOdds(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GridironError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub features: FeatureConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub d_model: usize,
    pub n_head: usize,
    pub n_layers: usize,
    pub dim_feedforward: usize,
    pub dropout: f64,
    pub norm_first: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Games per team history window
    pub sequence_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub batch_size: usize,
    pub train_ratio: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig {
                d_model: 192,
                n_head: 8,
                n_layers: 4,
                dim_feedforward: 768,
                dropout: 0.1,
                norm_first: false,
                seed: Some(42),
            },
            features: FeatureConfig { sequence_length: 5 },
            data: DataConfig {
                batch_size: 64,
                train_ratio: 0.8,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridironError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GridironError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridironError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
