//! Sample assembly and batching
//!
//! Point-in-time game history, per-game samples and the burn dataset over them.

pub mod dataset;
pub mod history;
pub mod sample;

pub use dataset::{GameBatch, GameBatcher, Matchup, NflDataset};
pub use history::GameHistory;
pub use sample::{NflGameSample, StaticVector, TrainingData};
