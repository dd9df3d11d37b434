//! Feature records and encoding
//!
//! Converts derived game statistics and matchup context into model-ready features.

pub mod encoding;
pub mod game;
pub mod market;
pub mod sequence;
pub mod situational;

pub use encoding::{RotaryEmbedding, TeamEmbedding};
pub use game::GameFeatures;
pub use sequence::{GameMatrix, TeamGameSequence};
pub use situational::{Precipitation, StaticFeatures, SurfaceType};
