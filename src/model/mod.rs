//! Neural network architecture
//!
//! Transformer over each team's game window, with a gated-GELU feed-forward
//! sublayer, fused with matchup context into a home-win logit.

pub mod encoder;
pub mod feed_forward;
pub mod heads;
pub mod nfl_net;

pub use feed_forward::{FeedForward, FeedForwardBlock, FeedForwardKind, GeGlu};
pub use nfl_net::{NflModelConfig, NflPredictionModel};
