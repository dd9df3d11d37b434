//! Prediction and evaluation

pub mod inference;
pub mod metrics;

pub use inference::{format_prediction, ConfidenceLevel, GamePrediction, Predictor};
pub use metrics::{EvaluationMetrics, ProbabilityScore};
