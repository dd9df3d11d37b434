//! Full home-win model: team embeddings, sequence encoder, static projection and
//! fusion head.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use super::encoder::{EncoderConfig, SequenceEncoder};
use super::feed_forward::FeedForwardKind;
use super::heads::{FusionHead, StaticProjection};
use crate::features::encoding::{RotaryEmbedding, TeamEmbedding, ROTARY_BASE};
use crate::features::{GameFeatures, StaticFeatures};
use crate::{GridironError, Result, NUM_TEAMS};

/// Configuration for the full prediction model
#[derive(Debug, Clone)]
pub struct NflModelConfig {
    /// Number of team embedding rows
    pub n_teams: usize,
    /// Per-game feature dimension
    pub n_game_features: usize,
    /// Static feature dimension
    pub n_static: usize,
    /// Model dimension
    pub d_model: usize,
    /// Number of attention heads
    pub n_head: usize,
    /// Number of encoder layers
    pub n_layers: usize,
    /// Feedforward hidden dimension
    pub dim_feedforward: usize,
    /// Games per team sequence
    pub seq_len: usize,
    /// Dropout rate
    pub dropout: f64,
    pub norm_first: bool,
    pub feed_forward: FeedForwardKind,
    /// Backend RNG seed applied before parameter initialization
    pub seed: Option<u64>,
}

impl Default for NflModelConfig {
    fn default() -> Self {
        NflModelConfig {
            n_teams: NUM_TEAMS,
            n_game_features: GameFeatures::DIM,
            n_static: StaticFeatures::DIM,
            d_model: 192,
            n_head: 8,
            n_layers: 4,
            dim_feedforward: 768,
            seq_len: 5,
            dropout: 0.1,
            norm_first: false,
            feed_forward: FeedForwardKind::Geglu,
            seed: None,
        }
    }
}

impl NflModelConfig {
    /// Create configuration from the application config
    pub fn from_config(config: &crate::Config) -> Self {
        NflModelConfig {
            d_model: config.model.d_model,
            n_head: config.model.n_head,
            n_layers: config.model.n_layers,
            dim_feedforward: config.model.dim_feedforward,
            seq_len: config.features.sequence_length,
            dropout: config.model.dropout,
            norm_first: config.model.norm_first,
            seed: config.model.seed,
            ..Self::default()
        }
    }

    /// Check every shape constraint the model relies on
    pub fn validate(&self) -> Result<()> {
        if self.n_head == 0 || self.d_model % self.n_head != 0 {
            return Err(GridironError::Config(format!(
                "d_model ({}) must be divisible by n_head ({})",
                self.d_model, self.n_head
            )));
        }
        if self.d_model == 0 || (self.d_model / self.n_head) % 2 != 0 {
            return Err(GridironError::Config(format!(
                "head dimension ({} / {}) must be a positive even number for rotary encoding",
                self.d_model, self.n_head
            )));
        }
        if self.seq_len == 0 {
            return Err(GridironError::Config("seq_len must be at least 1".to_string()));
        }
        if self.n_layers == 0 {
            return Err(GridironError::Config("n_layers must be at least 1".to_string()));
        }
        if self.n_teams == 0 || self.n_game_features == 0 || self.n_static == 0 {
            return Err(GridironError::Config(
                "n_teams, n_game_features and n_static must be positive".to_string(),
            ));
        }
        if self.dim_feedforward == 0 {
            return Err(GridironError::Config(
                "dim_feedforward must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(GridironError::Config(format!(
                "dropout ({}) must be in [0, 1)",
                self.dropout
            )));
        }
        Ok(())
    }

    fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            d_model: self.d_model,
            n_heads: self.n_head,
            n_layers: self.n_layers,
            d_ff: self.dim_feedforward,
            dropout: self.dropout,
            norm_first: self.norm_first,
            feed_forward: self.feed_forward,
        }
    }
}

/// Transformer model predicting the home team's win probability
#[derive(Module, Debug)]
pub struct NflPredictionModel<B: Backend> {
    team_embeddings: TeamEmbedding<B>,
    game_projection: Linear<B>,
    static_projection: StaticProjection<B>,
    rope: RotaryEmbedding<B>,
    /// Shared between home and away sequences
    encoder: SequenceEncoder<B>,
    head: FusionHead<B>,
    d_model: usize,
    seq_len: usize,
}

impl<B: Backend> NflPredictionModel<B> {
    /// Create a new model, rejecting inconsistent configurations
    pub fn new(device: &B::Device, config: NflModelConfig) -> Result<Self> {
        config.validate()?;

        if let Some(seed) = config.seed {
            B::seed(seed);
        }

        log::debug!(
            "Building model: d_model={}, n_head={}, n_layers={}, seq_len={}, ff={:?}",
            config.d_model,
            config.n_head,
            config.n_layers,
            config.seq_len,
            config.feed_forward
        );

        Ok(NflPredictionModel {
            team_embeddings: TeamEmbedding::new(device, config.n_teams, config.d_model),
            game_projection: LinearConfig::new(config.n_game_features, config.d_model)
                .init(device),
            static_projection: StaticProjection::new(
                device,
                config.n_static,
                config.d_model,
                config.dropout,
            ),
            rope: RotaryEmbedding::new(device, config.d_model, config.seq_len, ROTARY_BASE)?,
            encoder: SequenceEncoder::new(device, &config.encoder_config()),
            head: FusionHead::new(device, config.d_model, config.dropout),
            d_model: config.d_model,
            seq_len: config.seq_len,
        })
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `home_team_id` - Home team indices [batch]
    /// * `away_team_id` - Away team indices [batch]
    /// * `home_history` - Home game window [batch, seq_len, n_game_features]
    /// * `away_history` - Away game window [batch, seq_len, n_game_features]
    /// * `static_features` - Matchup context [batch, n_static]
    ///
    /// # Returns
    /// Home-win logit [batch, 1]
    pub fn forward(
        &self,
        home_team_id: Tensor<B, 1, Int>,
        away_team_id: Tensor<B, 1, Int>,
        home_history: Tensor<B, 3>,
        away_history: Tensor<B, 3>,
        static_features: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let (home, away) = self.encode_teams(home_team_id, away_team_id, home_history, away_history);
        let context = self.static_projection.forward(static_features);

        self.head.forward(home + context.clone(), away + context)
    }

    /// Forward pass returning probabilities [batch, 1]
    pub fn predict_proba(
        &self,
        home_team_id: Tensor<B, 1, Int>,
        away_team_id: Tensor<B, 1, Int>,
        home_history: Tensor<B, 3>,
        away_history: Tensor<B, 3>,
        static_features: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        sigmoid(self.forward(
            home_team_id,
            away_team_id,
            home_history,
            away_history,
            static_features,
        ))
    }

    /// Pooled team representations [batch, d_model] (for analysis/debugging)
    pub fn encode_teams(
        &self,
        home_team_id: Tensor<B, 1, Int>,
        away_team_id: Tensor<B, 1, Int>,
        home_history: Tensor<B, 3>,
        away_history: Tensor<B, 3>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let home = self.encode_team(home_team_id, home_history);
        let away = self.encode_team(away_team_id, away_history);
        (home, away)
    }

    /// Project, add team identity, encode with rotary attention, then mean-pool over time
    fn encode_team(&self, team_id: Tensor<B, 1, Int>, history: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, seq_len, _] = history.dims();

        let x = self.game_projection.forward(history);
        let team = self
            .team_embeddings
            .forward(team_id)
            .reshape([batch, 1, self.d_model])
            .expand([batch, seq_len, self.d_model]);

        let x = self.encoder.forward(x + team, &self.rope);

        x.mean_dim(1).reshape([batch, self.d_model])
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn d_model(&self) -> usize {
        self.d_model
    }
}

/// Convert a `[batch, 1]` logit tensor into per-sample probabilities
pub fn logits_to_probabilities<B: Backend>(logits: Tensor<B, 2>) -> Vec<f32> {
    sigmoid(logits).to_data().iter::<f32>().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn small_config() -> NflModelConfig {
        NflModelConfig {
            d_model: 32,
            n_head: 4,
            n_layers: 2,
            dim_feedforward: 64,
            dropout: 0.0,
            seed: Some(7),
            ..NflModelConfig::default()
        }
    }

    fn inputs(
        batch: usize,
        device: &<TestBackend as Backend>::Device,
    ) -> (
        Tensor<TestBackend, 1, Int>,
        Tensor<TestBackend, 1, Int>,
        Tensor<TestBackend, 3>,
        Tensor<TestBackend, 3>,
        Tensor<TestBackend, 2>,
    ) {
        let home_ids: Vec<i32> = (0..batch as i32).collect();
        let away_ids: Vec<i32> = (0..batch as i32).map(|i| 31 - i).collect();
        (
            Tensor::from_ints(home_ids.as_slice(), device),
            Tensor::from_ints(away_ids.as_slice(), device),
            Tensor::random(
                [batch, 5, GameFeatures::DIM],
                burn::tensor::Distribution::Normal(0.0, 1.0),
                device,
            ),
            Tensor::random(
                [batch, 5, GameFeatures::DIM],
                burn::tensor::Distribution::Normal(0.0, 1.0),
                device,
            ),
            Tensor::random(
                [batch, StaticFeatures::DIM],
                burn::tensor::Distribution::Normal(0.0, 1.0),
                device,
            ),
        )
    }

    #[test]
    fn test_non_divisible_heads_rejected_at_construction() {
        let device = Default::default();
        let config = NflModelConfig {
            d_model: 100,
            n_head: 8,
            ..NflModelConfig::default()
        };
        let result = NflPredictionModel::<TestBackend>::new(&device, config);
        assert!(matches!(result, Err(GridironError::Config(_))));
    }

    #[test]
    fn test_invalid_configs() {
        let odd = NflModelConfig {
            d_model: 9,
            n_head: 3,
            ..NflModelConfig::default()
        };
        assert!(odd.validate().is_err());

        // Even d_model but odd per-head width
        let odd_heads = NflModelConfig {
            d_model: 24,
            n_head: 8,
            ..NflModelConfig::default()
        };
        assert!(odd_heads.validate().is_err());

        let no_seq = NflModelConfig {
            seq_len: 0,
            ..NflModelConfig::default()
        };
        assert!(no_seq.validate().is_err());

        let bad_dropout = NflModelConfig {
            dropout: 1.0,
            ..NflModelConfig::default()
        };
        assert!(bad_dropout.validate().is_err());

        assert!(NflModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = NflPredictionModel::<TestBackend>::new(&device, small_config()).unwrap();

        let (home_id, away_id, home, away, static_features) = inputs(3, &device);
        let logits = model.forward(home_id, away_id, home, away, static_features);

        assert_eq!(logits.dims(), [3, 1]);
    }

    #[test]
    fn test_probabilities_in_range() {
        let device = Default::default();
        let model = NflPredictionModel::<TestBackend>::new(&device, small_config()).unwrap();

        let (home_id, away_id, home, away, static_features) = inputs(4, &device);
        let logits = model.forward(home_id, away_id, home, away, static_features);
        let probs = logits_to_probabilities(logits);

        assert_eq!(probs.len(), 4);
        for p in probs {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_forward_is_deterministic_without_dropout() {
        let device = Default::default();
        let model = NflPredictionModel::<TestBackend>::new(&device, small_config()).unwrap();

        let (home_id, away_id, home, away, static_features) = inputs(2, &device);
        let first = model.forward(
            home_id.clone(),
            away_id.clone(),
            home.clone(),
            away.clone(),
            static_features.clone(),
        );
        let second = model.forward(home_id, away_id, home, away, static_features);

        let first: Vec<f32> = first.to_data().iter::<f32>().collect();
        let second: Vec<f32> = second.to_data().iter::<f32>().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_teams_shape() {
        let device = Default::default();
        let model = NflPredictionModel::<TestBackend>::new(&device, small_config()).unwrap();

        let (home_id, away_id, home, away, _) = inputs(2, &device);
        let (home_repr, away_repr) = model.encode_teams(home_id, away_id, home, away);

        assert_eq!(home_repr.dims(), [2, 32]);
        assert_eq!(away_repr.dims(), [2, 32]);
        assert_eq!(model.seq_len(), 5);
    }
}
