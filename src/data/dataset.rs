//! Burn Dataset implementation for NFL game samples
//!
//! Builds point-in-time samples from game history and stacks them into tensors.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Bool, Int, Tensor, TensorData};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::history::GameHistory;
use super::sample::NflGameSample;
use crate::features::{GameFeatures, StaticFeatures};
use crate::{GridironError, Result, TeamId};

/// A scheduled or settled game joined with its betting lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matchup {
    pub game_id: String,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub season: u16,
    pub week: u8,
    pub gameday: NaiveDate,
    pub static_features: StaticFeatures,
    /// None for games not yet played
    pub home_won: Option<bool>,
    pub vegas_home_win_prob: f32,
}

/// NFL game dataset, chronologically ordered
#[derive(Debug, Clone)]
pub struct NflDataset {
    samples: Vec<NflGameSample>,
    sequence_length: usize,
}

impl NflDataset {
    /// Create from pre-built samples; all must share one sequence length
    pub fn new(mut samples: Vec<NflGameSample>, sequence_length: usize) -> Result<Self> {
        if let Some(bad) = samples
            .iter()
            .find(|s| s.sequence_length() != sequence_length)
        {
            return Err(GridironError::Config(format!(
                "sample {} has sequence length {}, dataset expects {}",
                bad.game_id,
                bad.sequence_length(),
                sequence_length
            )));
        }

        samples.sort_by_key(|s| (s.season, s.week, s.gameday));
        Ok(NflDataset {
            samples,
            sequence_length,
        })
    }

    /// Build one sample per matchup from games strictly before each matchup's week
    pub fn from_history(
        history: &GameHistory,
        matchups: &[Matchup],
        sequence_length: usize,
    ) -> Result<Self> {
        let mut samples = Vec::with_capacity(matchups.len());
        let mut padded_rows = 0usize;

        for m in matchups {
            let home = history.window(m.home_team, m.season, m.week, sequence_length)?;
            let away = history.window(m.away_team, m.season, m.week, sequence_length)?;
            padded_rows += home.padding_count() + away.padding_count();

            samples.push(NflGameSample::new(
                m.game_id.clone(),
                m.season,
                m.week,
                m.gameday,
                home,
                away,
                m.static_features.clone(),
                m.home_won.unwrap_or(false),
                m.vegas_home_win_prob,
            )?
            .with_played(m.home_won.is_some()));
        }

        log::info!(
            "Created dataset with {} samples (sequence_length={}, padded rows={})",
            samples.len(),
            sequence_length,
            padded_rows
        );
        Self::new(samples, sequence_length)
    }

    pub fn samples(&self) -> &[NflGameSample] {
        &self.samples
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Split into train/validation, earlier games first
    pub fn split(self, train_ratio: f32) -> (Self, Self) {
        let split_idx = (self.samples.len() as f32 * train_ratio.clamp(0.0, 1.0)) as usize;
        let mut train_samples = self.samples;
        let val_samples = train_samples.split_off(split_idx);

        (
            NflDataset {
                samples: train_samples,
                sequence_length: self.sequence_length,
            },
            NflDataset {
                samples: val_samples,
                sequence_length: self.sequence_length,
            },
        )
    }
}

impl Dataset<NflGameSample> for NflDataset {
    fn get(&self, index: usize) -> Option<NflGameSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Batch of game samples as tensors
#[derive(Debug, Clone)]
pub struct GameBatch<B: Backend> {
    /// Home team IDs for embeddings: [batch]
    pub home_team_id: Tensor<B, 1, Int>,
    /// Away team IDs for embeddings: [batch]
    pub away_team_id: Tensor<B, 1, Int>,
    /// Home team game windows: [batch, seq_len, 27]
    pub home_history: Tensor<B, 3>,
    /// Away team game windows: [batch, seq_len, 27]
    pub away_history: Tensor<B, 3>,
    /// Home window validity (false = padding game): [batch, seq_len]
    pub home_mask: Tensor<B, 2, Bool>,
    /// Away window validity: [batch, seq_len]
    pub away_mask: Tensor<B, 2, Bool>,
    /// Static matchup features: [batch, 31]
    pub static_features: Tensor<B, 2>,
    /// Target win labels: [batch]
    pub home_win: Tensor<B, 1>,
    /// Market-implied home win probability: [batch]
    pub vegas_home_win_prob: Tensor<B, 1>,
}

/// Stacks `NflGameSample::get_training_data` outputs into batch tensors
#[derive(Debug, Clone, Copy, Default)]
pub struct GameBatcher;

impl GameBatcher {
    pub fn new() -> Self {
        GameBatcher
    }

    /// Batch samples, rejecting mixed sequence lengths
    pub fn try_batch<B: Backend>(
        &self,
        items: &[NflGameSample],
        device: &B::Device,
    ) -> Result<GameBatch<B>> {
        if let Some(first) = items.first() {
            let seq_len = first.sequence_length();
            if items.iter().any(|s| s.sequence_length() != seq_len) {
                return Err(GridironError::Config(
                    "cannot batch samples with different sequence lengths".to_string(),
                ));
            }
        }
        Ok(stack(items, device))
    }
}

impl<B: Backend> Batcher<B, NflGameSample, GameBatch<B>> for GameBatcher {
    /// Samples from one `NflDataset` always share a sequence length
    fn batch(&self, items: Vec<NflGameSample>, device: &B::Device) -> GameBatch<B> {
        stack(&items, device)
    }
}

fn stack<B: Backend>(items: &[NflGameSample], device: &B::Device) -> GameBatch<B> {
    let batch_size = items.len();
    let seq_len = items.first().map(|s| s.sequence_length()).unwrap_or(0);
    let feature_dim = GameFeatures::DIM;

    let mut home_data = Vec::with_capacity(batch_size * seq_len * feature_dim);
    let mut away_data = Vec::with_capacity(batch_size * seq_len * feature_dim);
    let mut home_mask_data = Vec::with_capacity(batch_size * seq_len);
    let mut away_mask_data = Vec::with_capacity(batch_size * seq_len);
    let mut home_team_ids = Vec::with_capacity(batch_size);
    let mut away_team_ids = Vec::with_capacity(batch_size);
    let mut static_data = Vec::with_capacity(batch_size * StaticFeatures::DIM);
    let mut home_win_data = Vec::with_capacity(batch_size);
    let mut vegas_data = Vec::with_capacity(batch_size);

    for sample in items {
        let (home, away, static_vec, label) = sample.get_training_data();
        home_data.extend(home.into_iter().flatten());
        away_data.extend(away.into_iter().flatten());
        home_mask_data.extend(sample.home_sequence().mask());
        away_mask_data.extend(sample.away_sequence().mask());
        home_team_ids.push(sample.home_team.index() as i32);
        away_team_ids.push(sample.away_team.index() as i32);
        static_data.extend(static_vec);
        home_win_data.push(label);
        vegas_data.push(sample.vegas_home_win_prob);
    }

    let home_history = Tensor::<B, 1>::from_floats(home_data.as_slice(), device)
        .reshape([batch_size, seq_len, feature_dim]);
    let away_history = Tensor::<B, 1>::from_floats(away_data.as_slice(), device)
        .reshape([batch_size, seq_len, feature_dim]);

    let home_mask =
        Tensor::<B, 1, Bool>::from_bool(TensorData::from(home_mask_data.as_slice()), device)
            .reshape([batch_size, seq_len]);
    let away_mask =
        Tensor::<B, 1, Bool>::from_bool(TensorData::from(away_mask_data.as_slice()), device)
            .reshape([batch_size, seq_len]);

    let static_features = Tensor::<B, 1>::from_floats(static_data.as_slice(), device)
        .reshape([batch_size, StaticFeatures::DIM]);

    GameBatch {
        home_team_id: Tensor::<B, 1, Int>::from_ints(home_team_ids.as_slice(), device),
        away_team_id: Tensor::<B, 1, Int>::from_ints(away_team_ids.as_slice(), device),
        home_history,
        away_history,
        home_mask,
        away_mask,
        static_features,
        home_win: Tensor::<B, 1>::from_floats(home_win_data.as_slice(), device),
        vegas_home_win_prob: Tensor::<B, 1>::from_floats(vegas_data.as_slice(), device),
    }
}
