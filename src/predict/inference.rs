//! Model inference for predictions

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{GameBatch, GameBatcher, NflGameSample};
use crate::model::nfl_net::{logits_to_probabilities, NflPredictionModel};
use crate::{GridironError, Result, TeamId};

/// Confidence level based on how much real history backs a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,   // Both windows are entirely real games
    Medium, // At least one window is half or more real games
    Low,    // Both windows are mostly padding
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// Model prediction for one game, alongside the market baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePrediction {
    pub game_id: String,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_win_prob: f32,
    pub vegas_home_win_prob: f32,
    /// `home_win_prob - vegas_home_win_prob`
    pub edge: f32,
    pub confidence: ConfidenceLevel,
}

impl GamePrediction {
    /// Get the predicted winner (team with >=50% win probability)
    pub fn predicted_winner(&self) -> TeamId {
        if self.home_win_prob >= 0.5 {
            self.home_team
        } else {
            self.away_team
        }
    }
}

/// Runs the model over samples
pub struct Predictor<B: Backend> {
    model: NflPredictionModel<B>,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: NflPredictionModel<B>, device: B::Device) -> Self {
        Predictor { model, device }
    }

    pub fn model(&self) -> &NflPredictionModel<B> {
        &self.model
    }

    /// Predict a single game
    pub fn predict(&self, sample: &NflGameSample) -> Result<GamePrediction> {
        let mut preds = self.predict_samples(std::slice::from_ref(sample))?;
        preds
            .pop()
            .ok_or_else(|| GridironError::Parse("model returned no prediction".to_string()))
    }

    /// Predict several games in one forward pass
    pub fn predict_samples(&self, samples: &[NflGameSample]) -> Result<Vec<GamePrediction>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = samples
            .iter()
            .find(|s| s.sequence_length() != self.model.seq_len())
        {
            return Err(GridironError::Config(format!(
                "sample {} has sequence length {}, model expects {}",
                bad.game_id,
                bad.sequence_length(),
                self.model.seq_len()
            )));
        }

        let batch = GameBatcher.try_batch::<B>(samples, &self.device)?;
        let probs = self.predict_batch(batch);

        log::debug!("Predicted {} games", probs.len());

        Ok(samples
            .iter()
            .zip(probs)
            .map(|(sample, p)| GamePrediction {
                game_id: sample.game_id.clone(),
                home_team: sample.home_team,
                away_team: sample.away_team,
                home_win_prob: p,
                vegas_home_win_prob: sample.get_vegas_baseline(),
                edge: sample.calculate_edge(p),
                confidence: self.compute_confidence(sample),
            })
            .collect())
    }

    /// Home-win probabilities for a prepared batch
    pub fn predict_batch(&self, batch: GameBatch<B>) -> Vec<f32> {
        let logits = self.model.forward(
            batch.home_team_id,
            batch.away_team_id,
            batch.home_history,
            batch.away_history,
            batch.static_features,
        );
        logits_to_probabilities(logits)
    }

    /// Compute confidence level based on real games in each window
    fn compute_confidence(&self, sample: &NflGameSample) -> ConfidenceLevel {
        let seq_len = sample.sequence_length();
        let threshold = seq_len.div_ceil(2);
        let home = sample.home_sequence().real_game_count();
        let away = sample.away_sequence().real_game_count();

        if home >= seq_len && away >= seq_len {
            ConfidenceLevel::High
        } else if home >= threshold || away >= threshold {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &GamePrediction) -> String {
    let winner = pred.predicted_winner();
    let win_prob = if pred.home_win_prob >= 0.5 {
        pred.home_win_prob
    } else {
        1.0 - pred.home_win_prob
    };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} @ {}  ({})
├─────────────────────────────────────────────────┤
│  Win probability:  {} {:.1}%
│  Vegas (home):     {:.1}%
│  Edge (home):      {:+.1} pts
│  Confidence:       {}
└─────────────────────────────────────────────────┘
"#,
        pred.away_team,
        pred.home_team,
        pred.game_id,
        winner,
        win_prob * 100.0,
        pred.vegas_home_win_prob * 100.0,
        pred.edge * 100.0,
        pred.confidence
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::tests::sample;
    use crate::model::NflModelConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn predictor(seq_len: usize) -> Predictor<TestBackend> {
        let device = Default::default();
        let config = NflModelConfig {
            d_model: 16,
            n_head: 2,
            n_layers: 1,
            dim_feedforward: 32,
            seq_len,
            dropout: 0.0,
            seed: Some(1),
            ..NflModelConfig::default()
        };
        let model = NflPredictionModel::new(&device, config).unwrap();
        Predictor::new(model, device)
    }

    #[test]
    fn test_predict_samples() {
        let predictor = predictor(5);
        let samples = vec![
            sample(TeamId(1), TeamId(2), 5, true),
            sample(TeamId(3), TeamId(4), 1, false),
        ];

        let preds = predictor.predict_samples(&samples).unwrap();
        assert_eq!(preds.len(), 2);
        for (pred, s) in preds.iter().zip(&samples) {
            assert_eq!(pred.game_id, s.game_id);
            assert!((0.0..=1.0).contains(&pred.home_win_prob));
            assert!((pred.edge - (pred.home_win_prob - 0.62)).abs() < 1e-6);
        }
        assert_eq!(preds[0].confidence, ConfidenceLevel::High);
        assert_eq!(preds[1].confidence, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_confidence_levels() {
        use crate::features::game::tests::sample_game;
        use crate::features::situational::tests::sparse_static;
        use crate::features::TeamGameSequence;

        let window = |team: TeamId, games: u8| {
            let history = (1..=games).map(|w| sample_game(team, w)).collect();
            TeamGameSequence::new(team, history, 5).unwrap()
        };
        let build = |home_games: u8, away_games: u8| {
            NflGameSample::new(
                "g",
                2023,
                8,
                chrono::NaiveDate::from_ymd_opt(2023, 10, 29).unwrap(),
                window(TeamId(1), home_games),
                window(TeamId(2), away_games),
                sparse_static(),
                true,
                0.5,
            )
            .unwrap()
        };

        let predictor = predictor(5);
        let level = |s: NflGameSample| predictor.compute_confidence(&s);
        assert_eq!(level(build(5, 5)), ConfidenceLevel::High);
        assert_eq!(level(build(5, 4)), ConfidenceLevel::Medium);
        assert_eq!(level(build(3, 0)), ConfidenceLevel::Medium);
        assert_eq!(level(build(2, 2)), ConfidenceLevel::Low);
    }

    #[test]
    fn test_sequence_length_mismatch() {
        let predictor = predictor(4);
        let s = sample(TeamId(1), TeamId(2), 5, true);
        assert!(matches!(
            predictor.predict(&s),
            Err(GridironError::Config(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(predictor(5).predict_samples(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_format_prediction() {
        let pred = GamePrediction {
            game_id: "2023_10_BUF_KC".to_string(),
            home_team: TeamId::from_abbr("KC").unwrap(),
            away_team: TeamId::from_abbr("BUF").unwrap(),
            home_win_prob: 0.7,
            vegas_home_win_prob: 0.62,
            edge: 0.08,
            confidence: ConfidenceLevel::High,
        };
        let text = format_prediction(&pred);
        assert!(text.contains("BUF @ KC"));
        assert!(text.contains("KC 70.0%"));
        assert!(text.contains("+8.0 pts"));
    }
}
