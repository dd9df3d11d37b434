//! Evaluation metrics for the model against the market baseline

use std::fmt;

use crate::data::NflGameSample;
use crate::predict::GamePrediction;

/// Probabilities are clamped into [EPS, 1 - EPS] before taking logs
const LOG_LOSS_EPS: f64 = 1e-7;

/// Running accuracy, Brier score and log loss for one probability source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityScore {
    pub correct: usize,
    pub total: usize,
    pub brier_sum: f64,
    pub log_loss_sum: f64,
}

impl ProbabilityScore {
    /// Add one home-win probability against the observed outcome
    pub fn update(&mut self, prob: f32, home_won: bool) {
        let p = prob as f64;
        let y = if home_won { 1.0 } else { 0.0 };

        if (p >= 0.5) == home_won {
            self.correct += 1;
        }
        self.total += 1;
        self.brier_sum += (p - y).powi(2);

        let clamped = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
        self.log_loss_sum -= y * clamped.ln() + (1.0 - y) * (1.0 - clamped).ln();
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn brier(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.brier_sum / self.total as f64
        }
    }

    pub fn log_loss(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.log_loss_sum / self.total as f64
        }
    }

    pub fn merge(&mut self, other: &ProbabilityScore) {
        self.correct += other.correct;
        self.total += other.total;
        self.brier_sum += other.brier_sum;
        self.log_loss_sum += other.log_loss_sum;
    }
}

impl fmt::Display for ProbabilityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acc: {:.2}% | Brier: {:.4} | LogLoss: {:.4}",
            self.accuracy() * 100.0,
            self.brier(),
            self.log_loss()
        )
    }
}

/// Model vs Vegas scores accumulated over evaluated games
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationMetrics {
    pub model: ProbabilityScore,
    pub vegas: ProbabilityScore,
    /// Sum of |model - vegas|
    pub abs_edge_sum: f64,
}

impl EvaluationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one game
    pub fn update(&mut self, model_prob: f32, vegas_prob: f32, home_won: bool) {
        self.model.update(model_prob, home_won);
        self.vegas.update(vegas_prob, home_won);
        self.abs_edge_sum += (model_prob - vegas_prob).abs() as f64;
    }

    /// Record a prediction against the sample it was made for; unplayed games are skipped
    pub fn update_prediction(&mut self, prediction: &GamePrediction, sample: &NflGameSample) {
        if !sample.is_played() {
            return;
        }
        self.update(
            prediction.home_win_prob,
            prediction.vegas_home_win_prob,
            sample.actual_home_won,
        );
    }

    /// Evaluate predictions paired with their samples by position
    pub fn from_predictions(predictions: &[GamePrediction], samples: &[NflGameSample]) -> Self {
        let mut metrics = Self::new();
        for (pred, sample) in predictions.iter().zip(samples) {
            metrics.update_prediction(pred, sample);
        }
        metrics
    }

    pub fn games(&self) -> usize {
        self.model.total
    }

    pub fn mean_abs_edge(&self) -> f64 {
        if self.model.total == 0 {
            0.0
        } else {
            self.abs_edge_sum / self.model.total as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn merge(&mut self, other: &EvaluationMetrics) {
        self.model.merge(&other.model);
        self.vegas.merge(&other.vegas);
        self.abs_edge_sum += other.abs_edge_sum;
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Games: {} | Model {} | Vegas {} | Mean |edge|: {:.2} pts",
            self.games(),
            self.model,
            self.vegas,
            self.mean_abs_edge() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::tests::sample;
    use crate::predict::ConfidenceLevel;
    use crate::TeamId;

    #[test]
    fn test_empty_metrics() {
        let m = EvaluationMetrics::new();
        assert_eq!(m.games(), 0);
        assert_eq!(m.model.accuracy(), 0.0);
        assert_eq!(m.vegas.brier(), 0.0);
        assert_eq!(m.mean_abs_edge(), 0.0);
    }

    #[test]
    fn test_update() {
        let mut m = EvaluationMetrics::new();
        m.update(0.8, 0.6, true);
        m.update(0.3, 0.6, false);

        assert_eq!(m.games(), 2);
        assert_eq!(m.model.accuracy(), 1.0);
        assert_eq!(m.vegas.accuracy(), 0.5);

        // (0.04 + 0.09) / 2
        assert!((m.model.brier() - 0.065).abs() < 1e-6);
        // (0.16 + 0.36) / 2
        assert!((m.vegas.brier() - 0.26).abs() < 1e-6);

        let expected = -(0.8f64.ln() + 0.7f64.ln()) / 2.0;
        assert!((m.model.log_loss() - expected).abs() < 1e-6);

        assert!((m.mean_abs_edge() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_log_loss_is_finite_at_extremes() {
        let mut score = ProbabilityScore::default();
        score.update(0.0, true);
        score.update(1.0, false);
        assert!(score.log_loss().is_finite());
        assert!(score.log_loss() > 10.0);
    }

    #[test]
    fn test_merge() {
        let mut a = EvaluationMetrics::new();
        a.update(0.8, 0.6, true);
        let mut b = EvaluationMetrics::new();
        b.update(0.3, 0.6, false);

        let mut both = EvaluationMetrics::new();
        both.update(0.8, 0.6, true);
        both.update(0.3, 0.6, false);

        a.merge(&b);
        assert_eq!(a.games(), 2);
        assert!((a.model.brier() - both.model.brier()).abs() < 1e-12);
        assert!((a.mean_abs_edge() - both.mean_abs_edge()).abs() < 1e-12);
    }

    #[test]
    fn test_from_predictions() {
        let samples = vec![
            sample(TeamId(1), TeamId(2), 5, true),
            sample(TeamId(3), TeamId(4), 5, false),
        ];
        let preds: Vec<GamePrediction> = samples
            .iter()
            .zip([0.7f32, 0.4])
            .map(|(s, p)| GamePrediction {
                game_id: s.game_id.clone(),
                home_team: s.home_team,
                away_team: s.away_team,
                home_win_prob: p,
                vegas_home_win_prob: s.get_vegas_baseline(),
                edge: s.calculate_edge(p),
                confidence: ConfidenceLevel::High,
            })
            .collect();

        let m = EvaluationMetrics::from_predictions(&preds, &samples);
        assert_eq!(m.games(), 2);
        assert_eq!(m.model.accuracy(), 1.0);
        assert_eq!(m.vegas.accuracy(), 0.5);
        assert!(m.to_string().starts_with("Games: 2"));
    }

    #[test]
    fn test_unplayed_games_are_not_scored() {
        let s = sample(TeamId(1), TeamId(2), 5, true).with_played(false);
        let pred = GamePrediction {
            game_id: s.game_id.clone(),
            home_team: s.home_team,
            away_team: s.away_team,
            home_win_prob: 0.9,
            vegas_home_win_prob: 0.7,
            edge: 0.2,
            confidence: ConfidenceLevel::High,
        };

        let m = EvaluationMetrics::from_predictions(&[pred], &[s]);
        assert_eq!(m.games(), 0);
        assert_eq!(m.model.brier(), 0.0);
        assert_eq!(m.mean_abs_edge(), 0.0);
    }
}
