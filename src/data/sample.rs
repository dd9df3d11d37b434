//! One game's model input and label bundle

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::features::{GameMatrix, StaticFeatures, TeamGameSequence};
use crate::{GridironError, Result, TeamId};

/// Static feature vector, see `StaticFeatures::FEATURE_NAMES`
pub type StaticVector = [f32; StaticFeatures::DIM];

/// (home matrix, away matrix, static vector, label)
pub type TrainingData = (GameMatrix, GameMatrix, StaticVector, f32);

/// Complete sample for one game, used for both training and inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NflGameSampleRaw")]
pub struct NflGameSample {
    pub game_id: String,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub season: u16,
    pub week: u8,
    pub gameday: NaiveDate,

    home_sequence: TeamGameSequence,
    away_sequence: TeamGameSequence,
    static_features: StaticFeatures,

    /// Ground truth; false for unplayed games
    pub actual_home_won: bool,
    /// Market-implied home win probability at sample time
    pub vegas_home_win_prob: f32,
    /// False for scheduled games with no result yet
    played: bool,
}

/// Unchecked serde shape of `NflGameSample`
#[derive(Deserialize)]
struct NflGameSampleRaw {
    game_id: String,
    home_team: TeamId,
    away_team: TeamId,
    season: u16,
    week: u8,
    gameday: NaiveDate,
    home_sequence: TeamGameSequence,
    away_sequence: TeamGameSequence,
    static_features: StaticFeatures,
    actual_home_won: bool,
    vegas_home_win_prob: f32,
    #[serde(default = "default_played")]
    played: bool,
}

fn default_played() -> bool {
    true
}

impl TryFrom<NflGameSampleRaw> for NflGameSample {
    type Error = GridironError;

    fn try_from(raw: NflGameSampleRaw) -> Result<Self> {
        if raw.home_team != raw.home_sequence.team() || raw.away_team != raw.away_sequence.team() {
            return Err(GridironError::Parse(format!(
                "sample {} teams do not match its sequences",
                raw.game_id
            )));
        }
        let sample = NflGameSample::new(
            raw.game_id,
            raw.season,
            raw.week,
            raw.gameday,
            raw.home_sequence,
            raw.away_sequence,
            raw.static_features,
            raw.actual_home_won,
            raw.vegas_home_win_prob,
        )?;
        Ok(sample.with_played(raw.played))
    }
}

impl NflGameSample {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        game_id: impl Into<String>,
        season: u16,
        week: u8,
        gameday: NaiveDate,
        home_sequence: TeamGameSequence,
        away_sequence: TeamGameSequence,
        static_features: StaticFeatures,
        actual_home_won: bool,
        vegas_home_win_prob: f32,
    ) -> Result<Self> {
        if home_sequence.sequence_length() != away_sequence.sequence_length() {
            return Err(GridironError::Config(format!(
                "home and away sequence lengths differ ({} vs {})",
                home_sequence.sequence_length(),
                away_sequence.sequence_length()
            )));
        }

        Ok(NflGameSample {
            game_id: game_id.into(),
            home_team: home_sequence.team(),
            away_team: away_sequence.team(),
            season,
            week,
            gameday,
            home_sequence,
            away_sequence,
            static_features,
            actual_home_won,
            vegas_home_win_prob,
            played: true,
        })
    }

    /// Mark whether the game has a result; unplayed samples are inference-only
    pub fn with_played(mut self, played: bool) -> Self {
        self.played = played;
        if !played {
            self.actual_home_won = false;
        }
        self
    }

    pub fn is_played(&self) -> bool {
        self.played
    }

    pub fn home_sequence(&self) -> &TeamGameSequence {
        &self.home_sequence
    }

    pub fn away_sequence(&self) -> &TeamGameSequence {
        &self.away_sequence
    }

    pub fn static_features(&self) -> &StaticFeatures {
        &self.static_features
    }

    pub fn sequence_length(&self) -> usize {
        self.home_sequence.sequence_length()
    }

    /// Numeric export consumed by the model, in fixed order
    pub fn get_training_data(&self) -> TrainingData {
        (
            self.home_sequence.to_matrix(),
            self.away_sequence.to_matrix(),
            self.static_features.to_vector(),
            self.label(),
        )
    }

    /// 1.0 if the home team won, else 0.0 (also 0.0 for unplayed games)
    pub fn label(&self) -> f32 {
        if self.actual_home_won {
            1.0
        } else {
            0.0
        }
    }

    pub fn get_vegas_baseline(&self) -> f32 {
        self.vegas_home_win_prob
    }

    /// Model probability minus market probability; unclamped
    pub fn calculate_edge(&self, model_pred: f32) -> f32 {
        model_pred - self.vegas_home_win_prob
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::game::tests::sample_game;
    use crate::features::situational::tests::sparse_static;
    use crate::features::GameFeatures;

    pub(crate) fn sample(home: TeamId, away: TeamId, home_games: u8, home_won: bool) -> NflGameSample {
        let home_history = (1..=home_games).map(|w| sample_game(home, w)).collect();
        let away_history = (1..=6).map(|w| sample_game(away, w)).collect();
        NflGameSample::new(
            format!("2023_10_{}_{}", away.abbr(), home.abbr()),
            2023,
            10,
            NaiveDate::from_ymd_opt(2023, 11, 12).unwrap(),
            TeamGameSequence::new(home, home_history, 5).unwrap(),
            TeamGameSequence::new(away, away_history, 5).unwrap(),
            sparse_static(),
            home_won,
            0.62,
        )
        .unwrap()
    }

    #[test]
    fn test_training_data_shapes() {
        let s = sample(TeamId(15), TeamId(9), 2, true);
        let (home, away, static_vec, label) = s.get_training_data();

        assert_eq!(home.len(), 5);
        assert_eq!(away.len(), 5);
        assert!(home.iter().all(|row| row.len() == GameFeatures::DIM));
        assert_eq!(static_vec.len(), StaticFeatures::DIM);
        assert_eq!(label, 1.0);
    }

    #[test]
    fn test_training_data_is_idempotent() {
        let s = sample(TeamId(15), TeamId(9), 2, false);
        let first = s.get_training_data();
        let second = s.get_training_data();

        assert_eq!(first, second);
        assert_eq!(first.3, 0.0);
    }

    #[test]
    fn test_padding_in_home_matrix() {
        let s = sample(TeamId(15), TeamId(9), 2, true);
        let (home, _, _, _) = s.get_training_data();
        let neutral = GameFeatures::neutral(TeamId(15)).to_vector();

        assert_eq!(home[0], neutral);
        assert_eq!(home[2], neutral);
        assert_eq!(home[3], sample_game(TeamId(15), 1).to_vector());
        assert_eq!(home[4], sample_game(TeamId(15), 2).to_vector());
    }

    #[test]
    fn test_edge() {
        let s = sample(TeamId(15), TeamId(9), 5, true);
        assert_eq!(s.get_vegas_baseline(), 0.62);
        assert!((s.calculate_edge(0.70) - 0.08).abs() < 1e-6);
        assert!((s.calculate_edge(0.50) + 0.12).abs() < 1e-6);
    }

    #[test]
    fn test_unplayed_sample() {
        let s = sample(TeamId(15), TeamId(9), 5, true).with_played(false);
        assert!(!s.is_played());
        assert_eq!(s.label(), 0.0);
        assert!(sample(TeamId(15), TeamId(9), 5, true).is_played());
    }

    fn raw(s: &NflGameSample) -> NflGameSampleRaw {
        NflGameSampleRaw {
            game_id: s.game_id.clone(),
            home_team: s.home_team,
            away_team: s.away_team,
            season: s.season,
            week: s.week,
            gameday: s.gameday,
            home_sequence: s.home_sequence.clone(),
            away_sequence: s.away_sequence.clone(),
            static_features: s.static_features.clone(),
            actual_home_won: s.actual_home_won,
            vegas_home_win_prob: s.vegas_home_win_prob,
            played: s.played,
        }
    }

    #[test]
    fn test_raw_conversion_keeps_checks() {
        let s = sample(TeamId(15), TeamId(9), 3, true).with_played(false);
        assert_eq!(NflGameSample::try_from(raw(&s)).unwrap(), s);

        let mut short_away = raw(&s);
        short_away.away_sequence = TeamGameSequence::new(TeamId(9), Vec::new(), 3).unwrap();
        assert!(matches!(
            NflGameSample::try_from(short_away),
            Err(GridironError::Config(_))
        ));

        let mut wrong_team = raw(&s);
        wrong_team.home_team = TeamId(1);
        assert!(NflGameSample::try_from(wrong_team).is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let home = TeamGameSequence::new(TeamId(1), Vec::new(), 5).unwrap();
        let away = TeamGameSequence::new(TeamId(2), Vec::new(), 3).unwrap();
        let result = NflGameSample::new(
            "g",
            2023,
            1,
            NaiveDate::from_ymd_opt(2023, 9, 10).unwrap(),
            home,
            away,
            sparse_static(),
            false,
            0.5,
        );
        assert!(matches!(result, Err(GridironError::Config(_))));
    }
}
