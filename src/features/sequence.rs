//! Fixed-length team history window for the sequence encoder

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::game::GameFeatures;
use crate::{GridironError, Result, TeamId};

/// Default number of games per history window
pub const DEFAULT_SEQUENCE_LENGTH: usize = 5;

/// `[sequence_length, GameFeatures::DIM]` matrix, one row per game
pub type GameMatrix = Vec<[f32; GameFeatures::DIM]>;

/// A team's most recent games, left-padded to a fixed length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TeamGameSequenceRaw")]
pub struct TeamGameSequence {
    team: TeamId,
    /// Chronological, most recent last
    games: Vec<GameFeatures>,
    sequence_length: usize,
}

#[derive(Deserialize)]
struct TeamGameSequenceRaw {
    team: TeamId,
    games: Vec<GameFeatures>,
    sequence_length: usize,
}

impl TryFrom<TeamGameSequenceRaw> for TeamGameSequence {
    type Error = GridironError;

    fn try_from(raw: TeamGameSequenceRaw) -> Result<Self> {
        TeamGameSequence::new(raw.team, raw.games, raw.sequence_length)
    }
}

impl TeamGameSequence {
    pub fn new(team: TeamId, games: Vec<GameFeatures>, sequence_length: usize) -> Result<Self> {
        if sequence_length == 0 {
            return Err(GridironError::Config(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        Ok(TeamGameSequence {
            team,
            games,
            sequence_length,
        })
    }

    /// Window with the default length of 5
    pub fn with_default_length(team: TeamId, games: Vec<GameFeatures>) -> Self {
        TeamGameSequence {
            team,
            games,
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
        }
    }

    pub fn team(&self) -> TeamId {
        self.team
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// All backing games, including those outside the window
    pub fn games(&self) -> &[GameFeatures] {
        &self.games
    }

    /// Real games that land in the window
    pub fn real_game_count(&self) -> usize {
        self.games.len().min(self.sequence_length)
    }

    /// Neutral games prepended to fill the window
    pub fn padding_count(&self) -> usize {
        self.sequence_length - self.real_game_count()
    }

    /// The padded window: neutral games first, then the most recent real games
    pub fn window(&self) -> Vec<Cow<'_, GameFeatures>> {
        let start = self.games.len().saturating_sub(self.sequence_length);
        let mut window = Vec::with_capacity(self.sequence_length);
        if self.padding_count() > 0 {
            let neutral = GameFeatures::neutral(self.team);
            window.extend((0..self.padding_count()).map(|_| Cow::Owned(neutral.clone())));
        }
        window.extend(self.games[start..].iter().map(Cow::Borrowed));
        window
    }

    /// Project the window into a `[sequence_length, 27]` matrix
    pub fn to_matrix(&self) -> GameMatrix {
        self.window().iter().map(|game| game.to_vector()).collect()
    }

    /// Row-major flattening of `to_matrix`
    pub fn to_flat(&self) -> Vec<f32> {
        self.to_matrix().into_iter().flatten().collect()
    }

    /// Per-row validity (true = real game, false = padding)
    pub fn mask(&self) -> Vec<bool> {
        self.window().iter().map(|game| !game.is_padding()).collect()
    }
}
