//! Per-team accumulated game history
//!
//! Snapshots point-in-time windows so a sample only sees games played before it.

use std::collections::HashMap;

use crate::features::{GameFeatures, TeamGameSequence};
use crate::{GridironError, Result, TeamId};

/// Chronological game records for every team
#[derive(Debug, Clone, Default)]
pub struct GameHistory {
    games: HashMap<TeamId, Vec<GameFeatures>>,
}

impl GameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an unordered collection of feeder records
    pub fn from_games(games: impl IntoIterator<Item = GameFeatures>) -> Result<Self> {
        let mut history = Self::new();
        for game in games {
            history.insert(game)?;
        }
        Ok(history)
    }

    /// Add a real game, keeping the team's list sorted by (season, week)
    pub fn insert(&mut self, game: GameFeatures) -> Result<()> {
        if game.is_padding() {
            return Err(GridironError::Parse(format!(
                "padding game for {} cannot be stored as history",
                game.team
            )));
        }

        let games = self.games.entry(game.team).or_default();
        let key = (game.season, game.week);
        let pos = games.partition_point(|g| (g.season, g.week) <= key);
        games.insert(pos, game);
        Ok(())
    }

    /// All stored games for a team, oldest first
    pub fn team_games(&self, team: TeamId) -> &[GameFeatures] {
        self.games.get(&team).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Games strictly before the given season/week
    pub fn games_before(&self, team: TeamId, season: u16, week: u8) -> &[GameFeatures] {
        let games = self.team_games(team);
        let end = games.partition_point(|g| (g.season, g.week) < (season, week));
        &games[..end]
    }

    /// Window of the team's most recent games before the given season/week
    pub fn window(
        &self,
        team: TeamId,
        season: u16,
        week: u8,
        sequence_length: usize,
    ) -> Result<TeamGameSequence> {
        let before = self.games_before(team, season, week);
        let start = before.len().saturating_sub(sequence_length);
        let sequence = TeamGameSequence::new(team, before[start..].to_vec(), sequence_length)?;

        log::debug!(
            "{} window for {} week {}: {} real, {} padding",
            team,
            season,
            week,
            sequence.real_game_count(),
            sequence.padding_count()
        );
        Ok(sequence)
    }

    pub fn num_teams(&self) -> usize {
        self.games.len()
    }

    pub fn num_games(&self) -> usize {
        self.games.values().map(Vec::len).sum()
    }
}
