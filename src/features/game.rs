//! Per-game team performance record
//!
//! Each game in a team's history is encoded as a 27-value feature vector.

use serde::{Deserialize, Serialize};

use crate::TeamId;

/// Game id carried by synthetic padding games
pub const PADDING_GAME_ID: &str = "padding";

/// Derived statistics from a single game, from one team's perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFeatures {
    pub game_id: String,
    pub team: TeamId,
    /// None only for padding games
    pub opponent: Option<TeamId>,
    pub season: u16,
    pub week: u8,

    // Offensive EPA per play
    pub off_epa: f32,
    pub pass_epa: f32,
    pub rush_epa: f32,
    pub air_epa: f32,
    pub yac_epa: f32,

    // Defensive EPA per play allowed
    pub def_epa: f32,
    pub def_pass_epa: f32,
    pub def_rush_epa: f32,

    pub success_rate: f32,
    pub explosiveness: f32,
    pub third_down_conversion: f32,
    pub red_zone: f32,

    pub turnovers_lost: f32,
    pub turnovers_forced: f32,
    pub turnovers_margin: f32,

    pub completion_rate: f32,
    pub sack_rate: f32,
    pub qb_hit_rate: f32,
    pub avg_depth_of_target: f32,

    pub rush_rate: f32,
    pub yards_per_carry: f32,
    pub stuff_rate: f32,

    pub penalties: u32,
    pub penalty_yards: u32,

    pub total_plays: u32,
    /// Share of game clock in possession (0-1)
    pub time_possession_pct: f32,

    pub point_diff: i32,
    pub won: bool,
    pub was_home: bool,

    /// Opponent's season-long EPA per play
    pub opponent_season_epa: f32,
}

impl GameFeatures {
    /// Dimension of feature vector
    pub const DIM: usize = 27;

    /// Column names of `to_vector`, in order
    pub const FEATURE_NAMES: [&'static str; Self::DIM] = [
        "off_epa",
        "pass_epa",
        "rush_epa",
        "air_epa",
        "yac_epa",
        "def_epa",
        "def_pass_epa",
        "def_rush_epa",
        "success_rate",
        "explosiveness",
        "third_down_conversion",
        "red_zone",
        "turnovers_lost",
        "turnovers_forced",
        "turnovers_margin",
        "completion_rate",
        "sack_rate",
        "qb_hit_rate",
        "avg_depth_of_target",
        "rush_rate",
        "yards_per_carry",
        "stuff_rate",
        "penalties",
        "penalty_yards",
        "total_plays",
        "time_possession",
        "opponent_season_epa",
    ];

    /// Statistically neutral stand-in for a missing history slot.
    ///
    /// Tagged with [`PADDING_GAME_ID`] so real-game statistics can skip it.
    pub fn neutral(team: TeamId) -> Self {
        GameFeatures {
            game_id: PADDING_GAME_ID.to_string(),
            team,
            opponent: None,
            season: 0,
            week: 0,
            off_epa: 0.0,
            pass_epa: 0.0,
            rush_epa: 0.0,
            air_epa: 0.0,
            yac_epa: 0.0,
            def_epa: 0.0,
            def_pass_epa: 0.0,
            def_rush_epa: 0.0,
            success_rate: 0.5,
            explosiveness: 0.15,
            third_down_conversion: 0.33,
            red_zone: 0.5,
            turnovers_lost: 1.0,
            turnovers_forced: 1.0,
            turnovers_margin: 0.0,
            completion_rate: 0.6,
            sack_rate: 0.05,
            qb_hit_rate: 0.1,
            avg_depth_of_target: 7.0,
            rush_rate: 0.4,
            yards_per_carry: 4.0,
            stuff_rate: 0.1,
            penalties: 5,
            penalty_yards: 50,
            total_plays: 60,
            time_possession_pct: 0.5,
            point_diff: 0,
            won: false,
            was_home: false,
            opponent_season_epa: 0.0,
        }
    }

    /// True for synthetic padding games
    pub fn is_padding(&self) -> bool {
        self.game_id == PADDING_GAME_ID
    }

    /// Convert to a fixed-order feature vector (see `FEATURE_NAMES`)
    pub fn to_vector(&self) -> [f32; Self::DIM] {
        [
            self.off_epa,
            self.pass_epa,
            self.rush_epa,
            self.air_epa,
            self.yac_epa,
            self.def_epa,
            self.def_pass_epa,
            self.def_rush_epa,
            self.success_rate,
            self.explosiveness,
            self.third_down_conversion,
            self.red_zone,
            self.turnovers_lost,
            self.turnovers_forced,
            self.turnovers_margin,
            self.completion_rate,
            self.sack_rate,
            self.qb_hit_rate,
            self.avg_depth_of_target,
            self.rush_rate,
            self.yards_per_carry,
            self.stuff_rate,
            self.penalties as f32,
            self.penalty_yards as f32,
            self.total_plays as f32,
            self.time_possession_pct,
            self.opponent_season_epa,
        ]
    }

    /// Look up a single projected value by column name
    pub fn feature(&self, name: &str) -> Option<f32> {
        Self::FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.to_vector()[idx])
    }
}
