//! End-to-end prediction demo on a synthetic season
//!
//! Builds game history, assembles point-in-time samples for the final weeks and runs an
//! untrained model over them, comparing against the market baseline.

use burn::backend::NdArray;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use gridiron::data::{GameHistory, Matchup, NflDataset};
use gridiron::features::market::{fair_probabilities, spread_movement};
use gridiron::features::{GameFeatures, Precipitation, StaticFeatures, SurfaceType};
use gridiron::model::{NflModelConfig, NflPredictionModel};
use gridiron::predict::{format_prediction, EvaluationMetrics, Predictor};
use gridiron::{Config, Result, TeamId, NUM_TEAMS};

type Backend = NdArray<f32>;

#[derive(Parser)]
#[command(name = "predict_demo")]
#[command(about = "Run the NFL home-win model over a synthetic season", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Season to simulate
    #[arg(long, default_value = "2023")]
    season: u16,

    /// Number of regular-season weeks to simulate
    #[arg(long, default_value = "12")]
    weeks: u8,

    /// Number of trailing weeks to predict
    #[arg(long, default_value = "2")]
    predict_weeks: u8,

    /// RNG seed for the synthetic season
    #[arg(long, default_value = "7")]
    rng_seed: u64,

    /// Print every prediction card
    #[arg(long)]
    show_all: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    if let Err(e) = run(&cli, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(cli.rng_seed);
    let strength: Vec<f32> = (0..NUM_TEAMS).map(|_| rng.gen_range(-0.15..0.15)).collect();

    let season_start = NaiveDate::from_ymd_opt(cli.season as i32, 9, 7)
        .ok_or_else(|| gridiron::GridironError::Parse(format!("bad season {}", cli.season)))?;

    let first_predicted = first_predicted_week(cli.weeks, cli.predict_weeks);
    let mut history = GameHistory::new();
    let mut matchups = Vec::new();

    for week in 1..=cli.weeks {
        let gameday = season_start + Duration::weeks(week as i64 - 1);
        let mut teams: Vec<u8> = (0..NUM_TEAMS as u8).collect();
        teams.shuffle(&mut rng);

        for pair in teams.chunks(2) {
            let (home, away) = (TeamId(pair[0]), TeamId(pair[1]));
            let matchup = simulate_matchup(&mut rng, &strength, cli.season, week, gameday, home, away)?;

            if week >= first_predicted {
                matchups.push(matchup);
            } else {
                let home_won = matchup.home_won.unwrap_or(false);
                let margin = rng.gen_range(1..21) * if home_won { 1 } else { -1 };
                history.insert(synthetic_game(&mut rng, &strength, &matchup, home, true, margin))?;
                history.insert(synthetic_game(&mut rng, &strength, &matchup, away, false, -margin))?;
            }
        }
    }

    log::info!(
        "Simulated {} games for {} teams; predicting {} matchups",
        history.num_games(),
        history.num_teams(),
        matchups.len()
    );

    let sequence_length = config.features.sequence_length;
    let dataset = NflDataset::from_history(&history, &matchups, sequence_length)?;

    let device = Default::default();
    let model = NflPredictionModel::<Backend>::new(&device, NflModelConfig::from_config(config))?;
    let predictor = Predictor::new(model, device);

    let mut metrics = EvaluationMetrics::new();
    for chunk in dataset.samples().chunks(config.data.batch_size.max(1)) {
        let preds = predictor.predict_samples(chunk)?;
        for (pred, sample) in preds.iter().zip(chunk) {
            metrics.update_prediction(pred, sample);
            if cli.show_all || pred.edge.abs() >= 0.05 {
                println!("{}", format_prediction(pred));
            }
        }
    }

    println!("{}", metrics);
    Ok(())
}

/// First of the trailing `predict_weeks` weeks, never before week 1
fn first_predicted_week(weeks: u8, predict_weeks: u8) -> u8 {
    (weeks.saturating_sub(predict_weeks) + 1).max(1)
}

fn simulate_matchup(
    rng: &mut StdRng,
    strength: &[f32],
    season: u16,
    week: u8,
    gameday: NaiveDate,
    home: TeamId,
    away: TeamId,
) -> Result<Matchup> {
    let diff = strength[home.index()] - strength[away.index()] + 0.03;
    let home_prob = (0.5 + diff).clamp(0.05, 0.95);

    // Moneylines for the true probability plus a standard hold
    let (home_ml, away_ml) = if home_prob >= 0.5 {
        let fav = (100.0 * home_prob / (1.0 - home_prob)).max(100.0) as i32 + 10;
        (-fav, (fav - 20).max(100))
    } else {
        let fav = (100.0 * (1.0 - home_prob) / home_prob).max(100.0) as i32 + 10;
        ((fav - 20).max(100), -fav)
    };
    let (vegas_home, vegas_away) = fair_probabilities(home_ml, away_ml)?;

    let spread_line = -(diff * 30.0 * 2.0).round() / 2.0;
    let opening_spread = rng.gen_bool(0.7).then(|| spread_line + rng.gen_range(-1.5..1.5));
    let is_dome = rng.gen_bool(0.25);
    let week_idx = week.saturating_sub(1) as u32;
    let home_wins = rng.gen_range(0..=week_idx);
    let away_wins = rng.gen_range(0..=week_idx);

    let static_features = StaticFeatures {
        home_field: true,
        is_division_game: rng.gen_bool(0.35),
        is_conference_game: rng.gen_bool(0.7),
        is_primetime: rng.gen_bool(0.15),
        week_number: week,
        rest_days_home: *[6u32, 7, 7, 10].choose(rng).unwrap_or(&7),
        rest_days_away: *[6u32, 7, 7, 10].choose(rng).unwrap_or(&7),
        travel_distance_miles: rng.gen_bool(0.9).then(|| rng.gen_range(0.0..2700.0)),
        timezone_change: rng.gen_bool(0.9).then(|| rng.gen_range(-3..=3)),
        temperature: (!is_dome).then(|| rng.gen_range(20.0..95.0)),
        wind_speed: (!is_dome).then(|| rng.gen_range(0.0..25.0)),
        humidity: rng.gen_bool(0.8).then(|| rng.gen_range(20.0..95.0)),
        is_dome,
        precipitation: if is_dome {
            Some(Precipitation::None)
        } else {
            [Precipitation::None, Precipitation::Rain, Precipitation::Snow]
                .choose(rng)
                .copied()
        },
        surface_type: if rng.gen_bool(0.5) {
            SurfaceType::Grass
        } else {
            SurfaceType::Turf
        },
        stadium_neutral: false,
        altitude_feet: rng.gen_bool(0.5).then(|| rng.gen_range(0.0..5280.0)),
        spread_line,
        total_line: rng.gen_range(37.0..54.0),
        opening_spread,
        spread_movement: spread_movement(opening_spread, spread_line),
        vegas_implied_win_pct_home: vegas_home,
        vegas_implied_win_pct_away: vegas_away,
        home_wins,
        home_losses: week_idx - home_wins,
        away_wins,
        away_losses: week_idx - away_wins,
        home_win_pct: win_pct(home_wins, week_idx),
        away_win_pct: win_pct(away_wins, week_idx),
        playoff_probability_home: None,
        playoff_probability_away: None,
    };

    Ok(Matchup {
        game_id: format!("{}_{:02}_{}_{}", season, week, away, home),
        home_team: home,
        away_team: away,
        season,
        week,
        gameday,
        static_features,
        home_won: Some(rng.gen_bool(home_prob as f64)),
        vegas_home_win_prob: vegas_home,
    })
}

fn win_pct(wins: u32, games: u32) -> f32 {
    if games == 0 {
        0.5
    } else {
        wins as f32 / games as f32
    }
}

/// One team's box-score record for a simulated game
fn synthetic_game(
    rng: &mut StdRng,
    strength: &[f32],
    matchup: &Matchup,
    team: TeamId,
    was_home: bool,
    point_diff: i32,
) -> GameFeatures {
    let opponent = if was_home {
        matchup.away_team
    } else {
        matchup.home_team
    };
    let s = strength[team.index()];
    let mut noise = |scale: f32| rng.gen_range(-scale..scale);

    let off_epa = s + noise(0.1);
    let def_epa = -s + noise(0.1);
    let turnovers_lost = (1.2 - s * 3.0 + noise(1.0)).max(0.0).round();
    let turnovers_forced = (1.2 + s * 3.0 + noise(1.0)).max(0.0).round();

    GameFeatures {
        game_id: matchup.game_id.clone(),
        team,
        opponent: Some(opponent),
        season: matchup.season,
        week: matchup.week,
        off_epa,
        pass_epa: off_epa * 1.2 + noise(0.05),
        rush_epa: off_epa * 0.6 + noise(0.05),
        air_epa: off_epa * 0.8 + noise(0.05),
        yac_epa: off_epa * 0.4 + noise(0.05),
        def_epa,
        def_pass_epa: def_epa * 1.1 + noise(0.05),
        def_rush_epa: def_epa * 0.7 + noise(0.05),
        success_rate: 0.45 + s * 0.3 + noise(0.03),
        explosiveness: 0.15 + noise(0.03),
        third_down_conversion: 0.38 + s * 0.4 + noise(0.05),
        red_zone: 0.55 + s * 0.5 + noise(0.1),
        turnovers_lost,
        turnovers_forced,
        turnovers_margin: turnovers_forced - turnovers_lost,
        completion_rate: 0.64 + s * 0.2 + noise(0.04),
        sack_rate: 0.065 - s * 0.1 + noise(0.02),
        qb_hit_rate: 0.15 + noise(0.04),
        avg_depth_of_target: 8.0 + noise(1.5),
        rush_rate: 0.42 + noise(0.06),
        yards_per_carry: 4.3 + s * 2.0 + noise(0.6),
        stuff_rate: 0.18 + noise(0.04),
        penalties: (6.0 + noise(3.0)).max(0.0) as u32,
        penalty_yards: (50.0 + noise(25.0)).max(0.0) as u32,
        total_plays: (63.0 + noise(8.0)) as u32,
        time_possession_pct: 0.5 + s * 0.2 + noise(0.04),
        point_diff,
        won: point_diff > 0,
        was_home,
        opponent_season_epa: strength[opponent.index()],
    }
}
