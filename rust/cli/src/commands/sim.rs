//! Simulation command handler.
//!
//! Plays all-agent games to completion through the game manager, the same
//! commit path interactive games use. Each game is written as one
//! [`GameRecord`] JSONL line; agent decisions can additionally be exported as
//! `s,a,r,sp` CSV rows for offline training.
//!
//! # Examples
//!
//! ```no_run
//! use kittens_cli::commands::sim::{handle_sim_command, SimOptions};
//! use kittens_service::GameSettings;
//! use std::io;
//!
//! let opts = SimOptions {
//!     games: 100,
//!     players: 4,
//!     seed: Some(42),
//!     output: Some("data/games.jsonl".into()),
//!     ..Default::default()
//! };
//! handle_sim_command(&opts, &GameSettings::default(), &mut io::stdout(), &mut io::stderr())
//!     .unwrap();
//! ```

use crate::error::CliError;
use crate::io_utils::{create_buffered, ensure_parent_dir};
use crate::ui;
use kittens_ai::policy::PolicyStore;
use kittens_ai::DecisionEngine;
use kittens_engine::logger::{GameLogger, GameRecord, GameStatsRecord};
use kittens_engine::player::AgentType;
use kittens_service::{
    DocumentStore, GameManager, GameSettings, MemoryStore, ServiceError, SqliteStore,
    calculate_stats,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options of one `sim` run
#[derive(Debug, Clone, Default)]
pub struct SimOptions {
    pub games: u32,
    pub players: usize,
    /// Base seed; falls back to the configured seed, then to a random one
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub transitions: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub policy_dir: Option<PathBuf>,
}

/// Handle the sim command: play `games` all-agent games.
///
/// Game `i` is seeded with `seed + i`, so a run is reproducible from its base
/// seed. Prints a per-agent-type summary when done.
pub fn handle_sim_command(
    opts: &SimOptions,
    settings: &GameSettings,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if opts.games == 0 {
        ui::write_error(err, "games must be >= 1")?;
        return Err(CliError::InvalidInput("games must be >= 1".to_string()));
    }
    if !(2..=settings.max_players).contains(&opts.players) {
        let msg = format!("players must be between 2 and {}", settings.max_players);
        ui::write_error(err, &msg)?;
        return Err(CliError::InvalidInput(msg));
    }

    let policy_dir = opts
        .policy_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.policy_dir));
    let policies = Arc::new(PolicyStore::load_dir(&policy_dir));
    let decisions = Arc::new(DecisionEngine::new(policies));
    let store = open_store(opts.db.as_deref(), err)?;

    let mut logger = match &opts.output {
        Some(path) => GameLogger::create(path).map_err(|e| {
            let _ = ui::write_error(
                err,
                &format!("Failed to open output file {}: {}", path.display(), e),
            );
            CliError::Io(e)
        })?,
        None => GameLogger::discard(),
    };
    let mut transitions = match &opts.transitions {
        Some(path) => {
            let mut w = create_buffered(path)?;
            writeln!(w, "s,a,r,sp")?;
            Some(w)
        }
        None => None,
    };

    let base_seed = opts.seed.or(settings.seed).unwrap_or_else(rand::random);
    let roster = agent_roster(opts.players);
    let mut standings: Vec<GameStatsRecord> = Vec::new();
    let mut exhausted = 0u32;

    for i in 0..opts.games {
        let seed = base_seed.wrapping_add(u64::from(i));
        let manager = GameManager::new(
            Arc::clone(&store),
            Arc::clone(&decisions),
            GameSettings {
                seed: Some(seed),
                record_decisions: transitions.is_some(),
                ..settings.clone()
            },
        );
        let id = manager.create_game_with_roster(roster.clone())?;
        let game = manager.get_game(&id)?;
        if game.winner().is_none() {
            exhausted += 1;
        }

        let record = GameRecord {
            game_id: id.clone(),
            seed,
            winner: game.winner(),
            rounds: game.round_number(),
            actions: game.action_history().to_vec(),
            standings: game.standings().to_vec(),
            ts: None,
        };
        logger.write(&record)?;

        if let Some(w) = transitions.as_mut() {
            for d in manager.take_decisions() {
                writeln!(w, "{},{},{},{}", d.state, d.action, d.reward, d.next_state)?;
            }
        }
        tracing::debug!(game_id = %id, seed, winner = ?game.winner(), rounds = record.rounds, "simulated game");
        standings.extend(record.standings);
    }
    if let Some(mut w) = transitions {
        w.flush()?;
    }

    writeln!(out, "Simulated: {} games", logger.written())?;
    if exhausted > 0 {
        writeln!(out, "Deck exhausted: {} games", exhausted)?;
    }
    for s in calculate_stats(&standings) {
        writeln!(
            out,
            "{:<10} games={} wins={} win_rate={} avg_position={:.2} explosions={}",
            s.player_type.as_str(),
            s.games,
            s.wins,
            ui::percent(s.win_rate),
            s.avg_position,
            s.explosions
        )?;
    }
    Ok(())
}

/// Agent seats cycle through every agent type.
fn agent_roster(players: usize) -> Vec<(String, AgentType)> {
    let rotation = AgentType::seat_rotation();
    (0..players)
        .map(|i| {
            let agent = rotation[i % rotation.len()];
            (format!("{}-{}", agent.as_str(), i + 1), agent)
        })
        .collect()
}

fn open_store(db: Option<&Path>, err: &mut dyn Write) -> Result<Arc<dyn DocumentStore>, CliError> {
    let Some(path) = db else {
        return Ok(Arc::new(MemoryStore::new()));
    };
    if let Err(e) = ensure_parent_dir(path) {
        ui::write_error(err, &e)?;
        return Err(CliError::Io(std::io::Error::other(e)));
    }
    match SqliteStore::open(path) {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) => {
            ui::write_error(err, &format!("Failed to open database {}: {}", path.display(), e))?;
            Err(CliError::Service(ServiceError::from(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_cycles_agent_types() {
        let roster = agent_roster(5);
        assert_eq!(roster.len(), 5);
        assert_eq!(roster[0].1, AgentType::Bayesian);
        assert_eq!(roster[4].1, AgentType::Bayesian);
        assert_eq!(roster[3].0, "random-4");
        assert!(roster.iter().all(|(_, t)| t.is_agent()));
    }

    #[test]
    fn rejects_zero_games_and_bad_table_size() {
        let settings = GameSettings::default();
        let mut out = Vec::new();
        let mut err = Vec::new();

        let zero = SimOptions {
            games: 0,
            players: 3,
            ..Default::default()
        };
        assert!(handle_sim_command(&zero, &settings, &mut out, &mut err).is_err());

        let crowded = SimOptions {
            games: 1,
            players: 6,
            ..Default::default()
        };
        assert!(handle_sim_command(&crowded, &settings, &mut out, &mut err).is_err());
        assert!(String::from_utf8(err).unwrap().contains("players must be between 2 and 5"));
    }

    #[test]
    fn summary_covers_every_seat_type() {
        let settings = GameSettings::default();
        let opts = SimOptions {
            games: 3,
            players: 4,
            seed: Some(9),
            ..Default::default()
        };
        let mut out = Vec::new();
        let mut err = Vec::new();
        handle_sim_command(&opts, &settings, &mut out, &mut err).unwrap();

        let stdout = String::from_utf8(out).unwrap();
        assert!(stdout.starts_with("Simulated: 3 games"));
        for t in ["bayesian", "qlearning", "mle", "random"] {
            assert!(stdout.contains(&format!("{:<10} games=3", t)), "{}", stdout);
        }
    }
}
