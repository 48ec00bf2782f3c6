use kittens_ai::encoder::encode;
use kittens_ai::DecisionEngine;
use kittens_engine::errors::GameError;
use kittens_engine::game::{DefusePlacement, DrawOutcome, Game, GameStatus, PlayOutcome};
use kittens_engine::logger::{ActionEntry, GameStatsRecord};
use kittens_engine::player::AgentType;
use kittens_engine::rules::{card_for_action, AgentAction};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{IntoErrorResponse, ServiceError};
use crate::settings::GameSettings;
use crate::store::{DocumentStore, Order, Query, StoredDocument, WriteOp, GAMES, GAME_STATS, PLAYER_ACTIONS};

pub type GameId = String;

const ACTIVE_GAMES_LIMIT: usize = 10;
const RECENT_ACTIONS_LIMIT: usize = 50;

/// A game document together with its store id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGame {
    pub id: GameId,
    pub game: Game,
}

/// One agent decision with its outcome, as a learning transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub game_id: GameId,
    pub player_index: usize,
    pub agent_type: AgentType,
    pub state: u32,
    pub action: u8,
    pub reward: i8,
    pub next_state: u32,
}

/// Commit boundary for every game operation.
///
/// Each call loads the latest snapshot, applies the operation to it under a
/// per-game lock, runs any agent turns that follow, checks invariants and
/// writes the snapshot plus new history and statistics rows in one batch.
/// A failing call writes nothing.
pub struct GameManager {
    store: Arc<dyn DocumentStore>,
    decisions: Arc<DecisionEngine>,
    settings: GameSettings,
    locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
    decision_log: Mutex<Vec<DecisionRecord>>,
}

impl std::fmt::Debug for GameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameManager")
            .field("decisions", &self.decisions)
            .field("settings", &self.settings)
            .finish()
    }
}

struct CommitContext<'a> {
    id: &'a str,
    rng: ChaCha20Rng,
}

impl GameManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        decisions: Arc<DecisionEngine>,
        settings: GameSettings,
    ) -> Self {
        Self {
            store,
            decisions,
            settings,
            locks: Mutex::new(HashMap::new()),
            decision_log: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Creates and starts a game with one human seat. Agent seats that act
    /// before the human are played out before this returns.
    pub fn create_game(
        &self,
        human_player_index: usize,
        player_names: &[String],
    ) -> Result<GameId, ServiceError> {
        let game = Game::create(
            human_player_index,
            player_names,
            self.settings.rules(),
            self.next_seed(),
        )?;
        self.launch(game)
    }

    /// Creates and starts a game from an explicit roster, which may be all
    /// agents.
    pub fn create_game_with_roster(
        &self,
        roster: Vec<(String, AgentType)>,
    ) -> Result<GameId, ServiceError> {
        let game = Game::with_roster(roster, self.settings.rules(), self.next_seed())?;
        self.launch(game)
    }

    fn launch(&self, game: Game) -> Result<GameId, ServiceError> {
        let players = game.players().len();
        let seed = game.seed();
        let id = self.store.insert(GAMES, serde_json::to_value(&game)?)?;
        tracing::info!(game_id = %id, players, seed, "game created");

        self.mutate(&id, |mgr, game, ctx| {
            game.start(&mut ctx.rng)?;
            tracing::debug!(
                game_id = %ctx.id,
                deck = game.deck().len(),
                first_player = game.current_player_index(),
                "game started"
            );
            mgr.run_agent_chain(game, ctx)
        })?;
        Ok(id)
    }

    pub fn get_game(&self, id: &str) -> Result<Game, ServiceError> {
        let doc = self
            .store
            .get(id)?
            .ok_or_else(|| GameError::GameNotFound(id.to_string()))?;
        decode_game(&doc)
    }

    /// Unfinished games, newest first.
    pub fn active_games(&self) -> Result<Vec<StoredGame>, ServiceError> {
        let query = Query::new(GAMES)
            .neq("status", GameStatus::Finished.as_str())
            .order(Order::Desc)
            .take(ACTIVE_GAMES_LIMIT);
        self.store
            .query(&query)?
            .iter()
            .map(|doc| {
                Ok(StoredGame {
                    id: doc.id.clone(),
                    game: decode_game(doc)?,
                })
            })
            .collect()
    }

    /// Most recent action rows of a game, newest first.
    pub fn game_actions(&self, id: &str) -> Result<Vec<ActionEntry>, ServiceError> {
        let query = Query::new(PLAYER_ACTIONS)
            .eq("gameId", id)
            .order(Order::Desc)
            .take(RECENT_ACTIONS_LIMIT);
        self.store
            .query(&query)?
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc.body)
                    .map_err(|e| ServiceError::CorruptDocument(doc.id.clone(), e.to_string()))
            })
            .collect()
    }

    /// Statistics rows written when the game finished.
    pub fn game_stats(&self, id: &str) -> Result<Vec<GameStatsRecord>, ServiceError> {
        let query = Query::new(GAME_STATS).eq("gameId", id);
        self.store
            .query(&query)?
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc.body)
                    .map_err(|e| ServiceError::CorruptDocument(doc.id.clone(), e.to_string()))
            })
            .collect()
    }

    pub fn play_card(
        &self,
        id: &str,
        player_index: usize,
        card_index: usize,
    ) -> Result<PlayOutcome, ServiceError> {
        self.mutate(id, |_, game, ctx| {
            let outcome = game.play_card(player_index, card_index, &mut ctx.rng)?;
            tracing::debug!(
                game_id = %ctx.id,
                player_index,
                card = %outcome.card.card_id,
                effect = %outcome.card.effect,
                "card played"
            );
            Ok(outcome)
        })
    }

    pub fn draw_card(
        &self,
        id: &str,
        player_index: usize,
        placement: DefusePlacement,
    ) -> Result<DrawOutcome, ServiceError> {
        self.mutate(id, |mgr, game, ctx| {
            let outcome = game.draw_card(player_index, placement, &mut ctx.rng)?;
            log_draw(ctx.id, player_index, &outcome);
            mgr.run_agent_chain(game, ctx)?;
            Ok(outcome)
        })
    }

    /// Ends the turn and plays out every agent turn that follows. Returns the
    /// seat whose turn it is afterwards.
    pub fn end_turn(&self, id: &str, player_index: usize) -> Result<usize, ServiceError> {
        self.mutate(id, |mgr, game, ctx| {
            game.end_turn(player_index)?;
            mgr.run_agent_chain(game, ctx)?;
            Ok(game.current_player_index())
        })
    }

    pub fn end_game(
        &self,
        id: &str,
        winner_index: usize,
    ) -> Result<Vec<GameStatsRecord>, ServiceError> {
        self.mutate(id, |_, game, _| Ok(game.end_game(winner_index)?))
    }

    /// Drains the decisions recorded so far.
    pub fn take_decisions(&self) -> Vec<DecisionRecord> {
        match self.decision_log.lock() {
            Ok(mut log) => std::mem::take(&mut *log),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn next_seed(&self) -> u64 {
        self.settings.seed.unwrap_or_else(rand::random)
    }

    /// Lock for an existing game. Unknown ids never get an entry.
    fn game_lock(&self, id: &str) -> Result<Arc<Mutex<()>>, ServiceError> {
        let mut locks = self.locks.lock().map_err(|_| ServiceError::LockPoisoned)?;
        if let Some(lock) = locks.get(id) {
            return Ok(Arc::clone(lock));
        }
        if self.store.get(id)?.is_none() {
            return Err(GameError::GameNotFound(id.to_string()).into());
        }
        Ok(Arc::clone(locks.entry(id.to_string()).or_default()))
    }

    // A finished game rejects every mutation, so its lock can go.
    fn release_lock(&self, id: &str) {
        match self.locks.lock() {
            Ok(mut locks) => locks.remove(id),
            Err(poisoned) => poisoned.into_inner().remove(id),
        };
    }

    /// Runs `op` as one commit. Rejections are logged with their error kind.
    fn mutate<T, F>(&self, id: &str, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Self, &mut Game, &mut CommitContext<'_>) -> Result<T, ServiceError>,
    {
        self.commit_op(id, op).inspect_err(|e| {
            let response = e.log_and_respond();
            tracing::debug!(game_id = %id, error = %response.error, "commit discarded");
        })
    }

    fn commit_op<T, F>(&self, id: &str, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Self, &mut Game, &mut CommitContext<'_>) -> Result<T, ServiceError>,
    {
        let lock = self.game_lock(id)?;
        let _guard = lock.lock().map_err(|_| ServiceError::LockPoisoned)?;

        let mut game = self.get_game(id)?;
        let history_before = game.action_history().len();
        let was_finished = game.status() == GameStatus::Finished;
        let mut ctx = CommitContext {
            id,
            rng: commit_rng(&game),
        };

        let result = op(self, &mut game, &mut ctx)?;
        game.check_invariants()?;
        self.commit(id, &game, history_before, was_finished)?;
        if game.status() == GameStatus::Finished {
            self.release_lock(id);
        }
        Ok(result)
    }

    fn commit(
        &self,
        id: &str,
        game: &Game,
        history_before: usize,
        was_finished: bool,
    ) -> Result<(), ServiceError> {
        let mut ops = vec![WriteOp::Patch {
            id: id.to_string(),
            fields: serde_json::to_value(game)?,
        }];
        for entry in &game.action_history()[history_before..] {
            ops.push(WriteOp::Insert {
                collection: PLAYER_ACTIONS.to_string(),
                document: with_game_id(serde_json::to_value(entry)?, id),
            });
        }
        let finished_now = !was_finished && game.status() == GameStatus::Finished;
        if finished_now {
            for record in game.standings() {
                ops.push(WriteOp::Insert {
                    collection: GAME_STATS.to_string(),
                    document: with_game_id(serde_json::to_value(record)?, id),
                });
            }
        }
        self.store.apply(ops)?;

        if finished_now {
            tracing::info!(
                game_id = %id,
                winner = ?game.winner(),
                rounds = game.round_number(),
                actions = game.action_history().len(),
                "game finished"
            );
        }
        Ok(())
    }

    fn run_agent_chain(&self, game: &mut Game, ctx: &mut CommitContext<'_>) -> Result<(), ServiceError> {
        let mut turns = 0;
        while game.is_agent_turn() {
            if turns >= self.settings.max_chain_turns {
                return Err(ServiceError::ChainLimit(self.settings.max_chain_turns));
            }
            turns += 1;
            self.agent_turn(game, ctx)?;
        }
        Ok(())
    }

    /// Plays cards while the agent asks for one it holds, then takes the
    /// draws it owes. A Skip or Attack that hands the turn on ends it early.
    fn agent_turn(&self, game: &mut Game, ctx: &mut CommitContext<'_>) -> Result<(), ServiceError> {
        let idx = game.current_player_index();
        let agent_type = game.current_player().agent_type;
        let mut plays = 0;

        while plays < self.settings.max_plays_per_turn && still_acting(game, idx) {
            let Some(decision) = self.decisions.decide_for(game, idx, &mut ctx.rng) else {
                return Ok(());
            };
            if decision.action == AgentAction::Draw {
                break;
            }
            let Some(card_index) = card_for_action(game.current_player().hand(), decision.action) else {
                tracing::trace!(game_id = %ctx.id, player_index = idx, action = ?decision.action, "no matching card, drawing");
                break;
            };
            let outcome = game.play_card(idx, card_index, &mut ctx.rng)?;
            tracing::debug!(
                game_id = %ctx.id,
                player_index = idx,
                agent = agent_type.as_str(),
                card = %outcome.card.card_id,
                effect = %outcome.card.effect,
                "agent played card"
            );
            self.record(ctx.id, game, idx, agent_type, decision.state, decision.action);
            plays += 1;
        }

        while still_acting(game, idx) {
            if game.deck().is_empty() {
                tracing::info!(game_id = %ctx.id, player_index = idx, "deck exhausted on agent draw");
                game.end_exhausted()?;
                return Ok(());
            }
            let state = encode(game, idx);
            let outcome = game.draw_card(idx, DefusePlacement::Random, &mut ctx.rng)?;
            log_draw(ctx.id, idx, &outcome);
            self.record(ctx.id, game, idx, agent_type, state, AgentAction::Draw);
        }
        Ok(())
    }

    fn record(
        &self,
        game_id: &str,
        game: &Game,
        player_index: usize,
        agent_type: AgentType,
        state: u32,
        action: AgentAction,
    ) {
        if !self.settings.record_decisions {
            return;
        }
        let reward = match game.player(player_index) {
            Some(p) if !p.is_alive() => -1,
            _ if game.winner() == Some(player_index) => 1,
            _ => 0,
        };
        let record = DecisionRecord {
            game_id: game_id.to_string(),
            player_index,
            agent_type,
            state,
            action: action.code(),
            reward,
            next_state: encode(game, player_index),
        };
        match self.decision_log.lock() {
            Ok(mut log) => log.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

fn still_acting(game: &Game, player_index: usize) -> bool {
    game.status() == GameStatus::Playing && game.current_player_index() == player_index
}

fn log_draw(game_id: &str, player_index: usize, outcome: &DrawOutcome) {
    match outcome {
        DrawOutcome::Drew { card_id } => {
            tracing::debug!(game_id = %game_id, player_index, card = %card_id, "card drawn")
        }
        DrawOutcome::Defused { position, .. } => {
            tracing::info!(game_id = %game_id, player_index, position, "exploding kitten defused")
        }
        DrawOutcome::Exploded { winner, .. } => {
            tracing::info!(game_id = %game_id, player_index, winner = ?winner, "player exploded")
        }
    }
}

/// Per-commit generator: the game seed mixed with the history length, so a
/// replay of the same calls draws the same numbers.
fn commit_rng(game: &Game) -> ChaCha20Rng {
    let mix = (game.action_history().len() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ChaCha20Rng::seed_from_u64(game.seed() ^ mix)
}

fn decode_game(doc: &StoredDocument) -> Result<Game, ServiceError> {
    serde_json::from_value(doc.body.clone())
        .map_err(|e| ServiceError::CorruptDocument(doc.id.clone(), e.to_string()))
}

fn with_game_id(mut row: Value, id: &str) -> Value {
    if let Some(obj) = row.as_object_mut() {
        obj.insert("gameId".to_string(), Value::String(id.to_string()));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use kittens_ai::policy::PolicyStore;
    use crate::logging::TestLogSubscriber;
    use kittens_engine::logger::ActionType;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn manager(settings: GameSettings) -> GameManager {
        GameManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(DecisionEngine::new(Arc::new(PolicyStore::new()))),
            settings,
        )
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{}", i)).collect()
    }

    #[test]
    fn create_game_persists_started_snapshot() {
        let mgr = manager(GameSettings {
            seed: Some(3),
            ..Default::default()
        });
        let id = mgr.create_game(0, &names(3)).unwrap();
        let game = mgr.get_game(&id).unwrap();
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.current_player_index(), 0);
        let actions = mgr.game_actions(&id).unwrap();
        assert_eq!(actions.len(), game.action_history().len());
    }

    #[test]
    fn rejected_calls_write_nothing() {
        let mgr = manager(GameSettings {
            seed: Some(4),
            ..Default::default()
        });
        let id = mgr.create_game(0, &names(3)).unwrap();
        let before = mgr.get_game(&id).unwrap();
        let err = mgr.play_card(&id, 1, 0).unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotYourTurn { .. })));
        let err = mgr.play_card(&id, 0, 42).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Game(GameError::CardIndexOutOfRange { .. })
        ));
        assert_eq!(mgr.get_game(&id).unwrap(), before);
    }

    #[test]
    fn rejections_are_logged_with_error_kind() {
        let mgr = manager(GameSettings {
            seed: Some(12),
            ..Default::default()
        });
        let id = mgr.create_game(0, &names(3)).unwrap();
        let logs = TestLogSubscriber::new();
        let registry = Registry::default().with(logs.clone().into_layer::<Registry>());

        tracing::subscriber::with_default(registry, || {
            assert!(mgr.end_turn(&id, 2).is_err());
        });

        let rejected = logs.matching("request rejected");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].field("error"), Some("not_your_turn"));
        assert_eq!(rejected[0].level, tracing::Level::INFO);
        let discarded = logs.matching("commit discarded");
        assert_eq!(discarded[0].field("game_id"), Some(id.as_str()));
    }

    #[test]
    fn unknown_game_is_not_found() {
        let mgr = manager(GameSettings::default());
        assert!(matches!(
            mgr.end_turn("nope", 0),
            Err(ServiceError::Game(GameError::GameNotFound(_)))
        ));
    }

    #[test]
    fn unknown_ids_do_not_leave_locks_behind() {
        let mgr = manager(GameSettings {
            seed: Some(9),
            ..Default::default()
        });
        for _ in 0..3 {
            assert!(mgr.draw_card("nope", 0, DefusePlacement::Random).is_err());
        }
        assert!(mgr.locks.lock().unwrap().is_empty());

        let id = mgr.create_game(0, &names(3)).unwrap();
        assert!(mgr.locks.lock().unwrap().contains_key(&id));
        mgr.end_game(&id, 1).unwrap();
        assert!(mgr.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn chain_limit_rejects_the_whole_commit() {
        let mgr = manager(GameSettings {
            seed: Some(10),
            max_chain_turns: 1,
            ..Default::default()
        });
        let id = mgr.create_game(0, &names(3)).unwrap();
        let before = mgr.get_game(&id).unwrap();
        let rows = mgr.game_actions(&id).unwrap().len();

        let err = mgr.draw_card(&id, 0, DefusePlacement::Random).unwrap_err();
        assert!(matches!(err, ServiceError::ChainLimit(1)));
        assert_eq!(mgr.get_game(&id).unwrap(), before);
        assert_eq!(mgr.game_actions(&id).unwrap().len(), rows);
    }

    /// Moves seat 0's defuse to the bottom of the deck and a bomb to the top.
    fn rig_explosion(mgr: &GameManager, id: &str) {
        let mut body = mgr.store.get(id).unwrap().unwrap().body;
        let hand = body["players"][0]["hand"].as_array_mut().unwrap();
        let pos = hand.iter().position(|c| c["isDefuse"] == true).unwrap();
        let defuse = hand.remove(pos);
        body["players"][0]["defuseCards"] = serde_json::json!(0);
        let deck = body["deck"].as_array_mut().unwrap();
        deck.push(defuse);
        let bomb = deck.iter().position(|c| c["isExploding"] == true).unwrap();
        let bomb = deck.remove(bomb);
        deck.insert(0, bomb);
        mgr.store.patch(id, body).unwrap();
    }

    #[test]
    fn human_explosion_runs_agents_in_same_commit() {
        let mgr = manager(GameSettings {
            seed: Some(11),
            ..Default::default()
        });
        let id = mgr.create_game(0, &names(3)).unwrap();
        rig_explosion(&mgr, &id);
        mgr.get_game(&id).unwrap().check_invariants().unwrap();
        let before = mgr.get_game(&id).unwrap().action_history().len();

        let outcome = mgr.draw_card(&id, 0, DefusePlacement::Random).unwrap();
        assert!(matches!(outcome, DrawOutcome::Exploded { winner: None, .. }));

        let game = mgr.get_game(&id).unwrap();
        assert!(!game.players()[0].is_alive());
        let kinds: Vec<(ActionType, usize)> = game.action_history()[before..]
            .iter()
            .take(5)
            .map(|e| (e.action_type, e.player_index))
            .collect();
        assert_eq!(kinds[0], (ActionType::Draw, 0));
        assert_eq!(kinds[1], (ActionType::Explode, 0));
        assert_eq!(kinds[2], (ActionType::TurnEnd, 0));
        assert_eq!(kinds[3], (ActionType::TurnStart, 1));
        assert_eq!(kinds[4].1, 1);

        // only agents remain, so the chain plays the game out
        assert_eq!(game.status(), GameStatus::Finished);
        assert_ne!(game.winner(), Some(0));
        let rows = mgr
            .store
            .query(&Query::new(PLAYER_ACTIONS).eq("gameId", id.as_str()))
            .unwrap();
        assert_eq!(rows.len(), game.action_history().len());
    }

    #[test]
    fn end_turn_returns_to_human_after_agents() {
        let mgr = manager(GameSettings {
            seed: Some(5),
            ..Default::default()
        });
        let id = mgr.create_game(0, &names(4)).unwrap();
        let next = mgr.end_turn(&id, 0).unwrap();
        let game = mgr.get_game(&id).unwrap();
        if game.status() == GameStatus::Playing {
            assert_eq!(next, 0);
            assert!(!game.is_agent_turn());
            assert!(game.round_number() >= 2);
        }
    }

    #[test]
    fn decisions_are_recorded_when_enabled() {
        let mgr = manager(GameSettings {
            seed: Some(6),
            record_decisions: true,
            ..Default::default()
        });
        let roster = vec![
            ("a".to_string(), AgentType::Random),
            ("b".to_string(), AgentType::Bayesian),
        ];
        let id = mgr.create_game_with_roster(roster).unwrap();
        assert_eq!(mgr.get_game(&id).unwrap().status(), GameStatus::Finished);
        let decisions = mgr.take_decisions();
        assert!(!decisions.is_empty());
        assert!(decisions.iter().all(|d| d.action < 8 && d.game_id == id));
        assert!(mgr.take_decisions().is_empty());
    }
}
