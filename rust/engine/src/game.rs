use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{Card, Effect, SequentialIds};
use crate::deck::{build_deck, build_pools, deal, insert_random, shuffle, DeckCatalog};
use crate::errors::GameError;
use crate::logger::{now_millis, ActionEntry, ActionType, GameStatsRecord};
use crate::player::{AgentType, Player};

/// Largest table the game supports
pub const MAX_PLAYERS: usize = 5;
/// Regular cards dealt to every player at the start
pub const HAND_SIZE: usize = 7;
/// Spare defuses shuffled back into the deck after dealing
const EXTRA_DEFUSES_IN_DECK: usize = 2;
/// Cards revealed by a See Future effect
const SEE_FUTURE_DEPTH: usize = 3;
/// Draws owed by the seat after an attack
const ATTACK_DRAWS: u32 = 2;

/// Lifecycle of a game document. `Finished` is terminal.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Setup,
    Playing,
    Finished,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Setup => "setup",
            GameStatus::Playing => "playing",
            GameStatus::Finished => "finished",
        }
    }
}

/// Table-level constants a game is created with.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRules {
    pub max_players: usize,
    pub hand_size: usize,
    pub catalog: DeckCatalog,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            hand_size: HAND_SIZE,
            catalog: DeckCatalog::default(),
        }
    }
}

/// Where a defused exploding kitten goes back into the deck.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DefusePlacement {
    /// Uniformly random position (agents)
    Random,
    /// Explicit position counted from the head, clamped to the deck length
    At(usize),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DrawOutcome {
    /// A regular card went into the hand
    Drew { card_id: String },
    /// An exploding kitten was drawn and defused
    Defused { card_id: String, position: usize },
    /// An exploding kitten eliminated the player
    Exploded {
        card_id: String,
        winner: Option<usize>,
    },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PlayOutcome {
    pub card: Card,
    pub effect: Option<Effect>,
    /// Card ids revealed from the head of the deck (See Future)
    pub peek: Vec<String>,
    pub target_player: Option<usize>,
}

/// The authoritative document for one match.
///
/// Every mutation validates game status and turn ownership before touching
/// any state, so a rejected call leaves the document exactly as it was.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    status: GameStatus,
    current_player_index: usize,
    round_number: u32,
    round_anchor: usize,
    /// Draws the current seat still has to take before the turn passes
    draws_owed: u32,
    human_player_index: Option<usize>,
    max_players: usize,
    hand_size: usize,
    seed: u64,
    players: Vec<Player>,
    deck: Vec<Card>,
    discard_pile: Vec<Card>,
    bomb_pool: Vec<Card>,
    defuse_pool: Vec<Card>,
    action_history: Vec<ActionEntry>,
    elimination_order: Vec<usize>,
    initial_card_count: usize,
    winner: Option<usize>,
    standings: Vec<GameStatsRecord>,
    created_at: i64,
    updated_at: i64,
}

impl Game {
    /// Creates a game with one human seat; the remaining seats are filled
    /// with agents in the fixed rotation bayesian, qlearning, mle, random.
    pub fn create(
        human_player_index: usize,
        player_names: &[String],
        rules: GameRules,
        seed: u64,
    ) -> Result<Self, GameError> {
        if player_names.is_empty() {
            return Err(GameError::InvalidRoster("player names are empty".into()));
        }
        if human_player_index >= player_names.len() {
            return Err(GameError::InvalidRoster(format!(
                "human player index {} out of range for {} players",
                human_player_index,
                player_names.len()
            )));
        }
        let mut agents = AgentType::seat_rotation().into_iter().cycle();
        let roster = player_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let agent_type = if idx == human_player_index {
                    AgentType::Human
                } else {
                    agents.next().unwrap_or(AgentType::Random)
                };
                (name.clone(), agent_type)
            })
            .collect();
        Self::with_roster(roster, rules, seed)
    }

    /// Creates a game from an explicit roster. At most one seat may be human.
    pub fn with_roster(
        roster: Vec<(String, AgentType)>,
        rules: GameRules,
        seed: u64,
    ) -> Result<Self, GameError> {
        if roster.len() < 2 || roster.len() > rules.max_players {
            return Err(GameError::InvalidRoster(format!(
                "expected 2..={} players, got {}",
                rules.max_players,
                roster.len()
            )));
        }
        if roster.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err(GameError::InvalidRoster("player names are empty".into()));
        }
        let humans: Vec<usize> = roster
            .iter()
            .enumerate()
            .filter(|(_, (_, t))| *t == AgentType::Human)
            .map(|(i, _)| i)
            .collect();
        if humans.len() > 1 {
            return Err(GameError::InvalidRoster(
                "at most one human player is supported".into(),
            ));
        }

        let mut ids = SequentialIds::new("card");
        let deck = build_deck(&rules.catalog, &mut ids);
        let (bomb_pool, defuse_pool) = build_pools(&rules.catalog, &mut ids);
        let players = roster
            .into_iter()
            .enumerate()
            .map(|(idx, (name, agent_type))| Player::new(idx, name, agent_type))
            .collect();
        let now = now_millis();
        Ok(Self {
            status: GameStatus::Setup,
            current_player_index: 0,
            round_number: 1,
            round_anchor: 0,
            draws_owed: 1,
            human_player_index: humans.first().copied(),
            max_players: rules.max_players,
            hand_size: rules.hand_size,
            seed,
            players,
            deck,
            discard_pile: Vec::new(),
            bomb_pool,
            defuse_pool,
            action_history: Vec::new(),
            elimination_order: Vec::new(),
            initial_card_count: rules.catalog.total_cards(),
            winner: None,
            standings: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }
    pub fn current_player_index(&self) -> usize {
        self.current_player_index
    }
    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_index]
    }
    pub fn round_number(&self) -> u32 {
        self.round_number
    }
    pub fn draws_owed(&self) -> u32 {
        self.draws_owed
    }
    pub fn human_player_index(&self) -> Option<usize> {
        self.human_player_index
    }
    pub fn max_players(&self) -> usize {
        self.max_players
    }
    pub fn seed(&self) -> u64 {
        self.seed
    }
    pub fn players(&self) -> &[Player] {
        &self.players
    }
    pub fn player(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }
    pub fn deck(&self) -> &[Card] {
        &self.deck
    }
    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }
    pub fn bomb_pool(&self) -> &[Card] {
        &self.bomb_pool
    }
    pub fn defuse_pool(&self) -> &[Card] {
        &self.defuse_pool
    }
    pub fn action_history(&self) -> &[ActionEntry] {
        &self.action_history
    }
    pub fn winner(&self) -> Option<usize> {
        self.winner
    }
    pub fn standings(&self) -> &[GameStatsRecord] {
        &self.standings
    }
    pub fn initial_card_count(&self) -> usize {
        self.initial_card_count
    }
    pub fn created_at(&self) -> i64 {
        self.created_at
    }
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive()).count()
    }

    /// Cards currently accounted for across every pile and hand.
    pub fn card_count(&self) -> usize {
        self.deck.len()
            + self.discard_pile.len()
            + self.bomb_pool.len()
            + self.defuse_pool.len()
            + self.players.iter().map(|p| p.hand().len()).sum::<usize>()
    }

    /// True when the game is running and the seat to act is an agent.
    pub fn is_agent_turn(&self) -> bool {
        self.status == GameStatus::Playing && self.current_player().agent_type.is_agent()
    }

    /// `setup -> playing`: shuffles, deals hands plus one defuse per player,
    /// and seeds the deck with spare defuses and `players - 1` bombs.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        match self.status {
            GameStatus::Setup => {}
            GameStatus::Playing => return Err(GameError::GameNotActive),
            GameStatus::Finished => return Err(GameError::GameAlreadyFinished),
        }

        let needed = self.hand_size * self.players.len();
        if self.deck.len() < needed {
            return Err(GameError::InsufficientCards {
                needed,
                available: self.deck.len(),
            });
        }

        let mut deck = std::mem::take(&mut self.deck);
        shuffle(&mut deck, rng);
        let (hands, mut deck) = deal(deck, self.players.len(), self.hand_size)?;

        for (player, hand) in self.players.iter_mut().zip(hands) {
            for card in hand {
                player.give_card(card);
            }
            if let Some(defuse) = self.defuse_pool.pop() {
                player.give_card(defuse);
            }
        }

        let extras = EXTRA_DEFUSES_IN_DECK.min(self.defuse_pool.len());
        for _ in 0..extras {
            if let Some(defuse) = self.defuse_pool.pop() {
                insert_random(&mut deck, defuse, rng);
            }
        }

        let bombs = self.bomb_pool.len().min(self.players.len() - 1);
        for _ in 0..bombs {
            if let Some(bomb) = self.bomb_pool.pop() {
                insert_random(&mut deck, bomb, rng);
            }
        }

        self.deck = deck;
        self.status = GameStatus::Playing;
        self.current_player_index = self.human_player_index.unwrap_or(0);
        self.round_anchor = self.current_player_index;
        self.round_number = 1;
        self.draws_owed = 1;
        let first = self.current_player_index;
        self.push(ActionEntry::new(
            ActionType::TurnStart,
            first,
            format!("{} starts round 1", self.players[first].name),
        ));
        Ok(())
    }

    /// Plays the card at `card_index` from the acting player's hand onto the
    /// discard pile and resolves its effect.
    ///
    /// Skip settles one owed draw, ending the turn when none are left.
    /// Attack ends the turn at once and the next seat owes two draws. Every
    /// other card leaves the turn with the player.
    pub fn play_card<R: Rng + ?Sized>(
        &mut self,
        player_index: usize,
        card_index: usize,
        rng: &mut R,
    ) -> Result<PlayOutcome, GameError> {
        self.ensure_turn(player_index)?;
        let hand_size = self.players[player_index].hand().len();
        let card = self.players[player_index]
            .take_card(card_index)
            .ok_or(GameError::CardIndexOutOfRange {
                index: card_index,
                hand_size,
            })?;

        let effect = card.effect_kind();
        let mut peek = Vec::new();
        let mut target_player = None;
        match effect {
            Some(Effect::Shuffle) => shuffle(&mut self.deck, rng),
            Some(Effect::SeeFuture) => {
                peek = self
                    .deck
                    .iter()
                    .take(SEE_FUTURE_DEPTH)
                    .map(|c| c.card_id.clone())
                    .collect();
            }
            Some(Effect::Attack) | Some(Effect::Target) => {
                target_player = self.next_alive_after(player_index);
            }
            _ => {}
        }

        let player = &mut self.players[player_index];
        player.stats.cards_played += 1;
        let mut entry = ActionEntry::new(
            ActionType::Play,
            player_index,
            format!("{} played {} ({})", player.name, card.kind.name(), card.effect),
        )
        .with_card(&card.card_id, card.kind.name());
        if let Some(target) = target_player {
            entry = entry.with_target(target);
        }
        self.discard_pile.insert(0, card.clone());
        self.push(entry);

        match effect {
            Some(Effect::Skip) => self.settle_draw(player_index, "skipped the draw"),
            Some(Effect::Attack) => self.pass_turn(player_index, ATTACK_DRAWS, "attacked"),
            _ => {}
        }

        Ok(PlayOutcome {
            card,
            effect,
            peek,
            target_player,
        })
    }

    /// Draws the head of the deck into the acting player's hand and resolves
    /// an exploding kitten if one comes up.
    ///
    /// A draw that leaves the player alive settles one owed draw; the turn
    /// passes to the next seat once none are left.
    pub fn draw_card<R: Rng + ?Sized>(
        &mut self,
        player_index: usize,
        placement: DefusePlacement,
        rng: &mut R,
    ) -> Result<DrawOutcome, GameError> {
        self.ensure_turn(player_index)?;
        if self.deck.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        let card = self.deck.remove(0);
        let card_id = card.card_id.clone();

        let player = &mut self.players[player_index];
        player.stats.cards_drawn += 1;
        player.set_drawn_this_turn(true);
        let name = player.name.clone();
        self.push(
            ActionEntry::new(ActionType::Draw, player_index, format!("{} drew a card", name))
                .with_card(&card.card_id, card.kind.name()),
        );

        if !card.is_exploding {
            self.players[player_index].give_card(card);
            self.settle_draw(player_index, "ended the turn");
            return Ok(DrawOutcome::Drew { card_id });
        }

        if let Some(defuse) = self.players[player_index].take_defuse() {
            self.discard_pile.insert(0, defuse);
            let position = match placement {
                DefusePlacement::Random => insert_random(&mut self.deck, card, rng),
                DefusePlacement::At(pos) => {
                    let pos = pos.min(self.deck.len());
                    self.deck.insert(pos, card);
                    pos
                }
            };
            self.push(
                ActionEntry::new(
                    ActionType::Defuse,
                    player_index,
                    format!("{} defused an exploding kitten", name),
                )
                .with_card(&card_id, "Bomb"),
            );
            self.settle_draw(player_index, "ended the turn");
            return Ok(DrawOutcome::Defused { card_id, position });
        }

        let player = &mut self.players[player_index];
        player.eliminate();
        player.stats.explosions += 1;
        self.discard_pile.insert(0, card);
        self.elimination_order.push(player_index);
        self.push(
            ActionEntry::new(
                ActionType::Explode,
                player_index,
                format!("{} exploded", name),
            )
            .with_card(&card_id, "Bomb"),
        );
        self.push(ActionEntry::new(
            ActionType::TurnEnd,
            player_index,
            format!("{} is out", name),
        ));

        if self.alive_count() <= 1 {
            let winner = self.players.iter().position(|p| p.is_alive());
            self.finish(winner);
            return Ok(DrawOutcome::Exploded { card_id, winner });
        }
        self.advance_turn();
        self.push_turn_start();
        Ok(DrawOutcome::Exploded {
            card_id,
            winner: None,
        })
    }

    /// Passes the turn to the next alive player without drawing and returns
    /// their index. Draws still owed are forfeited.
    pub fn end_turn(&mut self, player_index: usize) -> Result<usize, GameError> {
        self.ensure_turn(player_index)?;
        self.pass_turn(player_index, 1, "ended the turn");
        Ok(self.current_player_index)
    }

    /// Administrative end of the game naming the winner. Returns the final
    /// standings, one record per player.
    pub fn end_game(&mut self, winner_index: usize) -> Result<Vec<GameStatsRecord>, GameError> {
        match self.status {
            GameStatus::Finished => return Err(GameError::GameAlreadyFinished),
            GameStatus::Setup => return Err(GameError::GameNotActive),
            GameStatus::Playing => {}
        }
        if winner_index >= self.players.len() {
            return Err(GameError::InvalidRoster(format!(
                "winner index {} out of range",
                winner_index
            )));
        }
        self.finish(Some(winner_index));
        Ok(self.standings.clone())
    }

    /// Ends a game whose deck ran dry with no winner.
    pub fn end_exhausted(&mut self) -> Result<(), GameError> {
        if self.status != GameStatus::Playing {
            return Err(GameError::GameNotActive);
        }
        if !self.deck.is_empty() {
            return Err(GameError::InvariantViolation(
                "deck exhaustion declared with cards left".into(),
            ));
        }
        self.finish(None);
        Ok(())
    }

    /// Verifies card conservation and per-player defuse bookkeeping.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        let count = self.card_count();
        if count != self.initial_card_count {
            return Err(GameError::InvariantViolation(format!(
                "card count {} differs from initial {}",
                count, self.initial_card_count
            )));
        }
        for p in &self.players {
            let in_hand = p.hand().iter().filter(|c| c.is_defuse).count() as u32;
            if in_hand != p.defuse_cards() {
                return Err(GameError::InvariantViolation(format!(
                    "player {} defuse counter {} but {} in hand",
                    p.index,
                    p.defuse_cards(),
                    in_hand
                )));
            }
        }
        if self.status == GameStatus::Playing && !self.current_player().is_alive() {
            return Err(GameError::InvariantViolation(format!(
                "current player {} is eliminated",
                self.current_player_index
            )));
        }
        Ok(())
    }

    fn ensure_turn(&self, player_index: usize) -> Result<(), GameError> {
        if self.status != GameStatus::Playing {
            return Err(GameError::GameNotActive);
        }
        if player_index != self.current_player_index {
            return Err(GameError::NotYourTurn {
                expected: self.current_player_index,
                actual: player_index,
            });
        }
        Ok(())
    }

    fn next_alive_after(&self, index: usize) -> Option<usize> {
        let n = self.players.len();
        (1..n)
            .map(|step| (index + step) % n)
            .find(|&i| self.players[i].is_alive())
    }

    // Walks forward from the current seat; passing the round anchor on the
    // way (dead or alive) closes the round.
    fn advance_turn(&mut self) {
        let n = self.players.len();
        let mut idx = self.current_player_index;
        let mut wrapped = false;
        for _ in 0..n {
            idx = (idx + 1) % n;
            if idx == self.round_anchor {
                wrapped = true;
            }
            if self.players[idx].is_alive() {
                break;
            }
        }
        if wrapped {
            self.round_number += 1;
        }
        self.current_player_index = idx;
        self.draws_owed = 1;
        self.players[idx].set_drawn_this_turn(false);
    }

    fn settle_draw(&mut self, player_index: usize, verb: &str) {
        self.draws_owed = self.draws_owed.saturating_sub(1);
        if self.draws_owed == 0 {
            self.pass_turn(player_index, 1, verb);
        }
    }

    fn pass_turn(&mut self, player_index: usize, next_owes: u32, verb: &str) {
        let name = self.players[player_index].name.clone();
        self.players[player_index].set_drawn_this_turn(false);
        self.push(ActionEntry::new(
            ActionType::TurnEnd,
            player_index,
            format!("{} {}", name, verb),
        ));
        self.advance_turn();
        self.draws_owed = next_owes;
        self.push_turn_start();
    }

    fn push_turn_start(&mut self) {
        let idx = self.current_player_index;
        let description = format!(
            "{}'s turn (round {})",
            self.players[idx].name, self.round_number
        );
        self.push(ActionEntry::new(ActionType::TurnStart, idx, description));
    }

    fn push(&mut self, entry: ActionEntry) {
        self.updated_at = entry.timestamp.max(self.updated_at);
        self.action_history.push(entry);
    }

    fn finish(&mut self, winner: Option<usize>) {
        self.status = GameStatus::Finished;
        self.winner = winner;
        if let Some(w) = winner {
            self.players[w].stats.wins += 1;
        }
        let mut order: Vec<usize> = winner.into_iter().collect();
        order.extend(
            self.players
                .iter()
                .filter(|p| p.is_alive() && Some(p.index) != winner)
                .map(|p| p.index),
        );
        order.extend(
            self.elimination_order
                .iter()
                .rev()
                .filter(|i| Some(**i) != winner),
        );

        let ended_at = now_millis();
        self.standings = order
            .iter()
            .enumerate()
            .map(|(rank, &idx)| {
                let p = &self.players[idx];
                let defuses_used = self
                    .action_history
                    .iter()
                    .filter(|e| e.action_type == ActionType::Defuse && e.player_index == idx)
                    .count() as u32;
                GameStatsRecord {
                    game_id: None,
                    player_index: idx,
                    player_type: p.agent_type,
                    final_position: rank + 1,
                    cards_drawn_total: p.stats.cards_drawn,
                    cards_played_total: p.stats.cards_played,
                    explosions_caused: p.stats.explosions,
                    defuses_used,
                    game_duration: ended_at - self.created_at,
                    win: Some(idx) == winner,
                }
            })
            .collect();
        self.updated_at = ended_at.max(self.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{}", i)).collect()
    }

    fn started(n: usize, seed: u64) -> (Game, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut game = Game::create(0, &names(n), GameRules::default(), seed).unwrap();
        game.start(&mut rng).unwrap();
        (game, rng)
    }

    #[test]
    fn create_assigns_agent_rotation_around_human() {
        let game = Game::create(2, &names(5), GameRules::default(), 1).unwrap();
        let types: Vec<AgentType> = game.players().iter().map(|p| p.agent_type).collect();
        assert_eq!(
            types,
            vec![
                AgentType::Bayesian,
                AgentType::Qlearning,
                AgentType::Human,
                AgentType::Mle,
                AgentType::Random
            ]
        );
        assert_eq!(game.status(), GameStatus::Setup);
        assert_eq!(game.card_count(), game.initial_card_count());
    }

    #[test]
    fn create_rejects_bad_rosters() {
        let rules = GameRules::default();
        assert!(matches!(
            Game::create(0, &[], rules, 1),
            Err(GameError::InvalidRoster(_))
        ));
        assert!(matches!(
            Game::create(3, &names(3), rules, 1),
            Err(GameError::InvalidRoster(_))
        ));
        assert!(matches!(
            Game::create(0, &names(6), rules, 1),
            Err(GameError::InvalidRoster(_))
        ));
        let blank = vec!["A".to_string(), "  ".to_string()];
        assert!(matches!(
            Game::create(0, &blank, rules, 1),
            Err(GameError::InvalidRoster(_))
        ));
    }

    #[test]
    fn start_deals_hands_defuses_and_bombs() {
        let (game, _) = started(5, 3);
        assert_eq!(game.status(), GameStatus::Playing);
        for p in game.players() {
            assert_eq!(p.hand().len(), 8);
            assert_eq!(p.defuse_cards(), 1);
        }
        let bombs = game.deck().iter().filter(|c| c.is_exploding).count();
        assert_eq!(bombs, 4);
        // 64 - 35 dealt + 1 spare defuse + 4 bombs
        assert_eq!(game.deck().len(), 34);
        assert_eq!(game.action_history()[0].action_type, ActionType::TurnStart);
        game.check_invariants().unwrap();
    }

    /// Puts a card of `kind` into a seat's hand, pulling it from the deck
    /// when the hand has none, and returns its hand index.
    fn holding(game: &mut Game, seat: usize, kind: CardKind) -> usize {
        if let Some(idx) = game.players[seat].hand().iter().position(|c| c.kind == kind) {
            return idx;
        }
        let pos = game.deck.iter().position(|c| c.kind == kind).unwrap();
        let card = game.deck.remove(pos);
        game.players[seat].give_card(card);
        game.players[seat]
            .hand()
            .iter()
            .position(|c| c.kind == kind)
            .unwrap()
    }

    #[test]
    fn play_card_moves_card_to_top_of_discard() {
        let (mut game, mut rng) = started(3, 4);
        let idx = holding(&mut game, 0, CardKind::Dog);
        let card_id = game.players()[0].hand()[idx].card_id.clone();
        let outcome = game.play_card(0, idx, &mut rng).unwrap();
        assert_eq!(outcome.card.card_id, card_id);
        assert_eq!(game.discard_pile()[0].card_id, card_id);
        assert_eq!(game.players()[0].stats.cards_played, 1);
        assert_eq!(game.current_player_index(), 0);
        assert_eq!(
            game.action_history().last().unwrap().action_type,
            ActionType::Play
        );
    }

    #[test]
    fn skip_ends_the_turn_without_drawing() {
        let (mut game, mut rng) = started(3, 13);
        let idx = holding(&mut game, 0, CardKind::Beer);
        let deck_len = game.deck().len();
        let outcome = game.play_card(0, idx, &mut rng).unwrap();
        assert_eq!(outcome.effect, Some(Effect::Skip));
        assert_eq!(game.deck().len(), deck_len);
        assert_eq!(game.current_player_index(), 1);
        assert_eq!(game.draws_owed(), 1);
        let kinds: Vec<ActionType> = game
            .action_history()
            .iter()
            .rev()
            .take(3)
            .map(|e| e.action_type)
            .collect();
        assert_eq!(
            kinds,
            vec![ActionType::TurnStart, ActionType::TurnEnd, ActionType::Play]
        );
        game.check_invariants().unwrap();
    }

    #[test]
    fn attack_makes_the_next_seat_draw_twice() {
        let (mut game, mut rng) = started(3, 14);
        let idx = holding(&mut game, 0, CardKind::Laser);
        let outcome = game.play_card(0, idx, &mut rng).unwrap();
        assert_eq!(outcome.effect, Some(Effect::Attack));
        assert_eq!(outcome.target_player, Some(1));
        assert_eq!(game.current_player_index(), 1);
        assert_eq!(game.draws_owed(), 2);
        let play = game
            .action_history()
            .iter()
            .rev()
            .find(|e| e.action_type == ActionType::Play)
            .unwrap();
        assert_eq!(play.target_player, Some(1));

        // keep bombs out of the way of the two owed draws
        game.deck.sort_by_key(|c| c.is_exploding);
        game.draw_card(1, DefusePlacement::Random, &mut rng).unwrap();
        assert_eq!(game.current_player_index(), 1);
        assert_eq!(game.draws_owed(), 1);
        assert!(game.players()[1].has_drawn_this_turn());
        game.draw_card(1, DefusePlacement::Random, &mut rng).unwrap();
        assert!(!game.players()[1].has_drawn_this_turn());
        assert_eq!(game.current_player_index(), 2);
        assert_eq!(game.draws_owed(), 1);
        game.check_invariants().unwrap();
    }

    #[test]
    fn skip_under_attack_settles_one_draw() {
        let (mut game, mut rng) = started(3, 15);
        let idx = holding(&mut game, 0, CardKind::Laser);
        game.play_card(0, idx, &mut rng).unwrap();
        assert_eq!(game.draws_owed(), 2);

        let idx = holding(&mut game, 1, CardKind::Sleep);
        game.play_card(1, idx, &mut rng).unwrap();
        assert_eq!(game.current_player_index(), 1);
        assert_eq!(game.draws_owed(), 1);
        let idx = holding(&mut game, 1, CardKind::Beer);
        game.play_card(1, idx, &mut rng).unwrap();
        assert_eq!(game.current_player_index(), 2);
        game.check_invariants().unwrap();
    }

    #[test]
    fn target_records_next_alive_player() {
        let (mut game, mut rng) = started(4, 16);
        game.players[1].eliminate();
        let idx = holding(&mut game, 0, CardKind::Time);
        let outcome = game.play_card(0, idx, &mut rng).unwrap();
        assert_eq!(outcome.effect, Some(Effect::Target));
        assert_eq!(outcome.target_player, Some(2));
        assert_eq!(game.current_player_index(), 0);
        assert_eq!(
            game.action_history().last().unwrap().target_player,
            Some(2)
        );
    }

    #[test]
    fn see_future_reveals_top_three() {
        let (mut game, mut rng) = started(3, 17);
        let idx = holding(&mut game, 0, CardKind::Cat);
        let top: Vec<String> = game.deck()[..3].iter().map(|c| c.card_id.clone()).collect();
        let outcome = game.play_card(0, idx, &mut rng).unwrap();
        assert_eq!(outcome.effect, Some(Effect::SeeFuture));
        assert_eq!(outcome.peek, top);
        assert_eq!(game.current_player_index(), 0);
    }

    #[test]
    fn shuffle_reorders_the_deck_in_place() {
        let (mut game, mut rng) = started(3, 18);
        let idx = holding(&mut game, 0, CardKind::Taco);
        let ids = |g: &Game| g.deck().iter().map(|c| c.card_id.clone()).collect::<Vec<_>>();
        let before = ids(&game);
        game.play_card(0, idx, &mut rng).unwrap();
        let after = ids(&game);
        assert_ne!(after, before);
        let mut a = after.clone();
        let mut b = before.clone();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(game.current_player_index(), 0);
    }

    #[test]
    fn play_card_rejects_bad_index_without_change() {
        let (mut game, mut rng) = started(3, 5);
        let before = game.clone();
        let err = game.play_card(0, 99, &mut rng).unwrap_err();
        assert_eq!(
            err,
            GameError::CardIndexOutOfRange {
                index: 99,
                hand_size: 8
            }
        );
        assert_eq!(game, before);
    }

    #[test]
    fn out_of_turn_calls_are_rejected() {
        let (mut game, mut rng) = started(3, 6);
        let before = game.clone();
        assert!(matches!(
            game.draw_card(1, DefusePlacement::Random, &mut rng),
            Err(GameError::NotYourTurn {
                expected: 0,
                actual: 1
            })
        ));
        assert!(matches!(game.end_turn(2), Err(GameError::NotYourTurn { .. })));
        assert!(matches!(
            game.play_card(1, 0, &mut rng),
            Err(GameError::NotYourTurn { .. })
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn drawing_a_bomb_with_defuse_reinserts_it() {
        let (mut game, mut rng) = started(3, 7);
        let bomb_pos = game.deck().iter().position(|c| c.is_exploding).unwrap();
        game.deck.rotate_left(bomb_pos);
        let outcome = game
            .draw_card(0, DefusePlacement::At(2), &mut rng)
            .unwrap();
        assert!(matches!(outcome, DrawOutcome::Defused { position: 2, .. }));
        assert!(game.deck()[2].is_exploding);
        assert_eq!(game.players()[0].defuse_cards(), 0);
        assert_eq!(game.discard_pile()[0].kind, CardKind::Defuse);
        assert!(game.players()[0].is_alive());
        game.check_invariants().unwrap();
    }

    #[test]
    fn drawing_a_bomb_without_defuse_eliminates() {
        let (mut game, mut rng) = started(3, 8);
        let defuse_idx = game.players()[0]
            .hand()
            .iter()
            .position(|c| c.is_defuse)
            .unwrap();
        game.play_card(0, defuse_idx, &mut rng).unwrap();
        let bomb_pos = game.deck().iter().position(|c| c.is_exploding).unwrap();
        game.deck.rotate_left(bomb_pos);

        let outcome = game
            .draw_card(0, DefusePlacement::Random, &mut rng)
            .unwrap();
        assert!(matches!(outcome, DrawOutcome::Exploded { winner: None, .. }));
        assert!(!game.players()[0].is_alive());
        assert_eq!(game.players()[0].stats.explosions, 1);
        assert_eq!(game.current_player_index(), 1);
        let kinds: Vec<ActionType> = game
            .action_history()
            .iter()
            .rev()
            .take(3)
            .map(|e| e.action_type)
            .collect();
        assert_eq!(
            kinds,
            vec![ActionType::TurnStart, ActionType::TurnEnd, ActionType::Explode]
        );
        game.check_invariants().unwrap();
    }

    #[test]
    fn end_turn_skips_eliminated_and_counts_rounds() {
        let (mut game, _) = started(3, 9);
        game.players[1].eliminate();
        assert_eq!(game.end_turn(0).unwrap(), 2);
        assert_eq!(game.round_number(), 1);
        assert_eq!(game.end_turn(2).unwrap(), 0);
        assert_eq!(game.round_number(), 2);
    }

    #[test]
    fn end_game_is_guarded_against_repeats() {
        let (mut game, _) = started(4, 10);
        let standings = game.end_game(2).unwrap();
        assert_eq!(standings.len(), 4);
        assert_eq!(standings[0].player_index, 2);
        assert!(standings[0].win);
        assert_eq!(game.players()[2].stats.wins, 1);
        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.end_game(2), Err(GameError::GameAlreadyFinished));
    }

    #[test]
    fn game_document_serializes_camel_case() {
        let (game, _) = started(2, 11);
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["status"], "playing");
        assert_eq!(json["currentPlayerIndex"], 0);
        assert!(json["discardPile"].as_array().unwrap().is_empty());
        assert_eq!(json["players"][0]["agentType"], "human");
        let back: Game = serde_json::from_value(json).unwrap();
        assert_eq!(back, game);
    }
}
