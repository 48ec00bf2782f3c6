//! Bounded integer summary of a game snapshot, used as the row index into
//! trained policy tables.
//!
//! The layout is fixed by the tables already trained against it:
//!
//! | digit | feature | cap |
//! |---|---|---|
//! | ones | cards in hand | 7 |
//! | tens | defuse cards | 5 |
//! | hundreds | deck size / 10 | 3 |
//! | thousands | alive players - 1 | - |
//! | ten-thousands | agent type code | - |
//!
//! Different snapshots can share an index. That loss is accepted.

use kittens_engine::game::Game;
use kittens_engine::player::AgentType;

/// Exclusive upper bound of every encoded state.
pub const STATE_SPACE: u32 = 100_000;

const HAND_CAP: usize = 7;
const DEFUSE_CAP: u32 = 5;
const DECK_CAP: usize = 30;

/// Numeric code the encoder assigns to each agent type.
pub fn type_code(agent_type: AgentType) -> u32 {
    match agent_type {
        AgentType::Human => 0,
        AgentType::Qlearning => 1,
        AgentType::Mle => 2,
        AgentType::Bayesian => 3,
        AgentType::Random => 4,
    }
}

/// Encodes the view of `player_index` into `0..STATE_SPACE`.
/// An unknown player index encodes to 0.
pub fn encode(game: &Game, player_index: usize) -> u32 {
    let Some(player) = game.player(player_index) else {
        return 0;
    };
    let hand = player.hand().len().min(HAND_CAP) as u32;
    let defuse = player.defuse_cards().min(DEFUSE_CAP);
    let deck = (game.deck().len().min(DECK_CAP) / 10) as u32;
    let alive = (game.alive_count() as u32).saturating_sub(1);

    let raw = hand + defuse * 10 + deck * 100 + alive * 1_000 + type_code(player.agent_type) * 10_000;
    raw % STATE_SPACE
}
