use crate::cards::{Card, CardKind};
use serde::{Deserialize, Serialize};

/// Who controls a seat. Everything except `Human` is driven by the agent
/// decision engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Human,
    Bayesian,
    Qlearning,
    Mle,
    Random,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::Human => "human",
            AgentType::Bayesian => "bayesian",
            AgentType::Qlearning => "qlearning",
            AgentType::Mle => "mle",
            AgentType::Random => "random",
        }
    }

    pub fn parse(s: &str) -> Option<AgentType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Some(AgentType::Human),
            "bayesian" => Some(AgentType::Bayesian),
            "qlearning" | "q-learning" => Some(AgentType::Qlearning),
            "mle" => Some(AgentType::Mle),
            "random" => Some(AgentType::Random),
            _ => None,
        }
    }

    pub fn is_agent(self) -> bool {
        self != AgentType::Human
    }

    /// Agent seats in the order they are filled around a human player.
    pub fn seat_rotation() -> [AgentType; 4] {
        [
            AgentType::Bayesian,
            AgentType::Qlearning,
            AgentType::Mle,
            AgentType::Random,
        ]
    }
}

/// Per-player counters kept for the whole game.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub cards_drawn: u32,
    pub cards_played: u32,
    pub explosions: u32,
    pub wins: u32,
}

/// A seat at the table together with its hand.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub index: usize,
    pub name: String,
    pub agent_type: AgentType,
    hand: Vec<Card>,
    defuse_cards: u32,
    is_alive: bool,
    has_drawn_this_turn: bool,
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(index: usize, name: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            index,
            name: name.into(),
            agent_type,
            hand: Vec::new(),
            defuse_cards: 0,
            is_alive: true,
            has_drawn_this_turn: false,
            stats: PlayerStats::default(),
        }
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn defuse_cards(&self) -> u32 {
        self.defuse_cards
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn is_human(&self) -> bool {
        self.agent_type == AgentType::Human
    }

    pub fn has_drawn_this_turn(&self) -> bool {
        self.has_drawn_this_turn
    }

    pub(crate) fn set_drawn_this_turn(&mut self, drawn: bool) {
        self.has_drawn_this_turn = drawn;
    }

    pub(crate) fn give_card(&mut self, card: Card) {
        if card.kind == CardKind::Defuse {
            self.defuse_cards += 1;
        }
        self.hand.push(card);
    }

    pub(crate) fn take_card(&mut self, index: usize) -> Option<Card> {
        if index >= self.hand.len() {
            return None;
        }
        let card = self.hand.remove(index);
        if card.kind == CardKind::Defuse {
            self.defuse_cards -= 1;
        }
        Some(card)
    }

    /// Removes one defuse card from the hand, if any.
    pub(crate) fn take_defuse(&mut self) -> Option<Card> {
        let idx = self.hand.iter().position(|c| c.kind == CardKind::Defuse)?;
        self.take_card(idx)
    }

    /// One-way transition; there is no way back to alive.
    pub(crate) fn eliminate(&mut self) {
        self.is_alive = false;
        self.has_drawn_this_turn = false;
    }
}
