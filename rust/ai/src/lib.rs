//! # kittens-ai: Agent Decision Engine
//!
//! Chooses actions for the non-human seats of an Exploding Kittens game.
//! A snapshot is reduced to an encoded state by [`encoder`], and each agent
//! type maps that state to one of the eight [`AgentAction`]s.
//!
//! ## Core Components
//!
//! - [`Agent`] - Trait implemented by every strategy
//! - [`agents`] - Table-driven, uniform random and Bayesian strategies
//! - [`policy`] - Loading and sharing trained policy tables
//! - [`encoder`] - Snapshot to policy-index encoding
//! - [`DecisionEngine`] - One agent per type behind a shared policy store
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use kittens_ai::{policy::PolicyStore, DecisionEngine};
//! use kittens_engine::player::AgentType;
//! use kittens_engine::rules::AgentAction;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let engine = DecisionEngine::new(Arc::new(PolicyStore::new()));
//! let mut rng = ChaCha20Rng::seed_from_u64(7);
//!
//! // No table loaded: trained agents fall back to drawing
//! let action = engine.decide_action(AgentType::Qlearning, 4_317, &mut rng);
//! assert_eq!(action, Some(AgentAction::Draw));
//!
//! // Humans are never decided for
//! assert_eq!(engine.decide_action(AgentType::Human, 0, &mut rng), None);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use kittens_engine::game::Game;
use kittens_engine::player::AgentType;
use kittens_engine::rules::AgentAction;
use rand::RngCore;

pub mod agents;
pub mod encoder;
pub mod policy;

use policy::PolicyStore;

/// Interface every agent strategy implements.
///
/// # Example Implementation
///
/// ```rust
/// use kittens_ai::Agent;
/// use kittens_engine::rules::AgentAction;
/// use rand::RngCore;
///
/// struct AlwaysShuffle;
///
/// impl Agent for AlwaysShuffle {
///     fn decide(&self, _state: u32, _rng: &mut dyn RngCore) -> AgentAction {
///         AgentAction::PlayShuffle
///     }
///
///     fn name(&self) -> &str {
///         "always-shuffle"
///     }
/// }
/// ```
pub trait Agent: Send + Sync {
    /// Picks an action for an encoded state. Randomized strategies draw
    /// only from `rng`.
    fn decide(&self, state: u32, rng: &mut dyn RngCore) -> AgentAction;

    /// Identifier of the strategy.
    fn name(&self) -> &str;
}

/// Creates the strategy for an agent type, `None` for humans.
///
/// ```rust
/// use std::sync::Arc;
/// use kittens_ai::{create_agent, policy::PolicyStore};
/// use kittens_engine::player::AgentType;
///
/// let agent = create_agent(AgentType::Mle, Arc::new(PolicyStore::new())).unwrap();
/// assert_eq!(agent.name(), "mle");
/// assert!(create_agent(AgentType::Human, Arc::new(PolicyStore::new())).is_none());
/// ```
pub fn create_agent(agent_type: AgentType, policies: Arc<PolicyStore>) -> Option<Box<dyn Agent>> {
    match agent_type {
        AgentType::Human => None,
        AgentType::Qlearning | AgentType::Mle => {
            Some(Box::new(agents::PolicyAgent::new(agent_type, policies)))
        }
        AgentType::Random => Some(Box::new(agents::RandomAgent)),
        AgentType::Bayesian => Some(Box::new(agents::BayesianAgent)),
    }
}

/// An agent's choice together with the state it was made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: u32,
    pub action: AgentAction,
}

/// Holds one agent per non-human type. Cheap to share; holds no per-game
/// state.
pub struct DecisionEngine {
    policies: Arc<PolicyStore>,
    agents: HashMap<AgentType, Box<dyn Agent>>,
}

impl DecisionEngine {
    pub fn new(policies: Arc<PolicyStore>) -> Self {
        let agents = AgentType::seat_rotation()
            .into_iter()
            .filter_map(|t| create_agent(t, policies.clone()).map(|a| (t, a)))
            .collect();
        Self { policies, agents }
    }

    pub fn policies(&self) -> &Arc<PolicyStore> {
        &self.policies
    }

    /// Action for an agent type in an encoded state, `None` for humans.
    pub fn decide_action(
        &self,
        agent_type: AgentType,
        state: u32,
        rng: &mut dyn RngCore,
    ) -> Option<AgentAction> {
        self.agents.get(&agent_type).map(|a| a.decide(state, rng))
    }

    /// Encodes the snapshot for `player_index` and decides for that seat.
    pub fn decide_for(
        &self,
        game: &Game,
        player_index: usize,
        rng: &mut dyn RngCore,
    ) -> Option<Decision> {
        let player = game.player(player_index)?;
        let state = encoder::encode(game, player_index);
        let action = self.decide_action(player.agent_type, state, rng)?;
        Some(Decision { state, action })
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.agents.values().map(|a| a.name()).collect();
        names.sort_unstable();
        f.debug_struct("DecisionEngine").field("agents", &names).finish()
    }
}
