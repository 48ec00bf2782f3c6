//! Built-in agent strategies.

use std::sync::Arc;

use kittens_engine::player::AgentType;
use kittens_engine::rules::{ACTION_COUNT, AgentAction};
use rand::{Rng, RngCore};

use crate::Agent;
use crate::policy::PolicyStore;

/// Looks the encoded state up in a trained table and draws when the table
/// has no row for it.
#[derive(Debug, Clone)]
pub struct PolicyAgent {
    agent_type: AgentType,
    policies: Arc<PolicyStore>,
}

impl PolicyAgent {
    pub fn new(agent_type: AgentType, policies: Arc<PolicyStore>) -> Self {
        Self {
            agent_type,
            policies,
        }
    }
}

impl Agent for PolicyAgent {
    fn decide(&self, state: u32, _rng: &mut dyn RngCore) -> AgentAction {
        self.policies
            .lookup(self.agent_type, state)
            .unwrap_or(AgentAction::Draw)
    }

    fn name(&self) -> &str {
        self.agent_type.as_str()
    }
}

/// Uniform over all eight actions.
#[derive(Debug, Clone, Default)]
pub struct RandomAgent;

impl Agent for RandomAgent {
    fn decide(&self, _state: u32, rng: &mut dyn RngCore) -> AgentAction {
        AgentAction::from_code(rng.random_range(0..ACTION_COUNT)).unwrap_or(AgentAction::Draw)
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Draws half of the time, otherwise picks one of the seven play actions
/// uniformly.
#[derive(Debug, Clone, Default)]
pub struct BayesianAgent;

impl Agent for BayesianAgent {
    fn decide(&self, _state: u32, rng: &mut dyn RngCore) -> AgentAction {
        if rng.random_bool(0.5) {
            AgentAction::from_code(rng.random_range(1..ACTION_COUNT)).unwrap_or(AgentAction::Draw)
        } else {
            AgentAction::Draw
        }
    }

    fn name(&self) -> &str {
        "bayesian"
    }
}
