//! Precomputed policy tables for the trained agent types.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use kittens_engine::errors::GameError;
use kittens_engine::player::AgentType;
use kittens_engine::rules::{ACTION_COUNT, AgentAction};
use thiserror::Error;

/// File name of the Q-learning table inside a policy directory.
pub const QLEARNING_FILE: &str = "medium.policy";
/// File name of the MLE table inside a policy directory.
pub const MLE_FILE: &str = "mle_policy.txt";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Failed to read policy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Agent type {0} does not use a policy table")]
    Untrained(&'static str),
}

/// State index to action code. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    actions: Vec<AgentAction>,
}

impl PolicyTable {
    pub fn from_actions(actions: Vec<AgentAction>) -> Self {
        Self { actions }
    }

    /// Parses one non-negative integer per line. The first line that is not
    /// a valid action code ends the table; the rows before it are kept and
    /// the truncation is returned alongside.
    pub fn parse(agent: AgentType, text: &str) -> (Self, Option<GameError>) {
        let mut actions = Vec::new();
        for (line_no, line) in text.trim().lines().enumerate() {
            let parsed = line
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|code| *code < ACTION_COUNT)
                .and_then(AgentAction::from_code);
            match parsed {
                Some(action) => actions.push(action),
                None => {
                    let loaded = actions.len();
                    return (
                        Self { actions },
                        Some(GameError::PolicyLoadIncomplete {
                            agent: agent.as_str().to_string(),
                            line: line_no + 1,
                            loaded,
                        }),
                    );
                }
            }
        }
        (Self { actions }, None)
    }

    pub fn lookup(&self, state: u32) -> Option<AgentAction> {
        self.actions.get(state as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of rows per action code, indexed by code.
    pub fn action_histogram(&self) -> [usize; ACTION_COUNT as usize] {
        let mut counts = [0; ACTION_COUNT as usize];
        for action in &self.actions {
            counts[action.code() as usize] += 1;
        }
        counts
    }
}

/// Tables for every trained agent type, shared across games behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    tables: HashMap<AgentType, PolicyTable>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, agent: AgentType, table: PolicyTable) -> Self {
        self.tables.insert(agent, table);
        self
    }

    /// Loads both trained tables from `dir`. Missing or unreadable files
    /// leave that agent with an empty table.
    pub fn load_dir(dir: &Path) -> Self {
        let mut store = Self::new();
        for (agent, file) in [
            (AgentType::Qlearning, QLEARNING_FILE),
            (AgentType::Mle, MLE_FILE),
        ] {
            let path = dir.join(file);
            let table = match Self::load_file(agent, &path) {
                Ok(table) => table,
                Err(err) => {
                    tracing::warn!(agent = agent.as_str(), error = %err, "policy table unavailable, agent will always draw");
                    PolicyTable::default()
                }
            };
            store.tables.insert(agent, table);
        }
        store
    }

    /// Reads one table. A truncated file still yields the rows before the
    /// bad line; the truncation is logged, not returned.
    pub fn load_file(agent: AgentType, path: &Path) -> Result<PolicyTable, PolicyError> {
        if !matches!(agent, AgentType::Qlearning | AgentType::Mle) {
            return Err(PolicyError::Untrained(agent.as_str()));
        }
        let text = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (table, incomplete) = PolicyTable::parse(agent, &text);
        if let Some(err) = incomplete {
            tracing::warn!(agent = agent.as_str(), path = %path.display(), error = %err, "policy table truncated");
        } else {
            tracing::info!(agent = agent.as_str(), states = table.len(), "policy table loaded");
        }
        Ok(table)
    }

    pub fn table(&self, agent: AgentType) -> Option<&PolicyTable> {
        self.tables.get(&agent)
    }

    /// Table action for `state`, `None` when the table is absent or short.
    pub fn lookup(&self, agent: AgentType, state: u32) -> Option<AgentAction> {
        self.tables.get(&agent).and_then(|t| t.lookup(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_one_code_per_line() {
        let (table, err) = PolicyTable::parse(AgentType::Mle, "0\n7\n3\n");
        assert!(err.is_none());
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(1), Some(AgentAction::PlayCat));
        assert_eq!(table.lookup(3), None);
    }

    #[test]
    fn parse_truncates_at_first_bad_line() {
        let (table, err) = PolicyTable::parse(AgentType::Qlearning, "1\n2\nx\n4\n");
        assert_eq!(table.len(), 2);
        assert_eq!(
            err,
            Some(GameError::PolicyLoadIncomplete {
                agent: "qlearning".into(),
                line: 3,
                loaded: 2
            })
        );
        let (table, err) = PolicyTable::parse(AgentType::Qlearning, "1\n9\n");
        assert_eq!(table.len(), 1);
        assert!(err.is_some());
    }

    #[test]
    fn histogram_counts_codes() {
        let (table, _) = PolicyTable::parse(AgentType::Mle, "0\n0\n5");
        let hist = table.action_histogram();
        assert_eq!(hist[0], 2);
        assert_eq!(hist[5], 1);
    }

    #[test]
    fn load_dir_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MLE_FILE), "2\n2\n").unwrap();
        let store = PolicyStore::load_dir(dir.path());
        assert!(store.table(AgentType::Qlearning).unwrap().is_empty());
        assert_eq!(store.lookup(AgentType::Mle, 1), Some(AgentAction::PlayAttack));
        assert_eq!(store.lookup(AgentType::Qlearning, 1), None);
    }

    #[test]
    fn heuristic_agents_have_no_table_file() {
        let err = PolicyStore::load_file(AgentType::Random, Path::new("x")).unwrap_err();
        assert!(matches!(err, PolicyError::Untrained("random")));
    }
}
