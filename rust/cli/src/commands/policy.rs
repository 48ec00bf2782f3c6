//! Policy inspection command handler.
//!
//! Loads the trained tables from a directory and prints, per agent type, the
//! number of usable rows and how often each action code appears. With
//! `--state` the action each table picks for that state is included.

use crate::error::CliError;
use crate::ui;
use kittens_ai::encoder::STATE_SPACE;
use kittens_ai::policy::PolicyStore;
use kittens_engine::player::AgentType;
use kittens_engine::rules::ACTION_COUNT;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct TableSummary {
    agent: &'static str,
    entries: usize,
    /// Row count per action code, indexed by code
    histogram: [usize; ACTION_COUNT as usize],
    #[serde(skip_serializing_if = "Option::is_none")]
    action_at_state: Option<u8>,
}

pub fn handle_policy_command(
    dir: &Path,
    state: Option<u32>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if !dir.is_dir() {
        let msg = format!("Policy directory not found: {}", dir.display());
        ui::write_error(err, &msg)?;
        return Err(CliError::InvalidInput(msg));
    }
    if let Some(s) = state
        && s >= STATE_SPACE
    {
        let msg = format!("state must be below {}", STATE_SPACE);
        ui::write_error(err, &msg)?;
        return Err(CliError::InvalidInput(msg));
    }

    let store = PolicyStore::load_dir(dir);
    let mut summaries = Vec::new();
    for agent in [AgentType::Qlearning, AgentType::Mle] {
        let Some(table) = store.table(agent) else {
            continue;
        };
        if table.is_empty() {
            ui::display_warning(
                err,
                &format!("no usable {} table; that agent will always draw", agent.as_str()),
            )?;
        }
        summaries.push(TableSummary {
            agent: agent.as_str(),
            entries: table.len(),
            histogram: table.action_histogram(),
            action_at_state: state.and_then(|s| table.lookup(s)).map(|a| a.code()),
        });
    }

    let json_str = serde_json::to_string_pretty(&summaries).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}
