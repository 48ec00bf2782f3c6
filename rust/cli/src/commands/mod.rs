//! Command handler modules.
//!
//! Each command lives in its own file and exposes
//! `pub fn handle_COMMAND_command(...) -> Result<(), CliError>`. Output
//! streams are passed in as `&mut dyn Write` so tests can capture them.

pub mod cfg;
pub mod policy;
pub mod sim;

pub use cfg::handle_cfg_command;
pub use policy::handle_policy_command;
pub use sim::{SimOptions, handle_sim_command};
