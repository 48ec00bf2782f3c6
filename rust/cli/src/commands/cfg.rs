//! Configuration command handler.
//!
//! Prints the resolved settings as pretty JSON, one `{value, source}` pair
//! per key, where `source` is `default`, `file` or `env`.

use crate::error::CliError;
use crate::ui;
use kittens_service::settings::{self, SettingsResolved};
use std::io::Write;

/// Handle the cfg command. `env` looks up a variable by name.
pub fn handle_cfg_command<F>(env: F, out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let resolved = match settings::load_with_sources(env) {
        Ok(r) => r,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(format!("Invalid configuration: {}", e)));
        }
    };

    let json_str =
        serde_json::to_string_pretty(&display(&resolved)).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}

fn display(resolved: &SettingsResolved) -> serde_json::Value {
    let SettingsResolved { settings, sources } = resolved;
    macro_rules! entry {
        ($field:ident) => {
            serde_json::json!({ "value": settings.$field, "source": sources.$field })
        };
    }
    serde_json::json!({
        "max_players": entry!(max_players),
        "hand_size": entry!(hand_size),
        "copies_per_kind": entry!(copies_per_kind),
        "bomb_count": entry!(bomb_count),
        "defuse_count": entry!(defuse_count),
        "policy_dir": entry!(policy_dir),
        "max_plays_per_turn": entry!(max_plays_per_turn),
        "max_chain_turns": entry!(max_chain_turns),
        "seed": entry!(seed),
        "record_decisions": entry!(record_decisions),
        "log_json": entry!(log_json),
    })
}
