use kittens_engine::cards::regular_kinds;
use kittens_engine::deck::DeckCatalog;
use kittens_engine::game::{GameRules, HAND_SIZE, MAX_PLAYERS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_ENV: &str = "KITTENS_CONFIG";

/// Runtime settings for the game manager and simulator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSettings {
    /// Largest roster a game accepts (2-5)
    pub max_players: usize,
    /// Regular cards dealt per player
    pub hand_size: usize,
    pub copies_per_kind: usize,
    pub bomb_count: usize,
    pub defuse_count: usize,
    /// Directory holding the trained policy tables
    pub policy_dir: String,
    /// Cards an agent may play before it must draw
    pub max_plays_per_turn: u32,
    /// Agent turns one commit may run before giving up
    pub max_chain_turns: u32,
    pub seed: Option<u64>,
    /// Keep (state, action, reward, next state) rows for agent decisions
    pub record_decisions: bool,
    pub log_json: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        let catalog = DeckCatalog::default();
        Self {
            max_players: MAX_PLAYERS,
            hand_size: HAND_SIZE,
            copies_per_kind: catalog.copies_per_kind,
            bomb_count: catalog.bomb_count,
            defuse_count: catalog.defuse_count,
            policy_dir: "policies".to_string(),
            max_plays_per_turn: 3,
            max_chain_turns: 1_000,
            seed: None,
            record_decisions: false,
            log_json: false,
        }
    }
}

impl GameSettings {
    /// Validate settings values
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(2..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(SettingsError::InvalidValue(format!(
                "max_players must be between 2 and {}",
                MAX_PLAYERS
            )));
        }
        if self.hand_size == 0 {
            return Err(SettingsError::InvalidValue(
                "hand_size must be greater than 0".to_string(),
            ));
        }
        if self.copies_per_kind * regular_kinds().len() < self.hand_size * self.max_players {
            return Err(SettingsError::InvalidValue(
                "copies_per_kind too small to deal a full table".to_string(),
            ));
        }
        if self.policy_dir.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "policy_dir cannot be empty".to_string(),
            ));
        }
        if self.max_chain_turns == 0 {
            return Err(SettingsError::InvalidValue(
                "max_chain_turns must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn catalog(&self) -> DeckCatalog {
        DeckCatalog {
            copies_per_kind: self.copies_per_kind,
            bomb_count: self.bomb_count,
            defuse_count: self.defuse_count,
        }
    }

    pub fn rules(&self) -> GameRules {
        GameRules {
            max_players: self.max_players,
            hand_size: self.hand_size,
            catalog: self.catalog(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

/// Where each resolved value came from
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettingsSources {
    pub max_players: ValueSource,
    pub hand_size: ValueSource,
    pub copies_per_kind: ValueSource,
    pub bomb_count: ValueSource,
    pub defuse_count: ValueSource,
    pub policy_dir: ValueSource,
    pub max_plays_per_turn: ValueSource,
    pub max_chain_turns: ValueSource,
    pub seed: ValueSource,
    pub record_decisions: ValueSource,
    pub log_json: ValueSource,
}

impl Default for SettingsSources {
    fn default() -> Self {
        Self {
            max_players: ValueSource::Default,
            hand_size: ValueSource::Default,
            copies_per_kind: ValueSource::Default,
            bomb_count: ValueSource::Default,
            defuse_count: ValueSource::Default,
            policy_dir: ValueSource::Default,
            max_plays_per_turn: ValueSource::Default,
            max_chain_turns: ValueSource::Default,
            seed: ValueSource::Default,
            record_decisions: ValueSource::Default,
            log_json: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsResolved {
    pub settings: GameSettings,
    pub sources: SettingsSources,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    max_players: Option<usize>,
    hand_size: Option<usize>,
    copies_per_kind: Option<usize>,
    bomb_count: Option<usize>,
    defuse_count: Option<usize>,
    policy_dir: Option<String>,
    max_plays_per_turn: Option<u32>,
    max_chain_turns: Option<u32>,
    seed: Option<u64>,
    record_decisions: Option<bool>,
    log_json: Option<bool>,
}

/// Resolves settings from the process environment.
pub fn load() -> Result<SettingsResolved, SettingsError> {
    load_with_sources(|key| std::env::var(key).ok())
}

/// Defaults, then the TOML file named by `KITTENS_CONFIG`, then `KITTENS_*`
/// variables. `env` looks a variable up by name.
pub fn load_with_sources<F>(env: F) -> Result<SettingsResolved, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = GameSettings::default();
    let mut sources = SettingsSources::default();

    if let Some(path) = env(CONFIG_ENV).filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        let text = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        let f: FileSettings = toml::from_str(&text)?;
        macro_rules! from_file {
            ($field:ident) => {
                if let Some(v) = f.$field {
                    cfg.$field = v;
                    sources.$field = ValueSource::File;
                }
            };
        }
        from_file!(max_players);
        from_file!(hand_size);
        from_file!(copies_per_kind);
        from_file!(bomb_count);
        from_file!(defuse_count);
        from_file!(policy_dir);
        from_file!(max_plays_per_turn);
        from_file!(max_chain_turns);
        from_file!(record_decisions);
        from_file!(log_json);
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
    }

    let var = |key: &str| env(key).filter(|v| !v.is_empty());

    if let Some(seed) = var("KITTENS_SEED") {
        cfg.seed = Some(parse_env("KITTENS_SEED", &seed)?);
        sources.seed = ValueSource::Env;
    }
    if let Some(v) = var("KITTENS_MAX_PLAYERS") {
        cfg.max_players = parse_env("KITTENS_MAX_PLAYERS", &v)?;
        sources.max_players = ValueSource::Env;
    }
    if let Some(v) = var("KITTENS_HAND_SIZE") {
        cfg.hand_size = parse_env("KITTENS_HAND_SIZE", &v)?;
        sources.hand_size = ValueSource::Env;
    }
    if let Some(v) = var("KITTENS_POLICY_DIR") {
        cfg.policy_dir = v;
        sources.policy_dir = ValueSource::Env;
    }
    if let Some(v) = var("KITTENS_MAX_PLAYS_PER_TURN") {
        cfg.max_plays_per_turn = parse_env("KITTENS_MAX_PLAYS_PER_TURN", &v)?;
        sources.max_plays_per_turn = ValueSource::Env;
    }
    if let Some(v) = var("KITTENS_MAX_CHAIN_TURNS") {
        cfg.max_chain_turns = parse_env("KITTENS_MAX_CHAIN_TURNS", &v)?;
        sources.max_chain_turns = ValueSource::Env;
    }
    if let Some(v) = var("KITTENS_RECORD_DECISIONS") {
        cfg.record_decisions = parse_bool(&v).ok_or_else(|| {
            SettingsError::InvalidValue("KITTENS_RECORD_DECISIONS must be a boolean".into())
        })?;
        sources.record_decisions = ValueSource::Env;
    }
    if let Some(v) = var("KITTENS_LOG_JSON") {
        cfg.log_json = parse_bool(&v).ok_or_else(|| {
            SettingsError::InvalidValue("KITTENS_LOG_JSON must be a boolean".into())
        })?;
        sources.log_json = ValueSource::Env;
    }

    cfg.validate()?;
    Ok(SettingsResolved {
        settings: cfg,
        sources,
    })
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidValue(format!("{} has invalid value {:?}", key, value)))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = GameSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.rules(), GameRules::default());
    }

    #[test]
    fn validates_player_range() {
        for bad in [0, 1, 6] {
            let settings = GameSettings {
                max_players: bad,
                ..Default::default()
            };
            assert!(settings.validate().is_err(), "max_players {}", bad);
        }
    }

    #[test]
    fn validates_deck_can_deal_full_table() {
        let settings = GameSettings {
            copies_per_kind: 4,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn no_sources_resolve_to_defaults() {
        let resolved = load_with_sources(env_of(&[])).unwrap();
        assert_eq!(resolved.settings, GameSettings::default());
        assert_eq!(resolved.sources.seed, ValueSource::Default);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kittens.toml");
        fs::write(&path, "seed = 7\nhand_size = 5\npolicy_dir = \"tables\"\n").unwrap();
        let path = path.to_string_lossy().to_string();
        let resolved = load_with_sources(env_of(&[
            (CONFIG_ENV, path.as_str()),
            ("KITTENS_SEED", "99"),
            ("KITTENS_LOG_JSON", "yes"),
        ]))
        .unwrap();
        assert_eq!(resolved.settings.seed, Some(99));
        assert_eq!(resolved.sources.seed, ValueSource::Env);
        assert_eq!(resolved.settings.hand_size, 5);
        assert_eq!(resolved.sources.hand_size, ValueSource::File);
        assert_eq!(resolved.settings.policy_dir, "tables");
        assert!(resolved.settings.log_json);
        assert_eq!(resolved.sources.max_players, ValueSource::Default);
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let err = load_with_sources(env_of(&[("KITTENS_SEED", "abc")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
        let err = load_with_sources(env_of(&[("KITTENS_MAX_PLAYERS", "9")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
    }

    #[test]
    fn missing_or_malformed_file_is_an_error() {
        let err = load_with_sources(env_of(&[(CONFIG_ENV, "/no/such/kittens.toml")])).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "max_players = \"five\"").unwrap();
        let path = path.to_string_lossy().to_string();
        let err = load_with_sources(env_of(&[(CONFIG_ENV, path.as_str())])).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
