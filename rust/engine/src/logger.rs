use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::player::AgentType;

/// Kind of a row in the action history.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Draw,
    Play,
    Explode,
    Defuse,
    TurnStart,
    TurnEnd,
}

/// Append-only audit row. Field names are the persisted contract.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub player_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_player: Option<usize>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub description: String,
}

impl ActionEntry {
    pub fn new(action_type: ActionType, player_index: usize, description: impl Into<String>) -> Self {
        Self {
            action_type,
            player_index,
            card_id: None,
            card_type: None,
            target_player: None,
            timestamp: now_millis(),
            description: description.into(),
        }
    }

    pub fn with_card(mut self, card_id: &str, card_type: &str) -> Self {
        self.card_id = Some(card_id.to_string());
        self.card_type = Some(card_type.to_string());
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target_player = Some(target);
        self
    }
}

/// Final standing of one player, written once per player when a game ends.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub player_index: usize,
    pub player_type: AgentType,
    pub final_position: usize,
    pub cards_drawn_total: u32,
    pub cards_played_total: u32,
    pub explosions_caused: u32,
    pub defuses_used: u32,
    /// Milliseconds between game creation and the end of the game
    pub game_duration: i64,
    pub win: bool,
}

/// Complete record of one finished game, serialized as a JSONL line.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: String,
    pub seed: u64,
    pub winner: Option<usize>,
    pub rounds: u32,
    pub actions: Vec<ActionEntry>,
    pub standings: Vec<GameStatsRecord>,
    /// RFC3339 time the record was written
    #[serde(default)]
    pub ts: Option<String>,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Appends one JSON line per finished game.
pub struct GameLogger {
    writer: Option<BufWriter<File>>,
    written: u32,
}

impl GameLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
            written: 0,
        })
    }

    /// Logger that counts records without touching the filesystem.
    pub fn discard() -> Self {
        Self {
            writer: None,
            written: 0,
        }
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    pub fn write(&mut self, record: &GameRecord) -> std::io::Result<()> {
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        self.written += 1;
        Ok(())
    }
}
