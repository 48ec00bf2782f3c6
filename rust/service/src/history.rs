use kittens_engine::logger::GameStatsRecord;
use kittens_engine::player::AgentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::ServiceError;
use crate::store::{DocumentStore, Query, GAME_STATS};

/// Filter criteria over game statistics rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_type: Option<AgentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

impl StatsFilter {
    fn query(&self) -> Query {
        let mut query = Query::new(GAME_STATS);
        if let Some(t) = self.player_type {
            query = query.eq("playerType", t.as_str());
        }
        if let Some(id) = &self.game_id {
            query = query.eq("gameId", id.as_str());
        }
        query
    }
}

/// Aggregate results of one agent type over finished games
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatistics {
    pub player_type: AgentType,
    pub games: usize,
    pub wins: usize,
    /// Percentage of games won
    pub win_rate: f64,
    pub avg_position: f64,
    pub explosions: u32,
    pub defuses_used: u32,
    pub avg_cards_drawn: f64,
    pub avg_cards_played: f64,
}

/// Loads statistics rows matching `filter`, in insertion order.
pub fn load_stats(
    store: &dyn DocumentStore,
    filter: &StatsFilter,
) -> Result<Vec<GameStatsRecord>, ServiceError> {
    store
        .query(&filter.query())?
        .into_iter()
        .map(|doc| {
            serde_json::from_value(doc.body)
                .map_err(|e| ServiceError::CorruptDocument(doc.id.clone(), e.to_string()))
        })
        .collect()
}

/// Groups rows by agent type. Types without rows are left out.
pub fn calculate_stats(records: &[GameStatsRecord]) -> Vec<AgentStatistics> {
    let mut grouped: BTreeMap<&'static str, Vec<&GameStatsRecord>> = BTreeMap::new();
    for r in records {
        grouped.entry(r.player_type.as_str()).or_default().push(r);
    }

    grouped
        .into_values()
        .map(|rows| {
            let games = rows.len();
            let n = games as f64;
            let wins = rows.iter().filter(|r| r.win).count();
            AgentStatistics {
                player_type: rows[0].player_type,
                games,
                wins,
                win_rate: wins as f64 / n * 100.0,
                avg_position: rows.iter().map(|r| r.final_position as f64).sum::<f64>() / n,
                explosions: rows.iter().map(|r| r.explosions_caused).sum(),
                defuses_used: rows.iter().map(|r| r.defuses_used).sum(),
                avg_cards_drawn: rows.iter().map(|r| r.cards_drawn_total as f64).sum::<f64>() / n,
                avg_cards_played: rows.iter().map(|r| r.cards_played_total as f64).sum::<f64>()
                    / n,
            }
        })
        .collect()
}
