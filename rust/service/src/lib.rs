pub mod errors;
pub mod games;
pub mod history;
pub mod logging;
pub mod settings;
pub mod store;

pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse, ServiceError};
pub use games::{DecisionRecord, GameId, GameManager, StoredGame};
pub use history::{calculate_stats, load_stats, AgentStatistics, StatsFilter};
pub use logging::{init_logging, init_test_logging, LogEntry, TestLogSubscriber};
pub use settings::{GameSettings, SettingsError, SettingsResolved, SettingsSources, ValueSource};
pub use store::{DocumentStore, MemoryStore, Order, Query, SqliteStore, StoreError};
