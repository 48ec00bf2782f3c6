//! # kittens-engine: Exploding Kittens Game Core
//!
//! A deterministic game engine for 2 to 5 player Exploding Kittens matches.
//! Every piece of randomness is drawn from a caller-supplied RNG so a seeded
//! game replays identically.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card kinds, the fixed catalog, and card ids
//! - [`deck`] - Deck construction, Fisher–Yates shuffle, dealing
//! - [`game`] - The game document and its turn state machine
//! - [`player`] - Seats, hands, agent types, per-player counters
//! - [`rules`] - The eight-action vocabulary shared with trained policies
//! - [`logger`] - Action history rows, standings, JSONL game records
//! - [`errors`] - Error types for game operations
//!
//! ## Quick Start
//!
//! ```rust
//! use kittens_engine::game::{DefusePlacement, Game, GameRules, GameStatus};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let names: Vec<String> = ["Ada", "Bo", "Cy"].iter().map(|s| s.to_string()).collect();
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//! let mut game = Game::create(0, &names, GameRules::default(), 42).unwrap();
//! game.start(&mut rng).unwrap();
//! assert_eq!(game.status(), GameStatus::Playing);
//!
//! game.draw_card(0, DefusePlacement::Random, &mut rng).unwrap();
//! game.check_invariants().unwrap();
//! ```

pub mod cards;
pub mod deck;
pub mod errors;
pub mod game;
pub mod logger;
pub mod player;
pub mod rules;
