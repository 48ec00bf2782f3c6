use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),
    #[error("Game not found: {0}")]
    GameNotFound(String),
    #[error("Game is not active")]
    GameNotActive,
    #[error("Game already finished")]
    GameAlreadyFinished,
    #[error("It's not player {actual}'s turn (expected player {expected})")]
    NotYourTurn { expected: usize, actual: usize },
    #[error("Card index {index} out of range for hand of {hand_size}")]
    CardIndexOutOfRange { index: usize, hand_size: usize },
    #[error("Deck is empty")]
    EmptyDeck,
    #[error("Insufficient cards: need {needed}, deck has {available}")]
    InsufficientCards { needed: usize, available: usize },
    #[error("Policy table for {agent} truncated at line {line} ({loaded} entries usable)")]
    PolicyLoadIncomplete {
        agent: String,
        line: usize,
        loaded: usize,
    },
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl GameError {
    /// Fatal errors mean the aggregate can no longer be trusted; everything
    /// else leaves the game untouched and may be retried with corrected input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::InvariantViolation(_))
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidRoster(_) => "invalid_roster",
            GameError::GameNotFound(_) => "game_not_found",
            GameError::GameNotActive => "game_not_active",
            GameError::GameAlreadyFinished => "game_already_finished",
            GameError::NotYourTurn { .. } => "not_your_turn",
            GameError::CardIndexOutOfRange { .. } => "card_index_out_of_range",
            GameError::EmptyDeck => "empty_deck",
            GameError::InsufficientCards { .. } => "insufficient_cards",
            GameError::PolicyLoadIncomplete { .. } => "policy_load_incomplete",
            GameError::InvariantViolation(_) => "invariant_violation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invariant_violations_are_fatal() {
        assert!(GameError::InvariantViolation("lost card".into()).is_fatal());
        assert!(!GameError::EmptyDeck.is_fatal());
        assert!(!GameError::NotYourTurn { expected: 1, actual: 0 }.is_fatal());
    }

    #[test]
    fn messages_name_the_seats() {
        let err = GameError::NotYourTurn { expected: 2, actual: 0 };
        assert_eq!(err.kind(), "not_your_turn");
        assert_eq!(err.to_string(), "It's not player 0's turn (expected player 2)");
    }
}
