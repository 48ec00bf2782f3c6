use serde::{Deserialize, Serialize};

use crate::cards::{Card, CardKind, Effect};

/// Fixed action vocabulary shared with the policy tables.
///
/// The numeric code of each variant is part of the trained-policy contract:
/// `0=Draw, 1=PlaySkip, 2=PlayAttack, 3=PlayFavor, 4=PlayNope,
/// 5=PlaySeeFuture, 6=PlayShuffle, 7=PlayCat`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    Draw,
    PlaySkip,
    PlayAttack,
    PlayFavor,
    PlayNope,
    PlaySeeFuture,
    PlayShuffle,
    PlayCat,
}

pub const ACTION_COUNT: u8 = 8;

impl AgentAction {
    pub fn from_code(code: u8) -> Option<AgentAction> {
        match code {
            0 => Some(AgentAction::Draw),
            1 => Some(AgentAction::PlaySkip),
            2 => Some(AgentAction::PlayAttack),
            3 => Some(AgentAction::PlayFavor),
            4 => Some(AgentAction::PlayNope),
            5 => Some(AgentAction::PlaySeeFuture),
            6 => Some(AgentAction::PlayShuffle),
            7 => Some(AgentAction::PlayCat),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            AgentAction::Draw => 0,
            AgentAction::PlaySkip => 1,
            AgentAction::PlayAttack => 2,
            AgentAction::PlayFavor => 3,
            AgentAction::PlayNope => 4,
            AgentAction::PlaySeeFuture => 5,
            AgentAction::PlayShuffle => 6,
            AgentAction::PlayCat => 7,
        }
    }

    fn matches(self, card: &Card) -> bool {
        match self {
            AgentAction::Draw => false,
            AgentAction::PlayCat => card.kind == CardKind::Cat,
            AgentAction::PlaySkip => card.effect_kind() == Some(Effect::Skip),
            AgentAction::PlayAttack => card.effect_kind() == Some(Effect::Attack),
            AgentAction::PlayFavor => card.effect_kind() == Some(Effect::Target),
            AgentAction::PlayNope => card.effect_kind() == Some(Effect::Nope),
            AgentAction::PlaySeeFuture => card.effect_kind() == Some(Effect::SeeFuture),
            AgentAction::PlayShuffle => card.effect_kind() == Some(Effect::Shuffle),
        }
    }
}

/// Resolves a play action to the first hand index holding a matching card.
///
/// Returns `None` for [`AgentAction::Draw`] and when no card in the hand
/// carries the requested effect.
///
/// # Examples
///
/// ```
/// use kittens_engine::cards::{Card, CardKind};
/// use kittens_engine::rules::{card_for_action, AgentAction};
///
/// let hand = vec![Card::new(CardKind::Dog, "a"), Card::new(CardKind::Taco, "b")];
/// assert_eq!(card_for_action(&hand, AgentAction::PlayShuffle), Some(1));
/// assert_eq!(card_for_action(&hand, AgentAction::PlayAttack), None);
/// ```
pub fn card_for_action(hand: &[Card], action: AgentAction) -> Option<usize> {
    hand.iter().position(|c| action.matches(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_for_every_action() {
        for code in 0..ACTION_COUNT {
            let action = AgentAction::from_code(code).unwrap();
            assert_eq!(action.code(), code);
        }
        assert_eq!(AgentAction::from_code(8), None);
    }

    #[test]
    fn skip_matches_beer_and_sleep() {
        let hand = vec![
            Card::new(CardKind::Cat, "a"),
            Card::new(CardKind::Sleep, "b"),
            Card::new(CardKind::Beer, "c"),
        ];
        assert_eq!(card_for_action(&hand, AgentAction::PlaySkip), Some(1));
        assert_eq!(card_for_action(&hand, AgentAction::PlayCat), Some(0));
        assert_eq!(card_for_action(&hand, AgentAction::Draw), None);
    }
}
