use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cards::{regular_kinds, Card, CardKind, IdSource};
use crate::errors::GameError;

/// Multiset definition a game deck is expanded from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCatalog {
    /// Copies of each of the eight regular kinds
    pub copies_per_kind: usize,
    /// Exploding kittens placed in the bomb pool
    pub bomb_count: usize,
    /// Defuse cards placed in the defuse pool
    pub defuse_count: usize,
}

impl Default for DeckCatalog {
    fn default() -> Self {
        Self {
            copies_per_kind: 8,
            bomb_count: 4,
            defuse_count: 6,
        }
    }
}

impl DeckCatalog {
    pub fn total_cards(&self) -> usize {
        self.copies_per_kind * regular_kinds().len() + self.bomb_count + self.defuse_count
    }
}

/// Expands the regular part of the catalog into concrete cards, in catalog
/// order. Deterministic for a given catalog and id source.
pub fn build_deck(catalog: &DeckCatalog, ids: &mut dyn IdSource) -> Vec<Card> {
    let kinds = regular_kinds();
    let mut cards = Vec::with_capacity(catalog.copies_per_kind * kinds.len());
    for _ in 0..catalog.copies_per_kind {
        for &kind in &kinds {
            cards.push(Card::new(kind, ids.next_id()));
        }
    }
    cards
}

/// Builds the bomb and defuse pools.
pub fn build_pools(catalog: &DeckCatalog, ids: &mut dyn IdSource) -> (Vec<Card>, Vec<Card>) {
    let bombs = (0..catalog.bomb_count)
        .map(|_| Card::new(CardKind::Bomb, ids.next_id()))
        .collect();
    let defuses = (0..catalog.defuse_count)
        .map(|_| Card::new(CardKind::Defuse, ids.next_id()))
        .collect();
    (bombs, defuses)
}

/// Fisher–Yates shuffle: walks from the last index down to 1 and swaps each
/// slot with a uniformly chosen index in `0..=i`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Removes `hand_size` cards per player from the head of the deck, one
/// contiguous block per player in index order.
pub fn deal(
    mut deck: Vec<Card>,
    player_count: usize,
    hand_size: usize,
) -> Result<(Vec<Vec<Card>>, Vec<Card>), GameError> {
    let needed = hand_size * player_count;
    if deck.len() < needed {
        return Err(GameError::InsufficientCards {
            needed,
            available: deck.len(),
        });
    }
    let remaining = deck.split_off(needed);
    let mut dealt = deck.into_iter();
    let hands = (0..player_count)
        .map(|_| dealt.by_ref().take(hand_size).collect())
        .collect();
    Ok((hands, remaining))
}

/// Inserts a card at a uniformly random position in `0..=len` and returns it.
pub fn insert_random<R: Rng + ?Sized>(deck: &mut Vec<Card>, card: Card, rng: &mut R) -> usize {
    let pos = rng.random_range(0..=deck.len());
    deck.insert(pos, card);
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::SequentialIds;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn build_deck_expands_copies_per_kind() {
        let catalog = DeckCatalog {
            copies_per_kind: 2,
            bomb_count: 1,
            defuse_count: 3,
        };
        let mut ids = SequentialIds::new("t");
        let deck = build_deck(&catalog, &mut ids);
        assert_eq!(deck.len(), 16);
        assert!(deck.iter().all(|c| !c.kind.is_special()));
        let (bombs, defuses) = build_pools(&catalog, &mut ids);
        assert_eq!(bombs.len(), 1);
        assert_eq!(defuses.len(), 3);
        assert_eq!(catalog.total_cards(), 20);
    }

    #[test]
    fn deal_takes_contiguous_blocks_from_head() {
        let mut ids = SequentialIds::new("t");
        let deck = build_deck(&DeckCatalog::default(), &mut ids);
        let head: Vec<String> = deck.iter().take(4).map(|c| c.card_id.clone()).collect();
        let (hands, rest) = deal(deck, 2, 2).unwrap();
        assert_eq!(hands[0][0].card_id, head[0]);
        assert_eq!(hands[0][1].card_id, head[1]);
        assert_eq!(hands[1][0].card_id, head[2]);
        assert_eq!(rest.len(), 60);
    }

    #[test]
    fn deal_rejects_short_deck() {
        let mut ids = SequentialIds::new("t");
        let catalog = DeckCatalog {
            copies_per_kind: 1,
            ..DeckCatalog::default()
        };
        let deck = build_deck(&catalog, &mut ids);
        let err = deal(deck, 2, 7).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientCards {
                needed: 14,
                available: 8
            }
        );
    }

    #[test]
    fn shuffle_is_deterministic_with_same_seed() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut ChaCha20Rng::seed_from_u64(9));
        shuffle(&mut b, &mut ChaCha20Rng::seed_from_u64(9));
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }
}
