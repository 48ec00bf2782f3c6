use serde::{Deserialize, Serialize};

/// The ten card kinds found in a game deck.
/// The first eight are regular action cards; `Bomb` and `Defuse` are kept in
/// separate pools until the game starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum CardKind {
    Cat,
    Dog,
    Taco,
    Beer,
    Laser,
    Time,
    Sleep,
    Point,
    /// The exploding kitten
    Bomb,
    Defuse,
}

impl CardKind {
    pub fn name(self) -> &'static str {
        match self {
            CardKind::Cat => "Cat",
            CardKind::Dog => "Dog",
            CardKind::Taco => "Taco",
            CardKind::Beer => "Beer",
            CardKind::Laser => "Laser",
            CardKind::Time => "Time",
            CardKind::Sleep => "Sleep",
            CardKind::Point => "Point",
            CardKind::Bomb => "Bomb",
            CardKind::Defuse => "Defuse",
        }
    }

    pub fn is_special(self) -> bool {
        matches!(self, CardKind::Bomb | CardKind::Defuse)
    }
}

pub fn regular_kinds() -> [CardKind; 8] {
    [
        CardKind::Cat,
        CardKind::Dog,
        CardKind::Taco,
        CardKind::Beer,
        CardKind::Laser,
        CardKind::Time,
        CardKind::Sleep,
        CardKind::Point,
    ]
}

/// Effect a card resolves to when played.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Effect {
    SeeFuture,
    Nope,
    Shuffle,
    Skip,
    Attack,
    Target,
    ExplodingKitten,
    Defuse,
}

impl Effect {
    pub fn label(self) -> &'static str {
        match self {
            Effect::SeeFuture => "See Future",
            Effect::Nope => "Nope",
            Effect::Shuffle => "Shuffle",
            Effect::Skip => "Skip",
            Effect::Attack => "Attack",
            Effect::Target => "Target",
            Effect::ExplodingKitten => "Exploding Kitten",
            Effect::Defuse => "Defuse",
        }
    }

    pub fn from_label(label: &str) -> Option<Effect> {
        match label {
            "See Future" => Some(Effect::SeeFuture),
            "Nope" => Some(Effect::Nope),
            "Shuffle" => Some(Effect::Shuffle),
            "Skip" => Some(Effect::Skip),
            "Attack" => Some(Effect::Attack),
            "Target" => Some(Effect::Target),
            "Exploding Kitten" => Some(Effect::ExplodingKitten),
            "Defuse" => Some(Effect::Defuse),
            _ => None,
        }
    }
}

/// Catalog row describing how cards of one kind look and behave.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CardTemplate {
    pub kind: CardKind,
    pub effect: Effect,
    pub color: &'static str,
    pub is_action: bool,
}

pub fn template(kind: CardKind) -> CardTemplate {
    let (effect, color, is_action) = match kind {
        CardKind::Cat => (Effect::SeeFuture, "#4ecdc4", true),
        CardKind::Dog => (Effect::Nope, "#ff6b6b", true),
        CardKind::Taco => (Effect::Shuffle, "#f39c12", true),
        CardKind::Beer => (Effect::Skip, "#9b59b6", true),
        CardKind::Laser => (Effect::Attack, "#e67e22", true),
        CardKind::Time => (Effect::Target, "#3498db", true),
        CardKind::Sleep => (Effect::Skip, "#95a5a6", true),
        CardKind::Point => (Effect::Target, "#e74c3c", true),
        CardKind::Bomb => (Effect::ExplodingKitten, "#e74c3c", false),
        CardKind::Defuse => (Effect::Defuse, "#2ecc71", false),
    };
    CardTemplate {
        kind,
        effect,
        color,
        is_action,
    }
}

/// A single physical card. Identity is `card_id`; cards are never mutated
/// after creation, only moved between piles.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: String,
    pub kind: CardKind,
    pub effect: String,
    pub color: String,
    pub is_action: bool,
    #[serde(default)]
    pub is_exploding: bool,
    #[serde(default)]
    pub is_defuse: bool,
}

impl Card {
    pub fn new(kind: CardKind, card_id: impl Into<String>) -> Self {
        let t = template(kind);
        Self {
            card_id: card_id.into(),
            kind,
            effect: t.effect.label().to_string(),
            color: t.color.to_string(),
            is_action: t.is_action,
            is_exploding: kind == CardKind::Bomb,
            is_defuse: kind == CardKind::Defuse,
        }
    }

    pub fn effect_kind(&self) -> Option<Effect> {
        Effect::from_label(&self.effect)
    }
}

/// Source of card identifiers. Card ids only need to be unique within one game.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Deterministic ids of the form `<prefix>-<n>`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u32,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{:03}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
