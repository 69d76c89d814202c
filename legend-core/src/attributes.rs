//! Open Legend attributes.
//!
//! Eighteen attributes in four groups, scored 0-9. An attribute's score maps
//! to the dice added to action rolls, and pairs of attributes feed the three
//! defenses.

use crate::dice::{DicePool, DieType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The eighteen attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    // Physical
    Agility,
    Fortitude,
    Might,
    // Mental
    Learning,
    Logic,
    Perception,
    Will,
    // Social
    Deception,
    Persuasion,
    Presence,
    // Extraordinary
    Alteration,
    Creation,
    Energy,
    Entropy,
    Influence,
    Movement,
    Prescience,
    Protection,
}

/// Attribute grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    Physical,
    Mental,
    Social,
    Extraordinary,
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Agility => "Agility",
            Attribute::Fortitude => "Fortitude",
            Attribute::Might => "Might",
            Attribute::Learning => "Learning",
            Attribute::Logic => "Logic",
            Attribute::Perception => "Perception",
            Attribute::Will => "Will",
            Attribute::Deception => "Deception",
            Attribute::Persuasion => "Persuasion",
            Attribute::Presence => "Presence",
            Attribute::Alteration => "Alteration",
            Attribute::Creation => "Creation",
            Attribute::Energy => "Energy",
            Attribute::Entropy => "Entropy",
            Attribute::Influence => "Influence",
            Attribute::Movement => "Movement",
            Attribute::Prescience => "Prescience",
            Attribute::Protection => "Protection",
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Agility | Attribute::Fortitude | Attribute::Might => AttributeKind::Physical,
            Attribute::Learning | Attribute::Logic | Attribute::Perception | Attribute::Will => {
                AttributeKind::Mental
            }
            Attribute::Deception | Attribute::Persuasion | Attribute::Presence => {
                AttributeKind::Social
            }
            _ => AttributeKind::Extraordinary,
        }
    }

    pub fn all() -> [Attribute; 18] {
        [
            Attribute::Agility,
            Attribute::Fortitude,
            Attribute::Might,
            Attribute::Learning,
            Attribute::Logic,
            Attribute::Perception,
            Attribute::Will,
            Attribute::Deception,
            Attribute::Persuasion,
            Attribute::Presence,
            Attribute::Alteration,
            Attribute::Creation,
            Attribute::Energy,
            Attribute::Entropy,
            Attribute::Influence,
            Attribute::Movement,
            Attribute::Prescience,
            Attribute::Protection,
        ]
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Attribute> {
        let lower = name.to_lowercase();
        Attribute::all()
            .into_iter()
            .find(|a| a.name().to_lowercase() == lower)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The highest assignable attribute score.
pub const MAX_SCORE: u8 = 9;

/// Attribute scores container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeScores {
    pub agility: u8,
    pub fortitude: u8,
    pub might: u8,
    pub learning: u8,
    pub logic: u8,
    pub perception: u8,
    pub will: u8,
    pub deception: u8,
    pub persuasion: u8,
    pub presence: u8,
    pub alteration: u8,
    pub creation: u8,
    pub energy: u8,
    pub entropy: u8,
    pub influence: u8,
    pub movement: u8,
    pub prescience: u8,
    pub protection: u8,
}

impl AttributeScores {
    /// All scores at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attribute: Attribute) -> u8 {
        match attribute {
            Attribute::Agility => self.agility,
            Attribute::Fortitude => self.fortitude,
            Attribute::Might => self.might,
            Attribute::Learning => self.learning,
            Attribute::Logic => self.logic,
            Attribute::Perception => self.perception,
            Attribute::Will => self.will,
            Attribute::Deception => self.deception,
            Attribute::Persuasion => self.persuasion,
            Attribute::Presence => self.presence,
            Attribute::Alteration => self.alteration,
            Attribute::Creation => self.creation,
            Attribute::Energy => self.energy,
            Attribute::Entropy => self.entropy,
            Attribute::Influence => self.influence,
            Attribute::Movement => self.movement,
            Attribute::Prescience => self.prescience,
            Attribute::Protection => self.protection,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: u8) {
        let slot = match attribute {
            Attribute::Agility => &mut self.agility,
            Attribute::Fortitude => &mut self.fortitude,
            Attribute::Might => &mut self.might,
            Attribute::Learning => &mut self.learning,
            Attribute::Logic => &mut self.logic,
            Attribute::Perception => &mut self.perception,
            Attribute::Will => &mut self.will,
            Attribute::Deception => &mut self.deception,
            Attribute::Persuasion => &mut self.persuasion,
            Attribute::Presence => &mut self.presence,
            Attribute::Alteration => &mut self.alteration,
            Attribute::Creation => &mut self.creation,
            Attribute::Energy => &mut self.energy,
            Attribute::Entropy => &mut self.entropy,
            Attribute::Influence => &mut self.influence,
            Attribute::Movement => &mut self.movement,
            Attribute::Prescience => &mut self.prescience,
            Attribute::Protection => &mut self.protection,
        };
        *slot = value;
    }

    /// Total attribute points spent across all scores.
    pub fn spent_points(&self) -> u32 {
        Attribute::all()
            .into_iter()
            .map(|a| score_cost(self.get(a)))
            .sum()
    }
}

/// Cumulative point cost of an attribute score: n(n+1)/2.
pub fn score_cost(score: u8) -> u32 {
    let n = score as u32;
    n * (n + 1) / 2
}

/// The attribute dice table, indexed by score 1..=10.
///
/// Scores above the table (a feat can push the index past 9) clamp to the
/// top entry. Score 0 grants no dice.
pub fn dice_for_score(score: u8) -> Option<DicePool> {
    const TABLE: [(u32, DieType); 10] = [
        (1, DieType::D4),
        (1, DieType::D6),
        (1, DieType::D8),
        (1, DieType::D10),
        (2, DieType::D6),
        (2, DieType::D8),
        (2, DieType::D10),
        (3, DieType::D8),
        (3, DieType::D10),
        (4, DieType::D8),
    ];

    if score == 0 {
        return None;
    }
    let index = (score as usize - 1).min(TABLE.len() - 1);
    let (count, die) = TABLE[index];
    Some(DicePool::new(count, die))
}

/// The three defenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Defense {
    Guard,
    Toughness,
    Resolve,
}

impl Defense {
    pub fn name(&self) -> &'static str {
        match self {
            Defense::Guard => "Guard",
            Defense::Toughness => "Toughness",
            Defense::Resolve => "Resolve",
        }
    }

    /// The attribute pair whose scores add into this defense.
    pub fn attribute_pair(&self) -> (Attribute, Attribute) {
        match self {
            Defense::Guard => (Attribute::Agility, Attribute::Might),
            Defense::Toughness => (Attribute::Fortitude, Attribute::Will),
            Defense::Resolve => (Attribute::Presence, Attribute::Will),
        }
    }

    pub fn all() -> [Defense; 3] {
        [Defense::Guard, Defense::Toughness, Defense::Resolve]
    }
}

impl fmt::Display for Defense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
