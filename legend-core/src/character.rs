//! The character record.
//!
//! One `Character` holds everything a player persists: raw attribute scores,
//! equipment, taken feats, active boons and banes, perks, flaws, hit point
//! state, point totals, and its place in the alternate-form/companion graph.
//! Derived quantities live in [`crate::engine::DerivedStats`] and are
//! recomputed from this record; the record itself stores only what cannot be
//! rederived.

use crate::attributes::{Attribute, AttributeScores, MAX_SCORE};
use crate::catalog::{Catalog, FeatMechanic};
use crate::equipment::{EquipmentItem, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structured custom detail attached to a taken feat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatDetail {
    /// A chosen attribute (Extraordinary Focus, Martial Focus, ...).
    Attribute(Attribute),
    /// An attribute substitution: `from`'s score stands in for `to`.
    Substitution { from: Attribute, to: Attribute },
    /// A chosen boon (Boon Access).
    Boon(String),
    /// A chosen bane (Bane Focus).
    Bane(String),
    /// A chosen weapon (Attack Specialization).
    Weapon(String),
    /// Free text.
    Text(String),
}

/// A feat the character has taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakenFeat {
    pub name: String,
    pub tier: u8,
    #[serde(default)]
    pub detail: Option<FeatDetail>,
    /// Cached from the catalog for display; stripped by the export transform.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effect: String,
}

/// Where an active boon or bane came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModifierSource {
    /// Invoked or inflicted in play.
    #[default]
    Invoked,
    /// Granted by an equipped item's universal property.
    Equipment(ItemId),
}

/// A boon currently active on the character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBoon {
    pub name: String,
    pub power_level: u8,
    /// Whether the invoker is spending actions to keep it up.
    #[serde(default)]
    pub sustaining: bool,
    #[serde(default)]
    pub source: ModifierSource,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effect: String,
}

/// A bane currently afflicting the character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBane {
    pub name: String,
    pub power_level: u8,
    /// Failed resist rolls so far.
    #[serde(default)]
    pub resists: u8,
    #[serde(default)]
    pub source: ModifierSource,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effect: String,
}

/// A perk the character has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakenPerk {
    pub name: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// A flaw the character has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakenFlaw {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A named advantage or disadvantage counter.
///
/// Entries with `derived` set are regenerated wholesale on every recompute;
/// the rest are user-entered and persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollModifier {
    pub name: String,
    /// Attribute the modifier applies to; `None` means all rolls.
    pub attribute: Option<Attribute>,
    pub count: u8,
    #[serde(default)]
    pub derived: bool,
}

/// Feat points lent to a tier-3 companion, recorded on the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatPointLoan {
    pub companion: CharacterId,
    pub points: u32,
}

/// The character's place in the relationship graph.
///
/// Exactly one variant holds at a time; a character is never both an
/// alternate form and a companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CharacterRole {
    #[default]
    Primary,
    AlternateForm {
        primary: CharacterId,
        tier: u8,
    },
    Companion {
        parent: CharacterId,
        tier: u8,
    },
}

impl CharacterRole {
    pub fn is_primary(&self) -> bool {
        matches!(self, CharacterRole::Primary)
    }

    pub fn is_alternate_form(&self) -> bool {
        matches!(self, CharacterRole::AlternateForm { .. })
    }

    pub fn is_companion(&self) -> bool {
        matches!(self, CharacterRole::Companion { .. })
    }

    /// The character this one hangs off, if any.
    pub fn parent_id(&self) -> Option<CharacterId> {
        match self {
            CharacterRole::Primary => None,
            CharacterRole::AlternateForm { primary, .. } => Some(*primary),
            CharacterRole::Companion { parent, .. } => Some(*parent),
        }
    }
}

/// Default ground speed in feet.
pub const DEFAULT_SPEED: u32 = 30;

/// A complete character record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,

    // Raw scores
    pub attributes: AttributeScores,

    // Gear and modifiers
    pub equipment: Vec<EquipmentItem>,
    pub feats: Vec<TakenFeat>,
    pub boons: Vec<ActiveBoon>,
    pub banes: Vec<ActiveBane>,
    pub perks: Vec<TakenPerk>,
    pub flaws: Vec<TakenFlaw>,
    pub advantages: Vec<RollModifier>,
    pub disadvantages: Vec<RollModifier>,

    // Hit points. `current_hp = max_hp - total_damage_taken`, clamped to
    // [0, max_hp]; lethal damage lowers max_hp independently.
    pub base_max_hp: i32,
    pub max_hp: i32,
    pub current_hp: i32,
    pub lethal_damage: i32,
    pub total_damage_taken: i32,

    // Points
    pub experience_points: u32,
    pub legend_points: u32,
    /// Recomputed from taken feats on every derive pass.
    #[serde(default)]
    pub used_feat_points: u32,
    /// Stored caps for alternate forms and companions; `None` on primaries.
    #[serde(default)]
    pub attribute_point_cap: Option<u32>,
    #[serde(default)]
    pub feat_point_cap: Option<u32>,
    /// Feat points lent out to tier-3 companions.
    #[serde(default)]
    pub feat_point_loans: Vec<FeatPointLoan>,

    // Movement
    pub base_speed: u32,

    // Relationships
    #[serde(default)]
    pub role: CharacterRole,
}

impl Character {
    /// A fresh character: zeroed attributes, empty modifier lists.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            attributes: AttributeScores::new(),
            equipment: Vec::new(),
            feats: Vec::new(),
            boons: Vec::new(),
            banes: Vec::new(),
            perks: Vec::new(),
            flaws: Vec::new(),
            advantages: Vec::new(),
            disadvantages: Vec::new(),
            base_max_hp: 10,
            max_hp: 10,
            current_hp: 10,
            lethal_damage: 0,
            total_damage_taken: 0,
            experience_points: 0,
            legend_points: 0,
            used_feat_points: 0,
            attribute_point_cap: None,
            feat_point_cap: None,
            feat_point_loans: Vec::new(),
            base_speed: DEFAULT_SPEED,
            role: CharacterRole::Primary,
        }
    }

    /// Character level: 1 + one per three experience points.
    pub fn level(&self) -> u8 {
        (1 + self.experience_points / 3).min(u8::MAX as u32) as u8
    }

    /// Highest tier of the named feat the character has taken, if any.
    pub fn feat_tier(&self, name: &str) -> Option<u8> {
        let lower = name.to_lowercase();
        self.feats
            .iter()
            .filter(|f| f.name.to_lowercase() == lower)
            .map(|f| f.tier)
            .max()
    }

    /// All taken feats whose catalog entry carries the given mechanic.
    pub fn feats_with_mechanic<'a>(
        &'a self,
        catalog: &'a Catalog,
        mechanic: FeatMechanic,
    ) -> impl Iterator<Item = &'a TakenFeat> {
        self.feats
            .iter()
            .filter(move |f| catalog.feat(&f.name).and_then(|e| e.mechanic) == Some(mechanic))
    }

    /// Highest taken tier among feats with the given mechanic.
    pub fn mechanic_tier(&self, catalog: &Catalog, mechanic: FeatMechanic) -> Option<u8> {
        self.feats_with_mechanic(catalog, mechanic)
            .map(|f| f.tier)
            .max()
    }

    /// The active bane with the given mechanic at the highest power level.
    pub fn active_bane_with_mechanic(
        &self,
        catalog: &Catalog,
        mechanic: crate::catalog::BaneMechanic,
    ) -> Option<&ActiveBane> {
        self.banes
            .iter()
            .filter(|b| catalog.bane(&b.name).and_then(|e| e.mechanic) == Some(mechanic))
            .max_by_key(|b| b.power_level)
    }

    /// The active boon with the given mechanic at the highest power level.
    pub fn active_boon_with_mechanic(
        &self,
        catalog: &Catalog,
        mechanic: crate::catalog::BoonMechanic,
    ) -> Option<&ActiveBoon> {
        self.boons
            .iter()
            .filter(|b| catalog.boon(&b.name).and_then(|e| e.mechanic) == Some(mechanic))
            .max_by_key(|b| b.power_level)
    }

    pub fn has_boon(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.boons.iter().any(|b| b.name.to_lowercase() == lower)
    }

    pub fn has_bane(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.banes.iter().any(|b| b.name.to_lowercase() == lower)
    }

    /// The currently equipped armor, if any.
    pub fn equipped_armor(&self) -> Option<&EquipmentItem> {
        self.equipment.iter().find(|i| i.equipped && i.is_armor())
    }

    /// All currently equipped weapons.
    pub fn equipped_weapons(&self) -> Vec<&EquipmentItem> {
        self.equipment
            .iter()
            .filter(|i| i.equipped && i.is_weapon())
            .collect()
    }

    pub fn item(&self, id: ItemId) -> Option<&EquipmentItem> {
        self.equipment.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut EquipmentItem> {
        self.equipment.iter_mut().find(|i| i.id == id)
    }

    /// Repair invariants after deserialization or a catalog change.
    ///
    /// Out-of-catalog modifiers are dropped with a warning; boons and banes
    /// granted by equipment that no longer exists are removed; attribute
    /// scores and hit points are clamped back into their domains.
    pub fn normalize(&mut self, catalog: &Catalog) {
        for attribute in Attribute::all() {
            let score = self.attributes.get(attribute);
            if score > MAX_SCORE {
                tracing::warn!(
                    character = %self.name,
                    attribute = attribute.name(),
                    score,
                    "attribute score out of range, clamping"
                );
                self.attributes.set(attribute, MAX_SCORE);
            }
        }

        for item in &mut self.equipment {
            if item.attribute.is_some() && item.attribute_power > MAX_SCORE {
                tracing::warn!(
                    character = %self.name,
                    item = %item.name,
                    power = item.attribute_power,
                    "item attribute power out of range, clamping"
                );
                item.attribute_power = MAX_SCORE;
            }
        }

        let name = self.name.clone();
        self.feats.retain(|f| match catalog.feat(&f.name) {
            Some(entry) if entry.valid_tier(f.tier) => true,
            Some(_) => {
                tracing::warn!(character = %name, feat = %f.name, tier = f.tier,
                    "feat tier not in catalog, dropping");
                false
            }
            None => {
                tracing::warn!(character = %name, feat = %f.name,
                    "feat not in catalog, dropping");
                false
            }
        });
        self.boons.retain(|b| match catalog.boon(&b.name) {
            Some(entry) if entry.valid_power_level(b.power_level) => true,
            _ => {
                tracing::warn!(character = %name, boon = %b.name,
                    power_level = b.power_level, "boon not in catalog, dropping");
                false
            }
        });
        self.banes.retain(|b| match catalog.bane(&b.name) {
            Some(entry) if entry.valid_power_level(b.power_level) => true,
            _ => {
                tracing::warn!(character = %name, bane = %b.name,
                    power_level = b.power_level, "bane not in catalog, dropping");
                false
            }
        });

        self.remove_orphaned_modifiers();

        self.lethal_damage = self.lethal_damage.max(0);
        self.total_damage_taken = self.total_damage_taken.max(0);
        self.max_hp = self.max_hp.clamp(1, self.base_max_hp.max(1));
        self.current_hp = self.current_hp.clamp(0, self.max_hp);
    }

    /// Drop equipment-granted boons and banes whose source item is gone or
    /// no longer equipped. Routine maintenance, not an error path.
    pub fn remove_orphaned_modifiers(&mut self) {
        let live: Vec<ItemId> = self
            .equipment
            .iter()
            .filter(|i| i.equipped)
            .map(|i| i.id)
            .collect();
        self.boons.retain(|b| match b.source {
            ModifierSource::Equipment(id) => live.contains(&id),
            ModifierSource::Invoked => true,
        });
        self.banes.retain(|b| match b.source {
            ModifierSource::Equipment(id) => live.contains(&id),
            ModifierSource::Invoked => true,
        });
    }
}
