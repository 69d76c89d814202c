//! Equipment: weapons, armor, and other gear.
//!
//! Items are owned by a character and flagged equipped or carried. Universal
//! properties attach boons and banes to an item; their side effects exist
//! only while the item is equipped.

use crate::attributes::Attribute;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for equipment items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weapon-specific fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponInfo {
    /// Requires both hands to wield.
    pub two_handed: bool,
    /// Maximum range in feet; melee when absent.
    pub range: Option<u32>,
    /// Guard bonus granted while wielded (the defensive property).
    pub defensive: u8,
    /// Banes this weapon can inflict.
    pub banes: Vec<String>,
}

/// Armor-specific fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmorInfo {
    /// Guard bonus while worn.
    pub guard_bonus: u8,
    /// Minimum effective fortitude required to wear it.
    pub required_fortitude: u8,
    /// Whether the armor slows the wearer.
    pub speed_penalty: bool,
}

/// What kind of item this is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EquipmentKind {
    Weapon(WeaponInfo),
    Armor(ArmorInfo),
    Item,
}

/// Universal item properties, each with its own parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UniversalProperty {
    /// Affects an area around the target.
    Area { radius_ft: u32 },
    /// Afflicts the wielder with a bane while equipped.
    Cursed { bane: String, power_level: u8 },
    /// Grants a boon that persists without being sustained.
    Persistent { boon: String, power_level: u8 },
    /// Grants a boon the wielder may sustain while the item is equipped.
    Reliable { boon: String, power_level: u8 },
    /// Bonus to attack rolls made with the item.
    Powerful { bonus: u8 },
    /// Bonus to damage dealt with the item.
    Deadly { bonus: u8 },
    /// Consumed on use.
    Expendable,
}

/// A single piece of equipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: ItemId,
    pub name: String,
    pub kind: EquipmentKind,
    pub equipped: bool,
    /// Attribute this item raises while equipped, if any.
    #[serde(default)]
    pub attribute: Option<Attribute>,
    /// Power level the bound attribute is raised to.
    #[serde(default)]
    pub attribute_power: u8,
    #[serde(default)]
    pub properties: Vec<UniversalProperty>,
}

impl EquipmentItem {
    pub fn new(name: impl Into<String>, kind: EquipmentKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            kind,
            equipped: false,
            attribute: None,
            attribute_power: 0,
            properties: Vec::new(),
        }
    }

    pub fn weapon(name: impl Into<String>, info: WeaponInfo) -> Self {
        Self::new(name, EquipmentKind::Weapon(info))
    }

    pub fn armor(name: impl Into<String>, info: ArmorInfo) -> Self {
        Self::new(name, EquipmentKind::Armor(info))
    }

    pub fn item(name: impl Into<String>) -> Self {
        Self::new(name, EquipmentKind::Item)
    }

    /// Bind an attribute the item raises to the given power level.
    pub fn with_attribute(mut self, attribute: Attribute, power_level: u8) -> Self {
        self.attribute = Some(attribute);
        self.attribute_power = power_level;
        self
    }

    pub fn with_property(mut self, property: UniversalProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn is_weapon(&self) -> bool {
        matches!(self.kind, EquipmentKind::Weapon(_))
    }

    pub fn is_armor(&self) -> bool {
        matches!(self.kind, EquipmentKind::Armor(_))
    }

    pub fn as_weapon(&self) -> Option<&WeaponInfo> {
        match &self.kind {
            EquipmentKind::Weapon(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_armor(&self) -> Option<&ArmorInfo> {
        match &self.kind {
            EquipmentKind::Armor(info) => Some(info),
            _ => None,
        }
    }

    /// Hands needed to wield this item (weapons only).
    pub fn hands(&self) -> u8 {
        match &self.kind {
            EquipmentKind::Weapon(info) if info.two_handed => 2,
            EquipmentKind::Weapon(_) => 1,
            _ => 0,
        }
    }
}
