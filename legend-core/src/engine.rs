//! The derived-stat engine and the public mutation surface.
//!
//! Every mutating operation is a transaction: validate, mutate, recompute,
//! synchronize. Validation failures reject the whole operation with an
//! [`OpError`] and leave no partial state. Recomputation is synchronous and
//! idempotent; it runs to completion before the operation returns.

use crate::attributes::{score_cost, Attribute, Defense, MAX_SCORE};
use crate::catalog::{Catalog, CustomInput, FeatMechanic};
use crate::character::{
    ActiveBane, ActiveBoon, Character, CharacterId, CharacterRole, FeatDetail, ModifierSource,
    TakenFeat, TakenFlaw, TakenPerk,
};
use crate::eligibility::{self, FeatAvailability, PowerAvailability};
use crate::equipment::{EquipmentItem, ItemId, UniversalProperty};
use crate::resolve::{self, AttributeDice, Movement, PointBudget};
use crate::roster::{Roster, SyncField};
use std::collections::HashMap;
use thiserror::Error;

/// A rejected mutation. The operation was validated up front and nothing
/// was changed.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("No such character: {0}")]
    UnknownCharacter(CharacterId),

    #[error("No such item: {0}")]
    UnknownItem(ItemId),

    #[error("No such feat in the catalog: {0}")]
    UnknownFeat(String),

    #[error("No such boon in the catalog: {0}")]
    UnknownBoon(String),

    #[error("No such bane in the catalog: {0}")]
    UnknownBane(String),

    #[error("No such perk in the catalog: {0}")]
    UnknownPerk(String),

    #[error("No such flaw in the catalog: {0}")]
    UnknownFlaw(String),

    #[error("{feat} has no tier {tier}")]
    InvalidTier { feat: String, tier: u8 },

    #[error("{name} has no power level {power_level}")]
    InvalidPowerLevel { name: String, power_level: u8 },

    #[error("Prerequisites for {feat} tier {tier} are not met")]
    PrerequisiteNotMet { feat: String, tier: u8 },

    #[error("{feat} is already taken and cannot be taken again")]
    DuplicateFeat { feat: String },

    #[error("{feat} requires a custom detail")]
    CustomDetailRequired { feat: String },

    #[error("Attribute score {score} is out of range (0-9)")]
    ScoreOutOfRange { score: u8 },

    #[error("Not enough attribute points: need {needed}, have {available}")]
    InsufficientAttributePoints { needed: u32, available: u32 },

    #[error("Not enough feat points: need {needed}, have {available}")]
    InsufficientFeatPoints { needed: u32, available: u32 },

    #[error("Armor requires fortitude {required}, character has {fortitude}")]
    ArmorTooHeavy { required: u8, fortitude: u8 },

    #[error("Both hands are already full")]
    HandsFull,

    #[error("{name} is not accessible at power level {power_level}")]
    PowerLevelNotAccessible { name: String, power_level: u8 },

    #[error("Requires the {feat} feat at tier {tier}")]
    FeatRequired { feat: String, tier: u8 },
}

/// A snapshot of every derived quantity for one character.
#[derive(Debug, Clone)]
pub struct DerivedStats {
    pub attributes: HashMap<Attribute, u8>,
    pub dice: HashMap<Attribute, AttributeDice>,
    pub guard: i32,
    pub toughness: i32,
    pub resolve: i32,
    pub base_max_hp: i32,
    pub max_hp: i32,
    pub current_hp: i32,
    pub movement: Movement,
    pub initiative: AttributeDice,
    pub level: u8,
    pub attribute_points: PointBudget,
    pub feat_points: PointBudget,
}

impl Roster {
    // ========================================================================
    // Queries
    // ========================================================================

    /// Compute the full derived snapshot for one character.
    pub fn derived(&self, id: CharacterId, catalog: &Catalog) -> Result<DerivedStats, OpError> {
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;

        let attributes = resolve::effective_scores(ch, catalog);
        let dice = Attribute::all()
            .into_iter()
            .map(|a| (a, resolve::attribute_dice(ch, catalog, a)))
            .collect();

        Ok(DerivedStats {
            attributes,
            dice,
            guard: resolve::defense(ch, catalog, Defense::Guard),
            toughness: resolve::defense(ch, catalog, Defense::Toughness),
            resolve: resolve::defense(ch, catalog, Defense::Resolve),
            base_max_hp: ch.base_max_hp,
            max_hp: ch.max_hp,
            current_hp: ch.current_hp,
            movement: resolve::movement(ch, catalog),
            initiative: resolve::initiative_dice(ch, catalog),
            level: ch.level(),
            attribute_points: resolve::attribute_budget(ch),
            feat_points: resolve::feat_budget(ch, catalog),
        })
    }

    pub fn available_feats(
        &self,
        id: CharacterId,
        catalog: &Catalog,
    ) -> Result<Vec<FeatAvailability>, OpError> {
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        Ok(eligibility::available_feats(ch, catalog))
    }

    pub fn available_boons(
        &self,
        id: CharacterId,
        catalog: &Catalog,
    ) -> Result<Vec<PowerAvailability>, OpError> {
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        Ok(eligibility::available_boons(ch, catalog))
    }

    pub fn available_banes(
        &self,
        id: CharacterId,
        catalog: &Catalog,
    ) -> Result<Vec<PowerAvailability>, OpError> {
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        Ok(eligibility::available_banes(ch, catalog))
    }

    // ========================================================================
    // Recomputation
    // ========================================================================

    /// Recompute one record's stored derived state.
    pub(crate) fn recompute(&mut self, id: CharacterId, catalog: &Catalog) {
        let Some(ch) = self.get_mut(id) else {
            return;
        };

        ch.remove_orphaned_modifiers();

        let base = resolve::base_max_hp(ch, catalog);
        ch.base_max_hp = base;
        ch.max_hp = (base - ch.lethal_damage).max(1);
        // The controlling invariant: current = max - total damage, in
        // [0, max]. Lowering max therefore lowers current by the same delta.
        ch.current_hp = (ch.max_hp - ch.total_damage_taken).clamp(0, ch.max_hp);

        ch.used_feat_points = resolve::used_feat_points(ch, catalog);

        let (advantages, disadvantages) = resolve::derived_roll_modifiers(ch, catalog);
        ch.advantages.retain(|m| !m.derived);
        ch.advantages.extend(advantages);
        ch.disadvantages.retain(|m| !m.derived);
        ch.disadvantages.extend(disadvantages);
    }

    /// Recompute the whole linked structure a character belongs to: caps
    /// first, in hierarchy order, then every member and their companions.
    pub(crate) fn recompute_tree(&mut self, id: CharacterId, catalog: &Catalog) {
        let root = self.cap_root(id);
        self.recalculate_caps(root, catalog);

        for member in self.related_characters(root) {
            self.recompute(member, catalog);
            for companion in self.companions_of(member) {
                self.recompute(companion, catalog);
            }
        }
    }

    /// Mutation tail shared by every operation: synchronize the designated
    /// fields, then recompute the affected tree.
    fn finish(&mut self, id: CharacterId, fields: &[SyncField], catalog: &Catalog) {
        if !fields.is_empty() {
            self.sync_from(id, fields);
        }
        self.recompute_tree(id, catalog);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a fresh character and return its id.
    pub fn create_character(
        &mut self,
        name: impl Into<String>,
        catalog: &Catalog,
    ) -> CharacterId {
        let id = self.insert(Character::new(name));
        self.recompute(id, catalog);
        id
    }

    /// Delete a character, detaching all linked records.
    pub fn delete_character(&mut self, id: CharacterId) -> Result<(), OpError> {
        self.remove_character(id)
            .map(|_| ())
            .ok_or(OpError::UnknownCharacter(id))
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Set an attribute score, spending or refunding points.
    pub fn set_attribute(
        &mut self,
        id: CharacterId,
        attribute: Attribute,
        score: u8,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        if score > MAX_SCORE {
            return Err(OpError::ScoreOutOfRange { score });
        }
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        let budget = resolve::attribute_budget(ch);
        let current = ch.attributes.get(attribute);
        let new_spent = budget.spent - score_cost(current) + score_cost(score);
        if new_spent > budget.total {
            return Err(OpError::InsufficientAttributePoints {
                needed: new_spent,
                available: budget.total,
            });
        }

        self.get_mut(id)
            .expect("validated above")
            .attributes
            .set(attribute, score);
        self.finish(id, &[], catalog);
        Ok(())
    }

    // ========================================================================
    // Equipment
    // ========================================================================

    /// Add an item to the character's gear, unequipped.
    pub fn add_equipment(
        &mut self,
        id: CharacterId,
        mut item: EquipmentItem,
        catalog: &Catalog,
    ) -> Result<ItemId, OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        item.equipped = false;
        let item_id = item.id;
        ch.equipment.push(item);
        self.finish(id, &[SyncField::Equipment], catalog);
        Ok(item_id)
    }

    /// Remove an item entirely. Boons and banes it granted are cleaned up.
    pub fn remove_equipment(
        &mut self,
        id: CharacterId,
        item_id: ItemId,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        if ch.item(item_id).is_none() {
            return Err(OpError::UnknownItem(item_id));
        }
        ch.equipment.retain(|i| i.id != item_id);
        ch.remove_orphaned_modifiers();
        self.finish(
            id,
            &[SyncField::Equipment, SyncField::Boons, SyncField::Banes],
            catalog,
        );
        Ok(())
    }

    /// Equip an item.
    ///
    /// Armor replaces any armor already worn and requires the character's
    /// effective fortitude to meet its requirement. Weapons occupy hands:
    /// two in total, both for a two-handed weapon unless the character has
    /// Two Weapon Brute. Universal properties attach their boons and banes
    /// when the item is equipped.
    pub fn equip(
        &mut self,
        id: CharacterId,
        item_id: ItemId,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        let item = ch.item(item_id).ok_or(OpError::UnknownItem(item_id))?;

        if let Some(armor) = item.as_armor() {
            let fortitude = resolve::effective_score(ch, catalog, Attribute::Fortitude);
            if fortitude < armor.required_fortitude {
                return Err(OpError::ArmorTooHeavy {
                    required: armor.required_fortitude,
                    fortitude,
                });
            }
        }

        if item.is_weapon() {
            let brute = ch
                .mechanic_tier(catalog, FeatMechanic::TwoWeaponBrute)
                .is_some();
            let hands_of = |i: &EquipmentItem| {
                if brute {
                    i.hands().min(1)
                } else {
                    i.hands()
                }
            };
            let used: u8 = ch.equipped_weapons().iter().map(|&i| hands_of(i)).sum();
            if used + hands_of(item) > 2 {
                return Err(OpError::HandsFull);
            }
        }

        let replace_armor = item.is_armor();
        let ch = self.get_mut(id).expect("validated above");
        if replace_armor {
            for other in ch.equipment.iter_mut().filter(|i| i.is_armor()) {
                other.equipped = false;
            }
        }

        let item = ch.item_mut(item_id).expect("validated above");
        item.equipped = true;
        let properties = item.properties.clone();
        let item_name = item.name.clone();

        // Universal property side effects exist only while the item is
        // equipped; attach them now, tagged with the item as their source.
        for property in properties {
            match property {
                UniversalProperty::Cursed { bane, power_level } => {
                    match catalog.bane(&bane) {
                        Some(entry) if entry.valid_power_level(power_level) => {
                            ch.banes.push(ActiveBane {
                                name: entry.name.clone(),
                                power_level,
                                resists: 0,
                                source: ModifierSource::Equipment(item_id),
                                description: entry.description.clone(),
                                effect: entry.effect.clone(),
                            });
                        }
                        _ => {
                            tracing::warn!(item = %item_name, bane = %bane, power_level,
                                "cursed property names an unknown bane, skipping");
                        }
                    }
                }
                UniversalProperty::Persistent { boon, power_level }
                | UniversalProperty::Reliable { boon, power_level } => {
                    match catalog.boon(&boon) {
                        Some(entry) if entry.valid_power_level(power_level) => {
                            ch.boons.push(ActiveBoon {
                                name: entry.name.clone(),
                                power_level,
                                sustaining: false,
                                source: ModifierSource::Equipment(item_id),
                                description: entry.description.clone(),
                                effect: entry.effect.clone(),
                            });
                        }
                        _ => {
                            tracing::warn!(item = %item_name, boon = %boon, power_level,
                                "item property names an unknown boon, skipping");
                        }
                    }
                }
                _ => {}
            }
        }

        self.finish(
            id,
            &[SyncField::Equipment, SyncField::Boons, SyncField::Banes],
            catalog,
        );
        Ok(())
    }

    /// Unequip an item. Boons and banes it granted are cleaned up.
    pub fn unequip(
        &mut self,
        id: CharacterId,
        item_id: ItemId,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        let item = ch.item_mut(item_id).ok_or(OpError::UnknownItem(item_id))?;
        item.equipped = false;
        ch.remove_orphaned_modifiers();
        self.finish(
            id,
            &[SyncField::Equipment, SyncField::Boons, SyncField::Banes],
            catalog,
        );
        Ok(())
    }

    // ========================================================================
    // Feats
    // ========================================================================

    /// Take a feat at a tier. A non-repeatable feat already taken at a lower
    /// tier is upgraded in place.
    pub fn add_feat(
        &mut self,
        id: CharacterId,
        name: &str,
        tier: u8,
        detail: Option<FeatDetail>,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let entry = catalog
            .feat(name)
            .ok_or_else(|| OpError::UnknownFeat(name.to_string()))?;
        if !entry.valid_tier(tier) {
            return Err(OpError::InvalidTier {
                feat: entry.name.clone(),
                tier,
            });
        }
        if entry.custom != CustomInput::None && detail.is_none() {
            return Err(OpError::CustomDetailRequired {
                feat: entry.name.clone(),
            });
        }

        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        let current = ch.feat_tier(&entry.name);
        if !entry.repeatable {
            if let Some(current) = current {
                if tier <= current {
                    return Err(OpError::DuplicateFeat {
                        feat: entry.name.clone(),
                    });
                }
            }
        }
        if !eligibility::feat_tier_available(ch, catalog, &entry.name, tier) {
            return Err(OpError::PrerequisiteNotMet {
                feat: entry.name.clone(),
                tier,
            });
        }

        // Upgrading pays only the difference; a repeatable feat pays in full.
        let budget = resolve::feat_budget(ch, catalog);
        let old_cost = if entry.repeatable {
            0
        } else {
            current.map(|t| entry.cost as u32 * t as u32).unwrap_or(0)
        };
        let new_spent = budget.spent - old_cost + entry.cost as u32 * tier as u32;
        if new_spent > budget.total {
            return Err(OpError::InsufficientFeatPoints {
                needed: new_spent,
                available: budget.total,
            });
        }

        let name = entry.name.clone();
        let description = entry.description.clone();
        let effect = entry.effect(tier).unwrap_or("").to_string();
        let repeatable = entry.repeatable;
        let lower = name.to_lowercase();

        let ch = self.get_mut(id).expect("validated above");
        let existing = if repeatable {
            None
        } else {
            ch.feats
                .iter()
                .position(|f| f.name.to_lowercase() == lower)
        };
        match existing {
            Some(index) => {
                let feat = &mut ch.feats[index];
                feat.tier = tier;
                feat.detail = detail;
                feat.description = description;
                feat.effect = effect;
            }
            None => ch.feats.push(TakenFeat {
                name,
                tier,
                detail,
                description,
                effect,
            }),
        }

        self.finish(id, &[], catalog);
        Ok(())
    }

    /// Change a taken feat's tier, revalidating prerequisites and cost.
    pub fn set_feat_tier(
        &mut self,
        id: CharacterId,
        name: &str,
        tier: u8,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let entry = catalog
            .feat(name)
            .ok_or_else(|| OpError::UnknownFeat(name.to_string()))?;
        if !entry.valid_tier(tier) {
            return Err(OpError::InvalidTier {
                feat: entry.name.clone(),
                tier,
            });
        }

        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        let lower = entry.name.to_lowercase();
        let current = ch
            .feat_tier(&entry.name)
            .ok_or_else(|| OpError::UnknownFeat(entry.name.clone()))?;

        let budget = resolve::feat_budget(ch, catalog);
        let new_spent = budget.spent - entry.cost as u32 * current as u32
            + entry.cost as u32 * tier as u32;
        if new_spent > budget.total {
            return Err(OpError::InsufficientFeatPoints {
                needed: new_spent,
                available: budget.total,
            });
        }

        let scores = resolve::effective_scores(ch, catalog);
        if let Some(prereq) = entry.prerequisite(tier) {
            if !eligibility::prerequisite_met(prereq, &scores, ch) {
                return Err(OpError::PrerequisiteNotMet {
                    feat: entry.name.clone(),
                    tier,
                });
            }
        }

        let effect = entry.effect(tier).unwrap_or("").to_string();
        let ch = self.get_mut(id).expect("validated above");
        if let Some(feat) = ch
            .feats
            .iter_mut()
            .find(|f| f.name.to_lowercase() == lower && f.tier == current)
        {
            feat.tier = tier;
            feat.effect = effect;
        }

        self.finish(id, &[], catalog);
        Ok(())
    }

    /// Remove one taken instance of a feat.
    pub fn remove_feat(
        &mut self,
        id: CharacterId,
        name: &str,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        let lower = name.to_lowercase();
        let index = ch
            .feats
            .iter()
            .rposition(|f| f.name.to_lowercase() == lower)
            .ok_or_else(|| OpError::UnknownFeat(name.to_string()))?;
        ch.feats.remove(index);
        self.finish(id, &[], catalog);
        Ok(())
    }

    // ========================================================================
    // Boons and banes
    // ========================================================================

    /// Invoke a boon on this character at a power level their attributes (or
    /// a Boon Access feat) can reach.
    pub fn add_boon(
        &mut self,
        id: CharacterId,
        name: &str,
        power_level: u8,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let entry = catalog
            .boon(name)
            .ok_or_else(|| OpError::UnknownBoon(name.to_string()))?;
        if !entry.valid_power_level(power_level) {
            return Err(OpError::InvalidPowerLevel {
                name: entry.name.clone(),
                power_level,
            });
        }
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        if !eligibility::boon_power_available(ch, catalog, &entry.name, power_level) {
            return Err(OpError::PowerLevelNotAccessible {
                name: entry.name.clone(),
                power_level,
            });
        }

        let boon = ActiveBoon {
            name: entry.name.clone(),
            power_level,
            sustaining: true,
            source: ModifierSource::Invoked,
            description: entry.description.clone(),
            effect: entry.effect.clone(),
        };
        self.get_mut(id).expect("validated above").boons.push(boon);
        self.finish(id, &[SyncField::Boons], catalog);
        Ok(())
    }

    /// Drop an invoked boon. Equipment-granted boons stay until the item
    /// goes.
    pub fn remove_boon(
        &mut self,
        id: CharacterId,
        name: &str,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        let lower = name.to_lowercase();
        let index = ch
            .boons
            .iter()
            .rposition(|b| {
                b.name.to_lowercase() == lower && b.source == ModifierSource::Invoked
            })
            .ok_or_else(|| OpError::UnknownBoon(name.to_string()))?;
        ch.boons.remove(index);
        self.finish(id, &[SyncField::Boons], catalog);
        Ok(())
    }

    /// Afflict this character with a bane. The power level must exist for
    /// the bane; the victim's own attributes are not a gate.
    pub fn add_bane(
        &mut self,
        id: CharacterId,
        name: &str,
        power_level: u8,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let entry = catalog
            .bane(name)
            .ok_or_else(|| OpError::UnknownBane(name.to_string()))?;
        if !entry.valid_power_level(power_level) {
            return Err(OpError::InvalidPowerLevel {
                name: entry.name.clone(),
                power_level,
            });
        }

        let bane = ActiveBane {
            name: entry.name.clone(),
            power_level,
            resists: 0,
            source: ModifierSource::Invoked,
            description: entry.description.clone(),
            effect: entry.effect.clone(),
        };
        self.get_mut(id)
            .ok_or(OpError::UnknownCharacter(id))?
            .banes
            .push(bane);
        self.finish(id, &[SyncField::Banes], catalog);
        Ok(())
    }

    /// Shake off an invoked bane.
    pub fn remove_bane(
        &mut self,
        id: CharacterId,
        name: &str,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        let lower = name.to_lowercase();
        let index = ch
            .banes
            .iter()
            .rposition(|b| {
                b.name.to_lowercase() == lower && b.source == ModifierSource::Invoked
            })
            .ok_or_else(|| OpError::UnknownBane(name.to_string()))?;
        ch.banes.remove(index);
        self.finish(id, &[SyncField::Banes], catalog);
        Ok(())
    }

    // ========================================================================
    // Perks and flaws
    // ========================================================================

    pub fn add_perk(
        &mut self,
        id: CharacterId,
        name: &str,
        detail: Option<String>,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let entry = catalog
            .perk(name)
            .ok_or_else(|| OpError::UnknownPerk(name.to_string()))?;
        let perk = TakenPerk {
            name: entry.name.clone(),
            detail,
            description: entry.description.clone(),
        };
        self.get_mut(id)
            .ok_or(OpError::UnknownCharacter(id))?
            .perks
            .push(perk);
        self.finish(id, &[SyncField::Perks], catalog);
        Ok(())
    }

    pub fn remove_perk(
        &mut self,
        id: CharacterId,
        name: &str,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        let lower = name.to_lowercase();
        let index = ch
            .perks
            .iter()
            .rposition(|p| p.name.to_lowercase() == lower)
            .ok_or_else(|| OpError::UnknownPerk(name.to_string()))?;
        ch.perks.remove(index);
        self.finish(id, &[SyncField::Perks], catalog);
        Ok(())
    }

    pub fn add_flaw(
        &mut self,
        id: CharacterId,
        name: &str,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let entry = catalog
            .flaw(name)
            .ok_or_else(|| OpError::UnknownFlaw(name.to_string()))?;
        let flaw = TakenFlaw {
            name: entry.name.clone(),
            description: entry.description.clone(),
        };
        self.get_mut(id)
            .ok_or(OpError::UnknownCharacter(id))?
            .flaws
            .push(flaw);
        self.finish(id, &[SyncField::Flaws], catalog);
        Ok(())
    }

    pub fn remove_flaw(
        &mut self,
        id: CharacterId,
        name: &str,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        let lower = name.to_lowercase();
        let index = ch
            .flaws
            .iter()
            .rposition(|f| f.name.to_lowercase() == lower)
            .ok_or_else(|| OpError::UnknownFlaw(name.to_string()))?;
        ch.flaws.remove(index);
        self.finish(id, &[SyncField::Flaws], catalog);
        Ok(())
    }

    // ========================================================================
    // Damage, healing, points
    // ========================================================================

    /// Apply damage. Damage state propagates across the whole tree,
    /// companions included.
    pub fn apply_damage(
        &mut self,
        id: CharacterId,
        amount: i32,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        ch.total_damage_taken += amount.max(0);
        self.finish(id, &[SyncField::TotalDamage], catalog);
        Ok(())
    }

    /// Heal damage, never past full.
    pub fn heal(
        &mut self,
        id: CharacterId,
        amount: i32,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        ch.total_damage_taken = (ch.total_damage_taken - amount.max(0)).max(0);
        self.finish(id, &[SyncField::TotalDamage], catalog);
        Ok(())
    }

    /// Set lethal damage, which suppresses maximum hit points until healed.
    pub fn set_lethal_damage(
        &mut self,
        id: CharacterId,
        amount: i32,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        ch.lethal_damage = amount.max(0);
        self.finish(id, &[SyncField::LethalDamage], catalog);
        Ok(())
    }

    /// Set experience points; level and point budgets follow from these.
    pub fn set_experience(
        &mut self,
        id: CharacterId,
        experience: u32,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        ch.experience_points = experience;
        self.finish(id, &[SyncField::ExperiencePoints], catalog);
        Ok(())
    }

    pub fn set_legend_points(
        &mut self,
        id: CharacterId,
        legend: u32,
        catalog: &Catalog,
    ) -> Result<(), OpError> {
        let ch = self.get_mut(id).ok_or(OpError::UnknownCharacter(id))?;
        ch.legend_points = legend;
        self.finish(id, &[SyncField::LegendPoints], catalog);
        Ok(())
    }

    // ========================================================================
    // Linked characters
    // ========================================================================

    /// Create an alternate form for a character who has the Alternate Form
    /// feat at the requested tier or higher.
    pub fn grant_alternate_form(
        &mut self,
        id: CharacterId,
        name: impl Into<String>,
        tier: u8,
        catalog: &Catalog,
    ) -> Result<CharacterId, OpError> {
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        let granted = ch
            .mechanic_tier(catalog, FeatMechanic::AlternateForm)
            .unwrap_or(0);
        if granted < tier {
            return Err(OpError::FeatRequired {
                feat: "Alternate Form".to_string(),
                tier,
            });
        }

        let mut form = Character::new(name);
        form.role = CharacterRole::AlternateForm { primary: id, tier };
        let form_id = self.insert(form);

        // New forms start with the primary's shared state.
        self.sync_from(id, &SyncField::all());
        self.recompute_tree(id, catalog);
        Ok(form_id)
    }

    /// Create a companion for a character who has the Companion feat at the
    /// requested tier or higher.
    pub fn grant_companion(
        &mut self,
        id: CharacterId,
        name: impl Into<String>,
        tier: u8,
        catalog: &Catalog,
    ) -> Result<CharacterId, OpError> {
        let ch = self.get(id).ok_or(OpError::UnknownCharacter(id))?;
        let granted = ch
            .mechanic_tier(catalog, FeatMechanic::Companion)
            .unwrap_or(0);
        if granted < tier {
            return Err(OpError::FeatRequired {
                feat: "Companion".to_string(),
                tier,
            });
        }

        let mut companion = Character::new(name);
        companion.role = CharacterRole::Companion { parent: id, tier };
        let companion_id = self.insert(companion);

        self.sync_from(
            id,
            &[
                SyncField::LegendPoints,
                SyncField::ExperiencePoints,
                SyncField::TotalDamage,
                SyncField::LethalDamage,
            ],
        );
        self.recompute_tree(id, catalog);
        Ok(companion_id)
    }
}
