//! The modifier resolver.
//!
//! Pure functions that compute one derived quantity each from a character
//! record and the catalog, folding every applicable modifier in a fixed
//! precedence order. Resolvers are deterministic and side-effect-free;
//! missing or malformed modifier data contributes zero and logs a warning.

use crate::attributes::{dice_for_score, Attribute, Defense};
use crate::catalog::{BaneMechanic, BoonMechanic, Catalog, FeatMechanic};
use crate::character::{Character, FeatDetail, RollModifier};
use crate::dice::DicePool;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Effective attributes
// ============================================================================

/// Effective score for one attribute.
///
/// Order: base score, replaced verbatim by an Attribute Substitution source
/// score, then raised to an equipped item's bound power level if that is
/// higher (max, not sum).
pub fn effective_score(character: &Character, catalog: &Catalog, attribute: Attribute) -> u8 {
    let mut score = character.attributes.get(attribute);

    for feat in character.feats_with_mechanic(catalog, FeatMechanic::AttributeSubstitution) {
        match &feat.detail {
            Some(FeatDetail::Substitution { from, to }) if *to == attribute => {
                score = character.attributes.get(*from);
                break;
            }
            Some(FeatDetail::Substitution { .. }) => {}
            _ => {
                tracing::warn!(character = %character.name, feat = %feat.name,
                    "attribute substitution without a from/to pair, ignoring");
            }
        }
    }

    for item in character.equipment.iter().filter(|i| i.equipped) {
        let power = item.attribute_power.min(crate::attributes::MAX_SCORE);
        if item.attribute == Some(attribute) && power > score {
            score = power;
        }
    }

    score
}

/// Effective scores for all eighteen attributes.
pub fn effective_scores(character: &Character, catalog: &Catalog) -> HashMap<Attribute, u8> {
    Attribute::all()
        .into_iter()
        .map(|a| (a, effective_score(character, catalog, a)))
        .collect()
}

// ============================================================================
// Attribute dice
// ============================================================================

/// The dice an attribute contributes to action rolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeDice {
    /// Score 0: no dice.
    None,
    Pool(DicePool),
    /// Martial Focus: the base pool for ordinary rolls and the raised pool
    /// for attacks, shown side by side.
    Split { base: DicePool, focused: DicePool },
}

impl fmt::Display for AttributeDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeDice::None => write!(f, "-"),
            AttributeDice::Pool(pool) => write!(f, "{pool}"),
            AttributeDice::Split { base, focused } => write!(f, "{base} / {focused}"),
        }
    }
}

/// Dice for one attribute at its effective score.
///
/// Extraordinary Focus bumps the table index by one before lookup. Martial
/// Focus (agility and might only) instead yields a split base/raised
/// presentation. The two are distinguished, never combined.
pub fn attribute_dice(character: &Character, catalog: &Catalog, attribute: Attribute) -> AttributeDice {
    let score = effective_score(character, catalog, attribute);

    let martial = matches!(attribute, Attribute::Agility | Attribute::Might)
        && character
            .feats_with_mechanic(catalog, FeatMechanic::MartialFocus)
            .any(|f| matches!(f.detail, Some(FeatDetail::Attribute(a)) if a == attribute));
    if martial {
        return match (dice_for_score(score), dice_for_score(score + 1)) {
            (Some(base), Some(focused)) => AttributeDice::Split { base, focused },
            _ => AttributeDice::None,
        };
    }

    let focused = character
        .feats_with_mechanic(catalog, FeatMechanic::ExtraordinaryFocus)
        .any(|f| matches!(f.detail, Some(FeatDetail::Attribute(a)) if a == attribute));
    let lookup = if focused { score + 1 } else { score };

    match dice_for_score(lookup) {
        Some(pool) => AttributeDice::Pool(pool),
        None => AttributeDice::None,
    }
}

/// Initiative dice: agility's attribute dice, rolled alongside the d20.
pub fn initiative_dice(character: &Character, catalog: &Catalog) -> AttributeDice {
    attribute_dice(character, catalog, Attribute::Agility)
}

// ============================================================================
// Defenses
// ============================================================================

/// One defense value.
///
/// `10 + attribute pair + armor (guard only) + feat bonus + boon/bane
/// bonus`. An active Stupefied bane overrides resolve to a flat 10.
pub fn defense(character: &Character, catalog: &Catalog, which: Defense) -> i32 {
    if which == Defense::Resolve
        && character
            .active_bane_with_mechanic(catalog, BaneMechanic::Stupefied)
            .is_some()
    {
        return 10;
    }

    let (a, b) = which.attribute_pair();
    let pair = effective_score(character, catalog, a) as i32
        + effective_score(character, catalog, b) as i32;

    let armor = if which == Defense::Guard {
        character
            .equipped_armor()
            .and_then(|i| i.as_armor())
            .map(|a| a.guard_bonus as i32)
            .unwrap_or(0)
    } else {
        0
    };

    10 + pair
        + armor
        + feat_defense_bonus(character, catalog, which)
        + boon_bane_defense_bonus(character, catalog, which)
}

/// Accumulated feat contributions to one defense. Each feat's condition is
/// evaluated independently.
pub fn feat_defense_bonus(character: &Character, catalog: &Catalog, which: Defense) -> i32 {
    let mut bonus = 0;

    if let Some(tier) = character.mechanic_tier(catalog, FeatMechanic::ExtraordinaryDefense) {
        bonus += tier as i32;
    }

    if which == Defense::Guard {
        let wearing_armor = character.equipped_armor().is_some();

        if wearing_armor
            && character
                .mechanic_tier(catalog, FeatMechanic::ArmorMastery)
                .is_some()
        {
            bonus += 1;
        }
        if !wearing_armor {
            if let Some(tier) = character.mechanic_tier(catalog, FeatMechanic::NaturalDefense) {
                bonus += tier as i32;
            }
        }

        let weapons = character.equipped_weapons();
        if weapons.len() >= 2
            && character
                .mechanic_tier(catalog, FeatMechanic::TwoWeaponDefense)
                .is_some()
        {
            bonus += 1;
        }
        bonus += weapons
            .iter()
            .filter_map(|w| w.as_weapon())
            .map(|w| w.defensive as i32)
            .max()
            .unwrap_or(0);
    }

    if which == Defense::Resolve {
        if let Some(tier) = character.mechanic_tier(catalog, FeatMechanic::IndomitableResolve) {
            bonus += tier as i32;
        }
    }

    bonus
}

/// Accumulated boon and bane contributions to one defense.
///
/// Named entries use hard-coded power-level tables; Fatigued at level 4 or
/// higher cancels the defense's attribute-pair bonus outright.
pub fn boon_bane_defense_bonus(character: &Character, catalog: &Catalog, which: Defense) -> i32 {
    let mut bonus = 0;

    if which == Defense::Guard {
        if let Some(boon) = character.active_boon_with_mechanic(catalog, BoonMechanic::Concealment)
        {
            bonus += (boon.power_level as i32 - 3).max(0);
        }
        if let Some(boon) = character.active_boon_with_mechanic(catalog, BoonMechanic::Haste) {
            bonus += match boon.power_level {
                7 | 8 => 1,
                9 => 2,
                _ => 0,
            };
        }
        if character
            .active_bane_with_mechanic(catalog, BaneMechanic::Blinded)
            .is_some()
        {
            bonus -= 3;
        }
    }

    if character
        .active_bane_with_mechanic(catalog, BaneMechanic::Sickened)
        .is_some()
    {
        bonus -= 2;
    }

    if let Some(bane) = character.active_bane_with_mechanic(catalog, BaneMechanic::Fatigued) {
        if bane.power_level >= 4 {
            let (a, b) = which.attribute_pair();
            bonus -= effective_score(character, catalog, a) as i32
                + effective_score(character, catalog, b) as i32;
        }
    }

    bonus
}

// ============================================================================
// Movement
// ============================================================================

/// The four movement speeds, in feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub ground: u32,
    pub climb: u32,
    pub swim: u32,
    pub fly: u32,
}

/// Ground speed after every modifier.
///
/// Order: base + Fleet of Foot, armor penalty, then Haste/Slowed. Haste and
/// Slowed together cancel exactly, at every power level. Immobile overrides
/// everything to 0.
pub fn ground_speed(character: &Character, catalog: &Catalog) -> u32 {
    if character
        .active_bane_with_mechanic(catalog, BaneMechanic::Immobile)
        .is_some()
    {
        return 0;
    }

    let mut speed = character.base_speed as i32;

    if let Some(tier) = character.mechanic_tier(catalog, FeatMechanic::FleetOfFoot) {
        speed += tier as i32 * 5;
    }

    let armor_slows = character
        .equipped_armor()
        .and_then(|i| i.as_armor())
        .map(|a| a.speed_penalty)
        .unwrap_or(false);
    if armor_slows {
        let mastery = character
            .mechanic_tier(catalog, FeatMechanic::ArmorMastery)
            .unwrap_or(0);
        if mastery < 2 {
            speed -= 5;
        }
    }

    let speed = speed.max(0) as u32;

    let haste = character.active_boon_with_mechanic(catalog, BoonMechanic::Haste);
    let slowed = character.active_bane_with_mechanic(catalog, BaneMechanic::Slowed);

    match (haste, slowed) {
        // They do not both apply; the speed stays at its un-hastened,
        // un-slowed value.
        (Some(_), Some(_)) => speed,
        (Some(boon), None) => speed + haste_speed_bonus(boon.power_level),
        (None, Some(_)) => half_to_nearest_five(speed),
        (None, None) => speed,
    }
}

fn haste_speed_bonus(power_level: u8) -> u32 {
    5 * power_level.saturating_sub(4) as u32
}

fn half_to_nearest_five(speed: u32) -> u32 {
    speed / 2 / 5 * 5
}

/// All four speeds. Climb, swim, and fly are half the adjusted ground speed
/// (rounded down to the nearest 5) unless the matching feat or boon grants
/// full speed.
pub fn movement(character: &Character, catalog: &Catalog) -> Movement {
    let ground = ground_speed(character, catalog);
    let half = half_to_nearest_five(ground);

    let climb = if character
        .mechanic_tier(catalog, FeatMechanic::ClimbSpeed)
        .is_some()
    {
        ground
    } else {
        half
    };
    let swim = if character
        .mechanic_tier(catalog, FeatMechanic::SwimSpeed)
        .is_some()
    {
        ground
    } else {
        half
    };
    let fly = if character
        .mechanic_tier(catalog, FeatMechanic::FlightSpeed)
        .is_some()
        || character
            .active_boon_with_mechanic(catalog, BoonMechanic::Flight)
            .is_some()
    {
        ground
    } else {
        half
    };

    Movement {
        ground,
        climb,
        swim,
        fly,
    }
}

// ============================================================================
// Hit points
// ============================================================================

/// Base maximum hit points before lethal damage.
pub fn base_max_hp(character: &Character, catalog: &Catalog) -> i32 {
    let fortitude = effective_score(character, catalog, Attribute::Fortitude) as i32;
    let presence = effective_score(character, catalog, Attribute::Presence) as i32;
    let will = effective_score(character, catalog, Attribute::Will) as i32;

    let mut hp = 10 + 2 * (fortitude + presence + will);
    if let Some(tier) = character.mechanic_tier(catalog, FeatMechanic::ToughAsNails) {
        hp += tier as i32 * 5;
    }
    hp
}

// ============================================================================
// Point budgets
// ============================================================================

/// A point budget: what the character may spend and what they have spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBudget {
    pub total: u32,
    pub spent: u32,
}

impl PointBudget {
    pub fn available(&self) -> u32 {
        self.total.saturating_sub(self.spent)
    }
}

/// Attribute point budget. Primaries earn 40 + 3 per experience point;
/// linked characters use their stored cap.
pub fn attribute_budget(character: &Character) -> PointBudget {
    let total = character
        .attribute_point_cap
        .unwrap_or(40 + 3 * character.experience_points);
    PointBudget {
        total,
        spent: character.attributes.spent_points(),
    }
}

/// Total feat points spent on taken feats.
pub fn used_feat_points(character: &Character, catalog: &Catalog) -> u32 {
    character
        .feats
        .iter()
        .map(|f| match catalog.feat(&f.name) {
            Some(entry) => entry.cost as u32 * f.tier as u32,
            None => {
                tracing::warn!(character = %character.name, feat = %f.name,
                    "feat not in catalog, counting zero cost");
                0
            }
        })
        .sum()
}

/// Feat point budget. Primaries earn 6 + 1 per experience point; linked
/// characters use their stored cap. Points lent to companions count as
/// spent.
pub fn feat_budget(character: &Character, catalog: &Catalog) -> PointBudget {
    let total = character
        .feat_point_cap
        .unwrap_or(6 + character.experience_points);
    let loaned: u32 = character.feat_point_loans.iter().map(|l| l.points).sum();
    PointBudget {
        total,
        spent: used_feat_points(character, catalog) + loaned,
    }
}

// ============================================================================
// Derived roll modifiers
// ============================================================================

fn power_level_band(power_level: u8) -> u8 {
    match power_level {
        0..=2 => 0,
        3..=5 => 1,
        6..=8 => 2,
        _ => 3,
    }
}

/// Regenerate the advantage and disadvantage entries that follow from feats,
/// boons, and banes. User-entered entries are not produced here.
pub fn derived_roll_modifiers(
    character: &Character,
    catalog: &Catalog,
) -> (Vec<RollModifier>, Vec<RollModifier>) {
    let mut advantages = Vec::new();
    let mut disadvantages = Vec::new();

    for feat in character.feats_with_mechanic(catalog, FeatMechanic::AttackSpecialization) {
        let weapon = match &feat.detail {
            Some(FeatDetail::Weapon(name)) => name.clone(),
            _ => "chosen weapon".to_string(),
        };
        advantages.push(RollModifier {
            name: format!("Attack Specialization ({weapon})"),
            attribute: None,
            count: feat.tier,
            derived: true,
        });
    }
    for feat in character.feats_with_mechanic(catalog, FeatMechanic::SkillSpecialization) {
        if let Some(FeatDetail::Attribute(attribute)) = feat.detail {
            advantages.push(RollModifier {
                name: "Skill Specialization".to_string(),
                attribute: Some(attribute),
                count: feat.tier,
                derived: true,
            });
        }
    }
    if let Some(tier) = character.mechanic_tier(catalog, FeatMechanic::LightningReflexes) {
        advantages.push(RollModifier {
            name: "Lightning Reflexes (initiative)".to_string(),
            attribute: Some(Attribute::Agility),
            count: tier,
            derived: true,
        });
    }

    if let Some(boon) = character.active_boon_with_mechanic(catalog, BoonMechanic::Bolster) {
        let count = power_level_band(boon.power_level);
        if count > 0 {
            advantages.push(RollModifier {
                name: "Bolster".to_string(),
                attribute: None,
                count,
                derived: true,
            });
        }
    }

    if let Some(bane) = character.active_bane_with_mechanic(catalog, BaneMechanic::Demoralized) {
        let count = power_level_band(bane.power_level);
        if count > 0 {
            disadvantages.push(RollModifier {
                name: "Demoralized".to_string(),
                attribute: None,
                count,
                derived: true,
            });
        }
    }
    if character
        .active_bane_with_mechanic(catalog, BaneMechanic::Sickened)
        .is_some()
    {
        disadvantages.push(RollModifier {
            name: "Sickened".to_string(),
            attribute: None,
            count: 1,
            derived: true,
        });
    }
    if character
        .active_bane_with_mechanic(catalog, BaneMechanic::Blinded)
        .is_some()
    {
        disadvantages.push(RollModifier {
            name: "Blinded".to_string(),
            attribute: Some(Attribute::Perception),
            count: 1,
            derived: true,
        });
    }

    (advantages, disadvantages)
}
