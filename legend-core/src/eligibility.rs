//! The eligibility checker.
//!
//! Decides which catalog entries a character may currently take, and at
//! which tiers or power levels, from their effective attributes and the
//! feats they already have.

use crate::attributes::Attribute;
use crate::catalog::{Catalog, FeatMechanic, FeatPrerequisite};
use crate::character::{Character, FeatDetail};
use crate::resolve::{effective_score, effective_scores};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether one tier's prerequisite is satisfied.
///
/// The attribute clause and the feat clause each combine with AND, or OR
/// under their `any_*` flag; `either` accepts the whole prerequisite when
/// one of the two clauses passes.
pub fn prerequisite_met(
    prereq: &FeatPrerequisite,
    scores: &HashMap<Attribute, u8>,
    character: &Character,
) -> bool {
    let attribute_check = |req: &crate::catalog::AttributeRequirement| {
        scores.get(&req.attribute).copied().unwrap_or(0) >= req.score
    };
    let attributes_met = if prereq.attributes.is_empty() {
        true
    } else if prereq.any_attribute {
        prereq.attributes.iter().any(attribute_check)
    } else {
        prereq.attributes.iter().all(attribute_check)
    };

    let feat_check = |req: &crate::catalog::FeatRequirement| {
        character
            .feat_tier(&req.name)
            .map(|t| t >= req.tier)
            .unwrap_or(false)
    };
    let feats_met = if prereq.feats.is_empty() {
        true
    } else if prereq.any_feat {
        prereq.feats.iter().any(feat_check)
    } else {
        prereq.feats.iter().all(feat_check)
    };

    if prereq.either {
        attributes_met || feats_met
    } else {
        attributes_met && feats_met
    }
}

/// A feat the character could take, and the tiers open to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatAvailability {
    pub name: String,
    pub tiers: Vec<u8>,
}

/// Every feat currently selectable, sorted by name.
///
/// Non-repeatable feats offer only tiers above the one already taken;
/// repeatable feats re-offer every tier each time.
pub fn available_feats(character: &Character, catalog: &Catalog) -> Vec<FeatAvailability> {
    let scores = effective_scores(character, catalog);

    let mut out: Vec<FeatAvailability> = catalog
        .feats()
        .filter_map(|entry| {
            let start = if entry.repeatable {
                1
            } else {
                match character.feat_tier(&entry.name) {
                    Some(tier) => tier + 1,
                    None => 1,
                }
            };
            let tiers: Vec<u8> = (start..=entry.max_tier)
                .filter(|&tier| {
                    entry
                        .prerequisite(tier)
                        .map(|p| prerequisite_met(p, &scores, character))
                        .unwrap_or(true)
                })
                .collect();
            if tiers.is_empty() {
                None
            } else {
                Some(FeatAvailability {
                    name: entry.name.clone(),
                    tiers,
                })
            }
        })
        .collect();

    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Whether a specific feat tier is currently open to the character.
pub fn feat_tier_available(
    character: &Character,
    catalog: &Catalog,
    name: &str,
    tier: u8,
) -> bool {
    let Some(entry) = catalog.feat(name) else {
        return false;
    };
    if !entry.valid_tier(tier) {
        return false;
    }
    if !entry.repeatable {
        if let Some(current) = character.feat_tier(name) {
            if tier <= current {
                return false;
            }
        }
    }
    let scores = effective_scores(character, catalog);
    entry
        .prerequisite(tier)
        .map(|p| prerequisite_met(p, &scores, character))
        .unwrap_or(true)
}

/// A boon or bane the character could use, and its open power levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerAvailability {
    pub name: String,
    pub power_levels: Vec<u8>,
}

/// The tier of a Boon Access feat naming this boon, if the character has
/// one.
fn boon_access_tier(character: &Character, catalog: &Catalog, boon_name: &str) -> Option<u8> {
    let lower = boon_name.to_lowercase();
    character
        .feats_with_mechanic(catalog, FeatMechanic::BoonAccess)
        .filter(|f| matches!(&f.detail, Some(FeatDetail::Boon(b)) if b.to_lowercase() == lower))
        .map(|f| f.tier)
        .max()
}

/// Every boon the character can invoke. A power level is open when any of
/// the boon's attributes has an effective score at or above it; Boon Access
/// opens the named boon's levels up to the feat's tier regardless.
pub fn available_boons(character: &Character, catalog: &Catalog) -> Vec<PowerAvailability> {
    let mut out: Vec<PowerAvailability> = catalog
        .boons()
        .filter_map(|entry| {
            let best = entry
                .attributes
                .iter()
                .map(|&a| effective_score(character, catalog, a))
                .max()
                .unwrap_or(0);
            let access = boon_access_tier(character, catalog, &entry.name);

            let power_levels: Vec<u8> = entry
                .power_levels
                .iter()
                .copied()
                .filter(|&pl| pl <= best || access.map(|t| pl <= t).unwrap_or(false))
                .collect();
            if power_levels.is_empty() {
                None
            } else {
                Some(PowerAvailability {
                    name: entry.name.clone(),
                    power_levels,
                })
            }
        })
        .collect();

    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Every bane the character can inflict, by the same attribute gate.
pub fn available_banes(character: &Character, catalog: &Catalog) -> Vec<PowerAvailability> {
    let mut out: Vec<PowerAvailability> = catalog
        .banes()
        .filter_map(|entry| {
            let best = entry
                .attributes
                .iter()
                .map(|&a| effective_score(character, catalog, a))
                .max()
                .unwrap_or(0);
            let power_levels: Vec<u8> = entry
                .power_levels
                .iter()
                .copied()
                .filter(|&pl| pl <= best)
                .collect();
            if power_levels.is_empty() {
                None
            } else {
                Some(PowerAvailability {
                    name: entry.name.clone(),
                    power_levels,
                })
            }
        })
        .collect();

    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Whether the character can invoke a boon at the given power level.
pub fn boon_power_available(
    character: &Character,
    catalog: &Catalog,
    name: &str,
    power_level: u8,
) -> bool {
    let Some(entry) = catalog.boon(name) else {
        return false;
    };
    if !entry.valid_power_level(power_level) {
        return false;
    }
    let by_attribute = entry
        .attributes
        .iter()
        .any(|&a| effective_score(character, catalog, a) >= power_level);
    let by_access = boon_access_tier(character, catalog, &entry.name)
        .map(|t| power_level <= t)
        .unwrap_or(false);
    by_attribute || by_access
}

/// Whether the character can inflict a bane at the given power level.
pub fn bane_power_available(
    character: &Character,
    catalog: &Catalog,
    name: &str,
    power_level: u8,
) -> bool {
    let Some(entry) = catalog.bane(name) else {
        return false;
    };
    entry.valid_power_level(power_level)
        && entry
            .attributes
            .iter()
            .any(|&a| effective_score(character, catalog, a) >= power_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::character::TakenFeat;

    fn feat(name: &str, tier: u8, detail: Option<FeatDetail>) -> TakenFeat {
        TakenFeat {
            name: name.to_string(),
            tier,
            detail,
            description: String::new(),
            effect: String::new(),
        }
    }

    #[test]
    fn test_attribute_prerequisites_gate_tiers() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        ch.attributes.set(Attribute::Agility, 4);

        let fleet = available_feats(&ch, &cat)
            .into_iter()
            .find(|f| f.name == "Fleet of Foot")
            .unwrap();
        // Agility 4 satisfies tiers 1 and 2 but not 3 (needs 6)
        assert_eq!(fleet.tiers, vec![1, 2]);
    }

    #[test]
    fn test_non_repeatable_offers_higher_tiers_only() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        ch.attributes.set(Attribute::Agility, 6);
        ch.feats.push(feat("Fleet of Foot", 2, None));

        let fleet = available_feats(&ch, &cat)
            .into_iter()
            .find(|f| f.name == "Fleet of Foot")
            .unwrap();
        assert_eq!(fleet.tiers, vec![3]);
        assert!(!feat_tier_available(&ch, &cat, "Fleet of Foot", 1));
        assert!(feat_tier_available(&ch, &cat, "Fleet of Foot", 3));
    }

    #[test]
    fn test_repeatable_reoffers_all_tiers() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        ch.feats.push(feat(
            "Extraordinary Focus",
            1,
            Some(FeatDetail::Attribute(Attribute::Energy)),
        ));
        assert!(feat_tier_available(&ch, &cat, "Extraordinary Focus", 1));
    }

    #[test]
    fn test_either_block_prerequisite() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        // Two Weapon Defense: Agility 5 OR the Two Weapon Brute feat
        assert!(!feat_tier_available(&ch, &cat, "Two Weapon Defense", 1));

        ch.attributes.set(Attribute::Agility, 5);
        assert!(feat_tier_available(&ch, &cat, "Two Weapon Defense", 1));

        ch.attributes.set(Attribute::Agility, 0);
        ch.feats.push(feat("Two Weapon Brute", 1, None));
        assert!(feat_tier_available(&ch, &cat, "Two Weapon Defense", 1));
    }

    #[test]
    fn test_all_attribute_prerequisite() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        // Two Weapon Brute wants Might 4 AND Agility 3
        ch.attributes.set(Attribute::Might, 4);
        assert!(!feat_tier_available(&ch, &cat, "Two Weapon Brute", 1));
        ch.attributes.set(Attribute::Agility, 3);
        assert!(feat_tier_available(&ch, &cat, "Two Weapon Brute", 1));
    }

    #[test]
    fn test_boon_power_levels_surface_independently() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        ch.attributes.set(Attribute::Alteration, 6);

        let haste = available_boons(&ch, &cat)
            .into_iter()
            .find(|b| b.name == "Haste")
            .unwrap();
        assert_eq!(haste.power_levels, vec![5, 6]);
        assert!(boon_power_available(&ch, &cat, "Haste", 5));
        assert!(!boon_power_available(&ch, &cat, "Haste", 7));
    }

    #[test]
    fn test_boon_access_caps_at_feat_tier() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        // No attribute scores at all, but Boon Access tier 6 names Haste
        ch.feats.push(feat(
            "Boon Access",
            6,
            Some(FeatDetail::Boon("Haste".to_string())),
        ));
        let haste = available_boons(&ch, &cat)
            .into_iter()
            .find(|b| b.name == "Haste")
            .unwrap();
        assert_eq!(haste.power_levels, vec![5, 6]);
        assert!(!boon_power_available(&ch, &cat, "Haste", 7));
    }

    #[test]
    fn test_bane_availability() {
        let cat = Catalog::builtin();
        let mut ch = Character::new("Test");
        ch.attributes.set(Attribute::Entropy, 5);
        assert!(bane_power_available(&ch, &cat, "Sickened", 5));
        assert!(bane_power_available(&ch, &cat, "Slowed", 4));
        assert!(!bane_power_available(&ch, &cat, "Slowed", 6));
        // Stupefied is gated on Influence, which is 0
        assert!(!bane_power_available(&ch, &cat, "Stupefied", 4));
    }
}
