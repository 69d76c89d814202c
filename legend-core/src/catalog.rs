//! The reference catalog: feats, boons, banes, perks, and flaws.
//!
//! The catalog is an immutable lookup table. Entries the engine gives rules
//! weight to carry a mechanic tag; the resolvers match on the tag, never on
//! entry names. Everything else is display text.

use crate::attributes::Attribute;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Mechanics
// ============================================================================

/// Rules-visible feat behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatMechanic {
    AlternateForm,
    ArmorMastery,
    AttackSpecialization,
    AttributeSubstitution,
    BaneFocus,
    BoonAccess,
    ClimbSpeed,
    Companion,
    ExtraordinaryDefense,
    ExtraordinaryFocus,
    FleetOfFoot,
    FlightSpeed,
    IndomitableResolve,
    LightningReflexes,
    MartialFocus,
    NaturalDefense,
    SkillSpecialization,
    SwimSpeed,
    ToughAsNails,
    TwoWeaponBrute,
    TwoWeaponDefense,
}

/// Rules-visible boon behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoonMechanic {
    Bolster,
    Concealment,
    Flight,
    Haste,
}

/// Rules-visible bane behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaneMechanic {
    Blinded,
    Demoralized,
    Fatigued,
    Immobile,
    Sickened,
    Slowed,
    Stupefied,
}

/// The kind of custom detail a feat asks for when taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CustomInput {
    #[default]
    None,
    /// A chosen attribute.
    Attribute,
    /// A from/to attribute pair.
    SubstitutionPair,
    /// A chosen boon.
    Boon,
    /// A chosen bane.
    Bane,
    /// A chosen weapon.
    Weapon,
    /// Free text.
    Text,
}

// ============================================================================
// Prerequisites
// ============================================================================

/// An attribute score requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRequirement {
    pub attribute: Attribute,
    pub score: u8,
}

/// A requirement on another feat at a minimum tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatRequirement {
    pub name: String,
    pub tier: u8,
}

/// Prerequisites for one tier of a feat.
///
/// The attribute clause and the feat clause each combine their members with
/// AND, or with OR when the matching `any_*` flag is set. `either` joins the
/// two clauses with OR instead of AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatPrerequisite {
    pub attributes: Vec<AttributeRequirement>,
    pub any_attribute: bool,
    pub feats: Vec<FeatRequirement>,
    pub any_feat: bool,
    pub either: bool,
}

impl FeatPrerequisite {
    pub fn none() -> Self {
        Self::default()
    }

    /// Require all listed attribute scores.
    pub fn attributes(reqs: &[(Attribute, u8)]) -> Self {
        Self {
            attributes: reqs
                .iter()
                .map(|&(attribute, score)| AttributeRequirement { attribute, score })
                .collect(),
            ..Default::default()
        }
    }

    /// Require any one of the listed attribute scores.
    pub fn any_attribute(reqs: &[(Attribute, u8)]) -> Self {
        let mut prereq = Self::attributes(reqs);
        prereq.any_attribute = true;
        prereq
    }

    pub fn with_feat(mut self, name: impl Into<String>, tier: u8) -> Self {
        self.feats.push(FeatRequirement {
            name: name.into(),
            tier,
        });
        self
    }

    pub fn any_feat(mut self) -> Self {
        self.any_feat = true;
        self
    }

    /// Satisfy the prerequisite with either the attribute clause or the feat
    /// clause instead of both.
    pub fn either(mut self) -> Self {
        self.either = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.feats.is_empty()
    }
}

// ============================================================================
// Entries
// ============================================================================

/// A catalog feat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatEntry {
    pub name: String,
    pub max_tier: u8,
    /// Feat points per tier.
    pub cost: u8,
    pub repeatable: bool,
    pub custom: CustomInput,
    pub description: String,
    pub prerequisites: BTreeMap<u8, FeatPrerequisite>,
    pub effects: BTreeMap<u8, String>,
    pub mechanic: Option<FeatMechanic>,
}

impl FeatEntry {
    pub fn new(name: impl Into<String>, max_tier: u8, cost: u8) -> Self {
        Self {
            name: name.into(),
            max_tier,
            cost,
            repeatable: false,
            custom: CustomInput::None,
            description: String::new(),
            prerequisites: BTreeMap::new(),
            effects: BTreeMap::new(),
            mechanic: None,
        }
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn with_mechanic(mut self, mechanic: FeatMechanic) -> Self {
        self.mechanic = Some(mechanic);
        self
    }

    pub fn with_custom(mut self, custom: CustomInput) -> Self {
        self.custom = custom;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn with_prerequisite(mut self, tier: u8, prereq: FeatPrerequisite) -> Self {
        self.prerequisites.insert(tier, prereq);
        self
    }

    pub fn with_effect(mut self, tier: u8, text: impl Into<String>) -> Self {
        self.effects.insert(tier, text.into());
        self
    }

    /// Prerequisite for a tier; tiers without one are unconstrained.
    pub fn prerequisite(&self, tier: u8) -> Option<&FeatPrerequisite> {
        self.prerequisites.get(&tier)
    }

    pub fn effect(&self, tier: u8) -> Option<&str> {
        self.effects.get(&tier).map(String::as_str)
    }

    pub fn valid_tier(&self, tier: u8) -> bool {
        (1..=self.max_tier).contains(&tier)
    }
}

/// A catalog boon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoonEntry {
    pub name: String,
    pub power_levels: Vec<u8>,
    /// Attributes that can invoke this boon.
    pub attributes: Vec<Attribute>,
    pub duration: String,
    pub description: String,
    pub effect: String,
    pub mechanic: Option<BoonMechanic>,
}

impl BoonEntry {
    pub fn new(
        name: impl Into<String>,
        power_levels: Vec<u8>,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            name: name.into(),
            power_levels,
            attributes,
            duration: "Sustain".to_string(),
            description: String::new(),
            effect: String::new(),
            mechanic: None,
        }
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn with_effect(mut self, text: impl Into<String>) -> Self {
        self.effect = text.into();
        self
    }

    pub fn with_mechanic(mut self, mechanic: BoonMechanic) -> Self {
        self.mechanic = Some(mechanic);
        self
    }

    pub fn valid_power_level(&self, power_level: u8) -> bool {
        self.power_levels.contains(&power_level)
    }
}

/// A catalog bane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaneEntry {
    pub name: String,
    pub power_levels: Vec<u8>,
    /// Attributes that can inflict this bane.
    pub attributes: Vec<Attribute>,
    pub duration: String,
    pub description: String,
    pub effect: String,
    pub mechanic: Option<BaneMechanic>,
}

impl BaneEntry {
    pub fn new(
        name: impl Into<String>,
        power_levels: Vec<u8>,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            name: name.into(),
            power_levels,
            attributes,
            duration: "Resist ends".to_string(),
            description: String::new(),
            effect: String::new(),
            mechanic: None,
        }
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn with_effect(mut self, text: impl Into<String>) -> Self {
        self.effect = text.into();
        self
    }

    pub fn with_mechanic(mut self, mechanic: BaneMechanic) -> Self {
        self.mechanic = Some(mechanic);
        self
    }

    pub fn valid_power_level(&self, power_level: u8) -> bool {
        self.power_levels.contains(&power_level)
    }
}

/// A catalog perk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerkEntry {
    pub name: String,
    pub description: String,
}

/// A catalog flaw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlawEntry {
    pub name: String,
    pub description: String,
}

// ============================================================================
// Catalog
// ============================================================================

/// The immutable reference catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    feats: HashMap<String, FeatEntry>,
    boons: HashMap<String, BoonEntry>,
    banes: HashMap<String, BaneEntry>,
    perks: HashMap<String, PerkEntry>,
    flaws: HashMap<String, FlawEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feat(&mut self, entry: FeatEntry) {
        self.feats.insert(entry.name.to_lowercase(), entry);
    }

    pub fn add_boon(&mut self, entry: BoonEntry) {
        self.boons.insert(entry.name.to_lowercase(), entry);
    }

    pub fn add_bane(&mut self, entry: BaneEntry) {
        self.banes.insert(entry.name.to_lowercase(), entry);
    }

    pub fn add_perk(&mut self, entry: PerkEntry) {
        self.perks.insert(entry.name.to_lowercase(), entry);
    }

    pub fn add_flaw(&mut self, entry: FlawEntry) {
        self.flaws.insert(entry.name.to_lowercase(), entry);
    }

    /// Look up a feat by name, case-insensitive.
    pub fn feat(&self, name: &str) -> Option<&FeatEntry> {
        self.feats.get(&name.to_lowercase())
    }

    pub fn boon(&self, name: &str) -> Option<&BoonEntry> {
        self.boons.get(&name.to_lowercase())
    }

    pub fn bane(&self, name: &str) -> Option<&BaneEntry> {
        self.banes.get(&name.to_lowercase())
    }

    pub fn perk(&self, name: &str) -> Option<&PerkEntry> {
        self.perks.get(&name.to_lowercase())
    }

    pub fn flaw(&self, name: &str) -> Option<&FlawEntry> {
        self.flaws.get(&name.to_lowercase())
    }

    pub fn feats(&self) -> impl Iterator<Item = &FeatEntry> {
        self.feats.values()
    }

    pub fn boons(&self) -> impl Iterator<Item = &BoonEntry> {
        self.boons.values()
    }

    pub fn banes(&self) -> impl Iterator<Item = &BaneEntry> {
        self.banes.values()
    }

    pub fn perks(&self) -> impl Iterator<Item = &PerkEntry> {
        self.perks.values()
    }

    pub fn flaws(&self) -> impl Iterator<Item = &FlawEntry> {
        self.flaws.values()
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::new();
        builtin_feats(&mut catalog);
        builtin_boons(&mut catalog);
        builtin_banes(&mut catalog);
        builtin_perks_and_flaws(&mut catalog);
        catalog
    }
}

lazy_static::lazy_static! {
    /// The built-in reference catalog.
    pub static ref CATALOG: Catalog = Catalog::builtin();
}

fn builtin_feats(catalog: &mut Catalog) {
    use Attribute::*;

    catalog.add_feat(
        FeatEntry::new("Alternate Form", 2, 3)
            .with_mechanic(FeatMechanic::AlternateForm)
            .with_description("You possess a second form: a werewolf's beast, a mech suit, a superhero's alter ego.")
            .with_prerequisite(1, FeatPrerequisite::any_attribute(&[(Alteration, 5), (Entropy, 5)]))
            .with_prerequisite(2, FeatPrerequisite::any_attribute(&[(Alteration, 7), (Entropy, 7)]))
            .with_effect(1, "Your alternate form is built with half your available attribute points and 3 feat points.")
            .with_effect(2, "Your alternate form is built with your full attribute points and your feat points less three."),
    );
    catalog.add_feat(
        FeatEntry::new("Armor Mastery", 2, 2)
            .with_mechanic(FeatMechanic::ArmorMastery)
            .with_description("Training and experience have made you at home in armor.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Fortitude, 3)]))
            .with_prerequisite(2, FeatPrerequisite::attributes(&[(Fortitude, 5)]))
            .with_effect(1, "While wearing armor, your guard increases by 1.")
            .with_effect(2, "You no longer suffer a speed penalty from armor."),
    );
    catalog.add_feat(
        FeatEntry::new("Attack Specialization", 3, 3)
            .with_mechanic(FeatMechanic::AttackSpecialization)
            .repeatable()
            .with_custom(CustomInput::Weapon)
            .with_description("You have mastered a particular weapon.")
            .with_prerequisite(1, FeatPrerequisite::any_attribute(&[(Agility, 4), (Might, 4)]))
            .with_prerequisite(2, FeatPrerequisite::any_attribute(&[(Agility, 6), (Might, 6)]))
            .with_prerequisite(3, FeatPrerequisite::any_attribute(&[(Agility, 8), (Might, 8)]))
            .with_effect(1, "Gain advantage 1 on attacks with the chosen weapon.")
            .with_effect(2, "Gain advantage 2 on attacks with the chosen weapon.")
            .with_effect(3, "Gain advantage 3 on attacks with the chosen weapon."),
    );
    catalog.add_feat(
        FeatEntry::new("Attribute Substitution", 2, 3)
            .with_mechanic(FeatMechanic::AttributeSubstitution)
            .repeatable()
            .with_custom(CustomInput::SubstitutionPair)
            .with_description("One of your attributes stands in for another: intuition in place of book learning, magical might in place of muscle.")
            .with_effect(1, "Substitute the chosen attribute's score for another when making rolls.")
            .with_effect(2, "The substitution also applies to your defenses and derived statistics."),
    );
    catalog.add_feat(
        FeatEntry::new("Bane Focus", 1, 2)
            .with_mechanic(FeatMechanic::BaneFocus)
            .repeatable()
            .with_custom(CustomInput::Bane)
            .with_description("You are adept at afflicting a particular bane.")
            .with_effect(1, "The chosen bane triggers on attacks that exceed the defense by 5 or more."),
    );
    catalog.add_feat(
        FeatEntry::new("Boon Access", 9, 1)
            .with_mechanic(FeatMechanic::BoonAccess)
            .repeatable()
            .with_custom(CustomInput::Boon)
            .with_description("Circumstance or gift grants you a boon your attributes alone would not.")
            .with_effect(1, "You may invoke the chosen boon at power levels up to this feat's tier, regardless of your attributes."),
    );
    catalog.add_feat(
        FeatEntry::new("Climbing", 1, 2)
            .with_mechanic(FeatMechanic::ClimbSpeed)
            .with_description("You scale sheer surfaces with ease.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Agility, 3)]))
            .with_effect(1, "Your climb speed equals your ground speed."),
    );
    catalog.add_feat(
        FeatEntry::new("Companion", 3, 2)
            .with_mechanic(FeatMechanic::Companion)
            .with_description("A loyal ally fights at your side: an animal, a construct, a sworn protector.")
            .with_prerequisite(2, FeatPrerequisite::any_attribute(&[(Presence, 4), (Creation, 4)]))
            .with_prerequisite(3, FeatPrerequisite::any_attribute(&[(Presence, 6), (Creation, 6)]))
            .with_effect(1, "Your companion is built with 20 + 4 x level attribute points and no feat points.")
            .with_effect(2, "Your companion is built with 20 + 4 x level attribute points and 3 feat points.")
            .with_effect(3, "Your companion is built with 30 + 6 x level attribute points, 3 feat points, and may draw on your unspent feat points."),
    );
    catalog.add_feat(
        FeatEntry::new("Extraordinary Defense", 3, 3)
            .with_mechanic(FeatMechanic::ExtraordinaryDefense)
            .with_description("Supernatural power shields you from harm.")
            .with_prerequisite(1, FeatPrerequisite::any_attribute(&[(Alteration, 3), (Energy, 3), (Prescience, 3), (Protection, 3)]))
            .with_prerequisite(2, FeatPrerequisite::any_attribute(&[(Alteration, 5), (Energy, 5), (Prescience, 5), (Protection, 5)]))
            .with_prerequisite(3, FeatPrerequisite::any_attribute(&[(Alteration, 7), (Energy, 7), (Prescience, 7), (Protection, 7)]))
            .with_effect(1, "All three of your defenses increase by 1.")
            .with_effect(2, "All three of your defenses increase by 2.")
            .with_effect(3, "All three of your defenses increase by 3."),
    );
    catalog.add_feat(
        FeatEntry::new("Extraordinary Focus", 1, 3)
            .with_mechanic(FeatMechanic::ExtraordinaryFocus)
            .repeatable()
            .with_custom(CustomInput::Attribute)
            .with_description("A focus channels your power: a wand, a holy symbol, a spirit animal.")
            .with_effect(1, "Treat the chosen attribute as one greater for the purpose of attribute dice."),
    );
    catalog.add_feat(
        FeatEntry::new("Fleet of Foot", 3, 1)
            .with_mechanic(FeatMechanic::FleetOfFoot)
            .with_description("You are uncommonly fast.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Agility, 2)]))
            .with_prerequisite(2, FeatPrerequisite::attributes(&[(Agility, 4)]))
            .with_prerequisite(3, FeatPrerequisite::attributes(&[(Agility, 6)]))
            .with_effect(1, "Your speed increases by 5 feet.")
            .with_effect(2, "Your speed increases by 10 feet.")
            .with_effect(3, "Your speed increases by 15 feet."),
    );
    catalog.add_feat(
        FeatEntry::new("Flying", 1, 3)
            .with_mechanic(FeatMechanic::FlightSpeed)
            .with_description("Wings, magic, or sheer will carries you aloft.")
            .with_prerequisite(1, FeatPrerequisite::any_attribute(&[(Movement, 5), (Alteration, 5)]))
            .with_effect(1, "Your fly speed equals your ground speed."),
    );
    catalog.add_feat(
        FeatEntry::new("Indomitable Resolve", 3, 2)
            .with_mechanic(FeatMechanic::IndomitableResolve)
            .with_description("Your will is a fortress.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Will, 2)]))
            .with_prerequisite(2, FeatPrerequisite::attributes(&[(Will, 3)]))
            .with_prerequisite(3, FeatPrerequisite::attributes(&[(Will, 4)]))
            .with_effect(1, "Your resolve defense increases by 1.")
            .with_effect(2, "Your resolve defense increases by 2.")
            .with_effect(3, "Your resolve defense increases by 3."),
    );
    catalog.add_feat(
        FeatEntry::new("Lightning Reflexes", 3, 1)
            .with_mechanic(FeatMechanic::LightningReflexes)
            .with_description("You react before others think to.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Agility, 2)]))
            .with_prerequisite(2, FeatPrerequisite::attributes(&[(Agility, 4)]))
            .with_prerequisite(3, FeatPrerequisite::attributes(&[(Agility, 6)]))
            .with_effect(1, "Gain advantage 1 on initiative.")
            .with_effect(2, "Gain advantage 2 on initiative.")
            .with_effect(3, "Gain advantage 3 on initiative."),
    );
    catalog.add_feat(
        FeatEntry::new("Martial Focus", 1, 3)
            .with_mechanic(FeatMechanic::MartialFocus)
            .with_custom(CustomInput::Attribute)
            .with_description("Your combat training runs deeper than raw talent.")
            .with_prerequisite(1, FeatPrerequisite::any_attribute(&[(Agility, 4), (Might, 4)]))
            .with_effect(1, "When attacking with the chosen attribute (agility or might), roll its dice as if the score were one greater."),
    );
    catalog.add_feat(
        FeatEntry::new("Natural Defense", 2, 2)
            .with_mechanic(FeatMechanic::NaturalDefense)
            .with_description("Hide, scales, or hard-won instinct protects you better than any armor.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Fortitude, 3)]))
            .with_prerequisite(2, FeatPrerequisite::attributes(&[(Fortitude, 5)]))
            .with_effect(1, "While not wearing armor, your guard increases by 1.")
            .with_effect(2, "While not wearing armor, your guard increases by 2."),
    );
    catalog.add_feat(
        FeatEntry::new("Skill Specialization", 3, 1)
            .with_mechanic(FeatMechanic::SkillSpecialization)
            .repeatable()
            .with_custom(CustomInput::Attribute)
            .with_description("Practice has made you an expert.")
            .with_effect(1, "Gain advantage 1 on non-attack rolls with the chosen attribute.")
            .with_effect(2, "Gain advantage 2 on non-attack rolls with the chosen attribute.")
            .with_effect(3, "Gain advantage 3 on non-attack rolls with the chosen attribute."),
    );
    catalog.add_feat(
        FeatEntry::new("Swimming", 1, 1)
            .with_mechanic(FeatMechanic::SwimSpeed)
            .with_description("Water is a second home to you.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Fortitude, 2)]))
            .with_effect(1, "Your swim speed equals your ground speed."),
    );
    catalog.add_feat(
        FeatEntry::new("Tough as Nails", 2, 3)
            .with_mechanic(FeatMechanic::ToughAsNails)
            .with_description("You shrug off wounds that would fell others.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Fortitude, 3)]))
            .with_prerequisite(2, FeatPrerequisite::attributes(&[(Fortitude, 5)]))
            .with_effect(1, "Your maximum hit points increase by 5.")
            .with_effect(2, "Your maximum hit points increase by 10."),
    );
    catalog.add_feat(
        FeatEntry::new("Two Weapon Brute", 1, 3)
            .with_mechanic(FeatMechanic::TwoWeaponBrute)
            .with_description("You wield weapons most need two hands for in one.")
            .with_prerequisite(1, FeatPrerequisite::attributes(&[(Might, 4), (Agility, 3)]))
            .with_effect(1, "You may wield a two-handed weapon in one hand."),
    );
    catalog.add_feat(
        FeatEntry::new("Two Weapon Defense", 1, 2)
            .with_mechanic(FeatMechanic::TwoWeaponDefense)
            .with_description("A blade in each hand weaves a wall of steel.")
            .with_prerequisite(
                1,
                FeatPrerequisite::attributes(&[(Agility, 5)])
                    .with_feat("Two Weapon Brute", 1)
                    .either(),
            )
            .with_effect(1, "While wielding two weapons, your guard increases by 1."),
    );
}

fn builtin_boons(catalog: &mut Catalog) {
    use Attribute::*;

    catalog.add_boon(
        BoonEntry::new("Bolster", vec![3, 4, 5, 6, 7, 8, 9], vec![Creation, Presence, Will])
            .with_mechanic(BoonMechanic::Bolster)
            .with_description("You fill an ally with confidence and vigor.")
            .with_effect("The target gains advantage on their rolls, scaling with power level."),
    );
    catalog.add_boon(
        BoonEntry::new("Concealment", vec![4, 5, 6, 7, 8, 9], vec![Alteration, Influence])
            .with_mechanic(BoonMechanic::Concealment)
            .with_description("Shadow, fog, or bending light hides the target.")
            .with_effect("The target's guard increases while concealed, scaling with power level."),
    );
    catalog.add_boon(
        BoonEntry::new("Flight", vec![5, 6, 7, 8, 9], vec![Alteration, Movement])
            .with_mechanic(BoonMechanic::Flight)
            .with_description("The target takes to the air.")
            .with_effect("The target gains a fly speed equal to their ground speed."),
    );
    catalog.add_boon(
        BoonEntry::new("Haste", vec![5, 6, 7, 8, 9], vec![Alteration, Movement])
            .with_mechanic(BoonMechanic::Haste)
            .with_description("The target moves with unnatural swiftness.")
            .with_effect("The target's speed increases with power level; at the highest levels their guard rises as well."),
    );
    catalog.add_boon(
        BoonEntry::new("Heal", vec![1, 2, 3, 4, 5, 6, 7, 8, 9], vec![Creation, Learning, Logic, Presence])
            .with_duration("Instantaneous")
            .with_description("Wounds close and vigor returns.")
            .with_effect("The target heals hit points equal to the result of the invoking attribute roll."),
    );
    catalog.add_boon(
        BoonEntry::new("Invisible", vec![5, 6, 7, 8, 9], vec![Alteration, Influence])
            .with_description("The target cannot be seen.")
            .with_effect("The target is invisible; attacks against them suffer heavy disadvantage."),
    );
    catalog.add_boon(
        BoonEntry::new("Regeneration", vec![4, 5, 6, 7, 8, 9], vec![Alteration, Creation])
            .with_description("Flesh knits before your eyes.")
            .with_effect("The target heals hit points at the start of each of their turns, scaling with power level."),
    );
}

fn builtin_banes(catalog: &mut Catalog) {
    use Attribute::*;

    catalog.add_bane(
        BaneEntry::new("Blinded", vec![5], vec![Alteration, Energy, Entropy])
            .with_mechanic(BaneMechanic::Blinded)
            .with_description("The target cannot see.")
            .with_effect("The target's guard drops by 3 and they suffer disadvantage on perception rolls."),
    );
    catalog.add_bane(
        BaneEntry::new("Demoralized", vec![3, 4, 5, 6, 7, 8, 9], vec![Deception, Might, Persuasion, Presence])
            .with_mechanic(BaneMechanic::Demoralized)
            .with_description("Fear or doubt saps the target's will to act.")
            .with_effect("The target suffers disadvantage on their rolls, scaling with power level."),
    );
    catalog.add_bane(
        BaneEntry::new("Fatigued", vec![1, 2, 3, 4, 5], vec![Entropy])
            .with_mechanic(BaneMechanic::Fatigued)
            .with_duration("Special")
            .with_description("Exhaustion mounts in stages; each level is worse than the last.")
            .with_effect("At level 2 the target tires; at level 4 their defenses lose their attribute bonuses; at level 5 they collapse."),
    );
    catalog.add_bane(
        BaneEntry::new("Immobile", vec![1, 2, 3, 4, 5, 6, 7, 8, 9], vec![Alteration, Energy, Entropy, Might, Movement])
            .with_mechanic(BaneMechanic::Immobile)
            .with_description("The target cannot move from where they stand.")
            .with_effect("All of the target's speeds drop to 0."),
    );
    catalog.add_bane(
        BaneEntry::new("Knockdown", vec![1, 2, 3, 4, 5, 6, 7, 8, 9], vec![Alteration, Energy, Entropy, Might, Movement])
            .with_duration("Instantaneous")
            .with_description("The target is thrown from their feet.")
            .with_effect("The target falls prone."),
    );
    catalog.add_bane(
        BaneEntry::new("Persistent Damage", vec![4, 5, 6, 7, 8, 9], vec![Alteration, Energy, Entropy])
            .with_description("Fire, acid, or bleeding continues to harm the target.")
            .with_effect("The target takes damage at the start of each of their turns, scaling with power level."),
    );
    catalog.add_bane(
        BaneEntry::new("Sickened", vec![5], vec![Entropy])
            .with_mechanic(BaneMechanic::Sickened)
            .with_description("Nausea wracks the target.")
            .with_effect("The target's defenses each drop by 2 and they suffer disadvantage 1 on all rolls."),
    );
    catalog.add_bane(
        BaneEntry::new("Slowed", vec![1, 2, 3, 4, 5, 6, 7, 8, 9], vec![Alteration, Energy, Entropy, Might, Movement])
            .with_mechanic(BaneMechanic::Slowed)
            .with_description("The target's limbs grow heavy.")
            .with_effect("The target's speed is halved."),
    );
    catalog.add_bane(
        BaneEntry::new("Stupefied", vec![4, 5, 6, 7, 8, 9], vec![Influence])
            .with_mechanic(BaneMechanic::Stupefied)
            .with_description("The target's mind clouds over.")
            .with_effect("The target's resolve defense becomes 10."),
    );
}

fn builtin_perks_and_flaws(catalog: &mut Catalog) {
    catalog.add_perk(PerkEntry {
        name: "Ageless".to_string(),
        description: "You do not age, whether from magic, heritage, or something stranger."
            .to_string(),
    });
    catalog.add_perk(PerkEntry {
        name: "Attractive".to_string(),
        description: "You possess a striking appearance that draws attention.".to_string(),
    });
    catalog.add_perk(PerkEntry {
        name: "Courageous".to_string(),
        description: "Where others hesitate, you act.".to_string(),
    });
    catalog.add_perk(PerkEntry {
        name: "Crafter".to_string(),
        description: "You are skilled in a trade and can produce mundane goods.".to_string(),
    });
    catalog.add_perk(PerkEntry {
        name: "Local Hero".to_string(),
        description: "The common folk of your home know and love you.".to_string(),
    });

    catalog.add_flaw(FlawEntry {
        name: "Absent-Minded".to_string(),
        description: "Details slip past you; you lose track of time and possessions.".to_string(),
    });
    catalog.add_flaw(FlawEntry {
        name: "Arrogant".to_string(),
        description: "You overestimate yourself and underestimate everyone else.".to_string(),
    });
    catalog.add_flaw(FlawEntry {
        name: "Honest".to_string(),
        description: "You cannot bring yourself to lie, even when you should.".to_string(),
    });
    catalog.add_flaw(FlawEntry {
        name: "Overprotective".to_string(),
        description: "You endanger yourself to shield others, whether they want it or not."
            .to_string(),
    });
    catalog.add_flaw(FlawEntry {
        name: "Zealot".to_string(),
        description: "Your cause comes before sense, safety, and friendship.".to_string(),
    });
}
