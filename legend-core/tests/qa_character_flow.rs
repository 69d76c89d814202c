//! QA tests for the core character flow through the public API:
//! - Attribute spending and derived statistics
//! - Feat purchase and eligibility
//! - Equipment rules
//! - Boons, banes, and their interactions
//! - Damage and healing
//!
//! Run with: `cargo test -p legend-core qa_character_flow`

use legend_core::{Attribute, Catalog, Defense, FeatDetail, OpError, Roster};

fn setup() -> (Roster, legend_core::CharacterId, Catalog) {
    let catalog = Catalog::builtin();
    let mut roster = Roster::new();
    let id = roster.create_character("Kestrel", &catalog);
    (roster, id, catalog)
}

// =============================================================================
// ATTRIBUTES AND DERIVED STATISTICS
// =============================================================================

#[test]
fn test_fresh_character_baseline() {
    let (roster, id, catalog) = setup();
    let stats = roster.derived(id, &catalog).unwrap();

    assert_eq!(stats.level, 1);
    assert_eq!(stats.base_max_hp, 10);
    assert_eq!(stats.guard, 10);
    assert_eq!(stats.toughness, 10);
    assert_eq!(stats.resolve, 10);
    assert_eq!(stats.movement.ground, 30);
    assert_eq!(stats.attribute_points.total, 40);
    assert_eq!(stats.feat_points.total, 6);
    assert_eq!(stats.attribute_points.spent, 0);
}

#[test]
fn test_attribute_spend_cost_is_triangular() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Might, 4, &catalog)
        .unwrap();

    let stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(stats.attribute_points.spent, 10); // 4*5/2
    assert_eq!(stats.attribute_points.available(), 30);

    // 0->1->2->3 spot checks via the exported cost function
    assert_eq!(legend_core::score_cost(0), 0);
    assert_eq!(legend_core::score_cost(1), 1);
    assert_eq!(legend_core::score_cost(2), 3);
    assert_eq!(legend_core::score_cost(3), 6);
    assert_eq!(legend_core::score_cost(4), 10);
}

#[test]
fn test_level_tracks_experience() {
    let (mut roster, id, catalog) = setup();
    assert_eq!(roster.derived(id, &catalog).unwrap().level, 1);

    roster.set_experience(id, 3, &catalog).unwrap();
    assert_eq!(roster.derived(id, &catalog).unwrap().level, 2);

    roster.set_experience(id, 8, &catalog).unwrap();
    let stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(stats.level, 3);
    // Budgets grow with experience
    assert_eq!(stats.attribute_points.total, 40 + 24);
    assert_eq!(stats.feat_points.total, 6 + 8);
}

#[test]
fn test_defense_pairs_and_dice() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Agility, 3, &catalog)
        .unwrap();
    roster
        .set_attribute(id, Attribute::Might, 2, &catalog)
        .unwrap();
    roster
        .set_attribute(id, Attribute::Will, 4, &catalog)
        .unwrap();

    let stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(stats.guard, 10 + 3 + 2);
    assert_eq!(stats.toughness, 10 + 0 + 4);
    assert_eq!(stats.resolve, 10 + 0 + 4);

    assert_eq!(stats.dice[&Attribute::Agility].to_string(), "1d8");
    assert_eq!(stats.dice[&Attribute::Will].to_string(), "1d10");
    assert_eq!(stats.dice[&Attribute::Energy].to_string(), "-");
    // Initiative rides on agility
    assert_eq!(stats.initiative.to_string(), "1d8");
}

// =============================================================================
// FEATS
// =============================================================================

#[test]
fn test_feat_eligibility_tracks_attributes() {
    let (mut roster, id, catalog) = setup();

    let available = roster.available_feats(id, &catalog).unwrap();
    assert!(available.iter().all(|f| f.name != "Martial Focus"));

    roster
        .set_attribute(id, Attribute::Might, 4, &catalog)
        .unwrap();
    let available = roster.available_feats(id, &catalog).unwrap();
    assert!(available.iter().any(|f| f.name == "Martial Focus"));
}

#[test]
fn test_martial_focus_splits_attack_dice() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Might, 5, &catalog)
        .unwrap();
    roster
        .add_feat(
            id,
            "Martial Focus",
            1,
            Some(FeatDetail::Attribute(Attribute::Might)),
            &catalog,
        )
        .unwrap();

    let stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(stats.dice[&Attribute::Might].to_string(), "2d6 / 2d8");
}

#[test]
fn test_attribute_substitution_feeds_derived_stats() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Energy, 6, &catalog)
        .unwrap();
    roster
        .add_feat(
            id,
            "Attribute Substitution",
            2,
            Some(FeatDetail::Substitution {
                from: Attribute::Energy,
                to: Attribute::Might,
            }),
            &catalog,
        )
        .unwrap();

    let stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(stats.attributes[&Attribute::Might], 6);
    // Guard reads the substituted score
    assert_eq!(stats.guard, 10 + 0 + 6);
}

// =============================================================================
// MOVEMENT INTERACTIONS
// =============================================================================

#[test]
fn test_haste_slowed_cancellation_scenario() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Alteration, 6, &catalog)
        .unwrap();

    assert_eq!(roster.derived(id, &catalog).unwrap().movement.ground, 30);

    roster.add_boon(id, "Haste", 6, &catalog).unwrap();
    assert_eq!(roster.derived(id, &catalog).unwrap().movement.ground, 40);

    roster.add_bane(id, "Slowed", 1, &catalog).unwrap();
    // Together they cancel: not floor(floor(40/2)/5)*5 = 20, but the
    // original un-hastened, un-slowed 30.
    assert_eq!(roster.derived(id, &catalog).unwrap().movement.ground, 30);

    roster.remove_boon(id, "Haste", &catalog).unwrap();
    assert_eq!(roster.derived(id, &catalog).unwrap().movement.ground, 15);
}

#[test]
fn test_immobile_zeroes_every_speed() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Agility, 6, &catalog)
        .unwrap();
    roster
        .add_feat(id, "Fleet of Foot", 3, None, &catalog)
        .unwrap();
    roster.add_bane(id, "Immobile", 1, &catalog).unwrap();

    let stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(stats.movement.ground, 0);
    assert_eq!(stats.movement.climb, 0);
    assert_eq!(stats.movement.swim, 0);
    assert_eq!(stats.movement.fly, 0);
}

// =============================================================================
// HIT POINTS
// =============================================================================

#[test]
fn test_hp_scenario_from_attribute_spread() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Fortitude, 3, &catalog)
        .unwrap();
    roster
        .set_attribute(id, Attribute::Presence, 2, &catalog)
        .unwrap();
    roster
        .set_attribute(id, Attribute::Will, 1, &catalog)
        .unwrap();

    let stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(stats.base_max_hp, 22);
}

#[test]
fn test_hp_ordering_invariant_under_stress() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Fortitude, 5, &catalog)
        .unwrap();

    // A battering sequence of damage, lethal damage, and healing
    let steps: &[(&str, i32)] = &[
        ("damage", 7),
        ("lethal", 4),
        ("damage", 30),
        ("heal", 12),
        ("lethal", 15),
        ("heal", 50),
        ("lethal", 0),
        ("damage", 3),
    ];
    for &(op, amount) in steps {
        match op {
            "damage" => roster.apply_damage(id, amount, &catalog).unwrap(),
            "heal" => roster.heal(id, amount, &catalog).unwrap(),
            "lethal" => roster.set_lethal_damage(id, amount, &catalog).unwrap(),
            _ => unreachable!(),
        }
        let ch = roster.get(id).unwrap();
        assert!(
            0 <= ch.current_hp
                && ch.current_hp <= ch.max_hp
                && ch.max_hp <= ch.base_max_hp,
            "invariant broken after {op} {amount}: {}/{}/{}",
            ch.current_hp,
            ch.max_hp,
            ch.base_max_hp
        );
    }
}

// =============================================================================
// BOONS, BANES, AND DEFENSES
// =============================================================================

#[test]
fn test_stupefied_pins_resolve() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Presence, 4, &catalog)
        .unwrap();
    roster
        .set_attribute(id, Attribute::Will, 4, &catalog)
        .unwrap();
    roster
        .add_feat(id, "Indomitable Resolve", 3, None, &catalog)
        .unwrap();

    assert_eq!(roster.derived(id, &catalog).unwrap().resolve, 10 + 8 + 3);

    roster.add_bane(id, "Stupefied", 5, &catalog).unwrap();
    assert_eq!(roster.derived(id, &catalog).unwrap().resolve, 10);

    roster.remove_bane(id, "Stupefied", &catalog).unwrap();
    assert_eq!(roster.derived(id, &catalog).unwrap().resolve, 21);
}

#[test]
fn test_boon_eligibility_surfaces_each_level() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Creation, 4, &catalog)
        .unwrap();

    let boons = roster.available_boons(id, &catalog).unwrap();
    let heal = boons.iter().find(|b| b.name == "Heal").unwrap();
    assert_eq!(heal.power_levels, vec![1, 2, 3, 4]);

    let bolster = boons.iter().find(|b| b.name == "Bolster").unwrap();
    assert_eq!(bolster.power_levels, vec![3, 4]);
}

#[test]
fn test_derived_disadvantages_regenerate() {
    let (mut roster, id, catalog) = setup();
    roster.add_bane(id, "Demoralized", 7, &catalog).unwrap();

    let ch = roster.get(id).unwrap();
    let demoralized = ch
        .disadvantages
        .iter()
        .find(|d| d.name == "Demoralized")
        .unwrap();
    assert_eq!(demoralized.count, 2);
    assert!(demoralized.derived);

    roster.remove_bane(id, "Demoralized", &catalog).unwrap();
    assert!(roster.get(id).unwrap().disadvantages.is_empty());
}

// =============================================================================
// VALIDATION REJECTIONS LEAVE NO PARTIAL STATE
// =============================================================================

#[test]
fn test_rejected_mutations_change_nothing() {
    let (mut roster, id, catalog) = setup();
    roster
        .set_attribute(id, Attribute::Fortitude, 3, &catalog)
        .unwrap();
    let before = format!("{:?}", roster.get(id).unwrap());

    let err = roster.set_attribute(id, Attribute::Might, 9, &catalog);
    assert!(matches!(
        err,
        Err(OpError::InsufficientAttributePoints { .. })
    ));
    let err = roster.add_feat(id, "Flying", 1, None, &catalog);
    assert!(matches!(err, Err(OpError::PrerequisiteNotMet { .. })));
    let err = roster.add_boon(id, "Regeneration", 9, &catalog);
    assert!(matches!(err, Err(OpError::PowerLevelNotAccessible { .. })));

    let after = format!("{:?}", roster.get(id).unwrap());
    assert_eq!(before, after);
}

#[test]
fn test_defense_value_uses_defense_enum() {
    // Defense pairs are part of the public contract
    assert_eq!(
        Defense::Guard.attribute_pair(),
        (Attribute::Agility, Attribute::Might)
    );
    assert_eq!(
        Defense::Toughness.attribute_pair(),
        (Attribute::Fortitude, Attribute::Will)
    );
}
