//! QA tests for linked characters:
//! - Alternate form creation, caps, and content synchronization
//! - Companion budgets and the content-sync exclusion
//! - Deletion detaching the relationship graph
//! - Import id remapping and the export round trip
//!
//! Run with: `cargo test -p legend-core qa_linked_characters`

use legend_core::persist::{clean_character, import_characters, reconstruct_character};
use legend_core::{Attribute, Catalog, CharacterId, Roster};

fn primary_with_alternate_form() -> (Roster, CharacterId, CharacterId, Catalog) {
    let catalog = Catalog::builtin();
    let mut roster = Roster::new();
    let id = roster.create_character("Mara", &catalog);
    roster
        .set_attribute(id, Attribute::Alteration, 5, &catalog)
        .unwrap();
    roster
        .add_feat(id, "Alternate Form", 1, None, &catalog)
        .unwrap();
    let form = roster
        .grant_alternate_form(id, "Mara (wolf)", 1, &catalog)
        .unwrap();
    (roster, id, form, catalog)
}

// =============================================================================
// ALTERNATE FORMS
// =============================================================================

#[test]
fn test_tier_one_form_caps() {
    let (roster, _, form, catalog) = primary_with_alternate_form();
    let stats = roster.derived(form, &catalog).unwrap();
    // ceil(40 / 2) attribute points, 3 feat points
    assert_eq!(stats.attribute_points.total, 20);
    assert_eq!(stats.feat_points.total, 3);
}

#[test]
fn test_tier_two_form_caps_follow_parent() {
    let (mut roster, id, _, catalog) = primary_with_alternate_form();
    roster
        .add_feat(id, "Alternate Form", 2, None, &catalog)
        .unwrap_err(); // Alteration 5 < tier 2 prerequisite of 7
    roster
        .set_attribute(id, Attribute::Alteration, 7, &catalog)
        .unwrap();
    roster
        .add_feat(id, "Alternate Form", 2, None, &catalog)
        .unwrap();
    let form2 = roster
        .grant_alternate_form(id, "Mara (dire wolf)", 2, &catalog)
        .unwrap();

    let stats = roster.derived(form2, &catalog).unwrap();
    assert_eq!(stats.attribute_points.total, 40);
    // Parent has 6 feat points; the tier-2 form gets them less three
    assert_eq!(stats.feat_points.total, 3);

    // Growing the parent's experience grows the stored caps on recompute
    roster.set_experience(id, 6, &catalog).unwrap();
    let stats = roster.derived(form2, &catalog).unwrap();
    assert_eq!(stats.attribute_points.total, 40 + 18);
    assert_eq!(stats.feat_points.total, 12 - 3);
}

#[test]
fn test_content_syncs_across_the_form_tree() {
    let (mut roster, id, form, catalog) = primary_with_alternate_form();

    roster.set_legend_points(id, 5, &catalog).unwrap();
    roster.add_bane(id, "Sickened", 5, &catalog).unwrap();
    let ring = roster
        .add_equipment(
            id,
            legend_core::EquipmentItem::item("Signet Ring"),
            &catalog,
        )
        .unwrap();

    let wolf = roster.get(form).unwrap();
    assert_eq!(wolf.legend_points, 5);
    assert!(wolf.has_bane("Sickened"));
    assert!(wolf.item(ring).is_some());

    // The wolf's own derived state picked the bane up too
    let stats = roster.derived(form, &catalog).unwrap();
    assert_eq!(stats.toughness, 10 - 2);
}

#[test]
fn test_feats_stay_per_form() {
    let (roster, id, form, _catalog) = primary_with_alternate_form();
    // The primary's feats are its own; the wolf form has none
    assert!(roster.get(id).unwrap().feat_tier("Alternate Form").is_some());
    assert!(roster.get(form).unwrap().feats.is_empty());
}

// =============================================================================
// COMPANIONS
// =============================================================================

fn ranger_with_companion(tier: u8) -> (Roster, CharacterId, CharacterId, Catalog) {
    let catalog = Catalog::builtin();
    let mut roster = Roster::new();
    let id = roster.create_character("Ranger", &catalog);
    if tier >= 2 {
        roster
            .set_attribute(id, Attribute::Presence, 2 * tier, &catalog)
            .unwrap();
    }
    if tier >= 3 {
        // Tier 3 exercises the loan ledger, so the parent needs spare points
        roster.set_experience(id, 6, &catalog).unwrap();
    }
    roster
        .add_feat(id, "Companion", tier, None, &catalog)
        .unwrap();
    let companion = roster
        .grant_companion(id, "Wolf", tier, &catalog)
        .unwrap();
    (roster, id, companion, catalog)
}

#[test]
fn test_companion_budgets_by_tier() {
    let (roster, _, wolf, catalog) = ranger_with_companion(1);
    let stats = roster.derived(wolf, &catalog).unwrap();
    assert_eq!(stats.attribute_points.total, 24); // 20 + 4 x level 1
    assert_eq!(stats.feat_points.total, 0);

    let (roster, _, wolf, catalog) = ranger_with_companion(2);
    let stats = roster.derived(wolf, &catalog).unwrap();
    assert_eq!(stats.attribute_points.total, 24);
    assert_eq!(stats.feat_points.total, 3);
}

#[test]
fn test_tier_three_companion_borrows_parent_feat_points() {
    let (mut roster, id, wolf, catalog) = ranger_with_companion(3);

    // Parent: 12 feat points at 6 xp, 6 spent on Companion tier 3
    let parent_stats = roster.derived(id, &catalog).unwrap();
    let parent_unused = parent_stats.feat_points.available();
    assert_eq!(parent_unused, 6);

    // The companion's experience synced from the parent, so it is level 3
    let stats = roster.derived(wolf, &catalog).unwrap();
    assert_eq!(stats.attribute_points.total, 48); // 30 + 6 x level 3
    assert_eq!(stats.feat_points.total, 3 + parent_unused);

    // Spending past its own 3 points records a loan on the parent
    roster
        .set_attribute(wolf, Attribute::Fortitude, 5, &catalog)
        .unwrap();
    roster
        .add_feat(wolf, "Tough as Nails", 2, None, &catalog)
        .unwrap(); // costs 6: 3 of its own, 3 borrowed
    let parent = roster.get(id).unwrap();
    assert_eq!(parent.feat_point_loans.len(), 1);
    assert_eq!(parent.feat_point_loans[0].points, 3);
    assert_eq!(parent.feat_point_loans[0].companion, wolf);

    // The loan reduces what the parent can spend
    let parent_stats = roster.derived(id, &catalog).unwrap();
    assert_eq!(parent_stats.feat_points.available(), parent_unused - 3);
}

#[test]
fn test_companion_never_receives_content() {
    let (mut roster, id, wolf, catalog) = ranger_with_companion(1);

    roster.set_legend_points(id, 3, &catalog).unwrap();
    roster.set_experience(id, 6, &catalog).unwrap();
    roster.apply_damage(id, 2, &catalog).unwrap();
    roster.add_bane(id, "Sickened", 5, &catalog).unwrap();
    roster
        .add_equipment(id, legend_core::EquipmentItem::item("Pack"), &catalog)
        .unwrap();
    roster.add_perk(id, "Courageous", None, &catalog).unwrap();

    let wolf_ch = roster.get(wolf).unwrap();
    // Legend, experience, and damage flow to the companion
    assert_eq!(wolf_ch.legend_points, 3);
    assert_eq!(wolf_ch.experience_points, 6);
    assert_eq!(wolf_ch.total_damage_taken, 2);
    // Content never does
    assert!(wolf_ch.banes.is_empty());
    assert!(wolf_ch.equipment.is_empty());
    assert!(wolf_ch.perks.is_empty());

    // Synced experience raised the companion's level and budget
    let stats = roster.derived(wolf, &catalog).unwrap();
    assert_eq!(stats.level, 3);
    assert_eq!(stats.attribute_points.total, 20 + 4 * 3);
}

// =============================================================================
// DELETION
// =============================================================================

#[test]
fn test_deleting_primary_promotes_children() {
    let (mut roster, id, form, _catalog) = primary_with_alternate_form();
    roster.delete_character(id).unwrap();

    assert!(roster.get(id).is_none());
    let wolf = roster.get(form).unwrap();
    assert!(wolf.role.is_primary());
    assert!(wolf.attribute_point_cap.is_none());
    assert!(wolf.feat_point_cap.is_none());
}

#[test]
fn test_deleting_companion_clears_loans() {
    let (mut roster, id, wolf, catalog) = ranger_with_companion(3);
    roster
        .set_attribute(wolf, Attribute::Fortitude, 5, &catalog)
        .unwrap();
    roster
        .add_feat(wolf, "Tough as Nails", 2, None, &catalog)
        .unwrap();
    assert!(!roster.get(id).unwrap().feat_point_loans.is_empty());

    roster.delete_character(wolf).unwrap();
    assert!(roster.get(id).unwrap().feat_point_loans.is_empty());
}

// =============================================================================
// IMPORT AND EXPORT
// =============================================================================

#[test]
fn test_import_preserves_graph_with_fresh_ids() {
    let (source, id, form, catalog) = primary_with_alternate_form();

    let exported: Vec<_> = source.iter().cloned().collect();
    let mut target = Roster::new();
    let inserted = import_characters(&mut target, exported, &catalog);

    assert_eq!(inserted.len(), 2);
    assert!(!inserted.contains(&id));
    assert!(!inserted.contains(&form));

    let new_primary = target.iter().find(|c| c.role.is_primary()).unwrap();
    let forms = target.alternate_forms_of(new_primary.id);
    assert_eq!(forms.len(), 1);

    // Caps were recomputed against the remapped parent
    let stats = target.derived(forms[0], &catalog).unwrap();
    assert_eq!(stats.attribute_points.total, 20);
}

#[test]
fn test_clean_reconstruct_round_trip_via_json() {
    let catalog = Catalog::builtin();
    let mut roster = Roster::new();
    let id = roster.create_character("Kestrel", &catalog);
    roster
        .set_attribute(id, Attribute::Alteration, 6, &catalog)
        .unwrap();
    roster.add_boon(id, "Concealment", 5, &catalog).unwrap();
    roster.add_flaw(id, "Arrogant", &catalog).unwrap();

    let original = roster.get(id).unwrap().clone();

    // Export through JSON the way a share file would travel
    let cleaned = clean_character(&original);
    let json = serde_json::to_string(&cleaned).unwrap();
    let mut imported: legend_core::Character = serde_json::from_str(&json).unwrap();
    assert!(imported.boons[0].description.is_empty());

    reconstruct_character(&mut imported, &catalog);
    assert_eq!(imported.boons[0].description, original.boons[0].description);
    assert_eq!(imported.boons[0].effect, original.boons[0].effect);
    assert_eq!(imported.flaws[0].description, original.flaws[0].description);
}
