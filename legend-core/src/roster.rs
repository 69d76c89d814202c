//! The character roster and relationship synchronizer.
//!
//! The roster is an arena of character records keyed by id. Relationships
//! are typed edges read off each record's role: alternate forms hang off a
//! primary, companions hang off a parent. Designated fields propagate across
//! the alternate-form tree; companions receive only damage, legend points,
//! and experience.

use crate::catalog::Catalog;
use crate::character::{Character, CharacterId, CharacterRole};
use crate::resolve;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A field the synchronizer propagates between linked characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncField {
    TotalDamage,
    LethalDamage,
    LegendPoints,
    ExperiencePoints,
    Boons,
    Banes,
    Equipment,
    Perks,
    Flaws,
}

impl SyncField {
    pub fn all() -> [SyncField; 9] {
        [
            SyncField::TotalDamage,
            SyncField::LethalDamage,
            SyncField::LegendPoints,
            SyncField::ExperiencePoints,
            SyncField::Boons,
            SyncField::Banes,
            SyncField::Equipment,
            SyncField::Perks,
            SyncField::Flaws,
        ]
    }

    /// Content fields never reach companions.
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            SyncField::Boons
                | SyncField::Banes
                | SyncField::Equipment
                | SyncField::Perks
                | SyncField::Flaws
        )
    }
}

/// The in-memory collection of character records.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    characters: HashMap<CharacterId, Character>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, character: Character) -> CharacterId {
        let id = character.id;
        self.characters.insert(id, character);
        id
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.characters.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn ids(&self) -> Vec<CharacterId> {
        self.characters.keys().copied().collect()
    }

    /// Alternate forms whose primary is `id`.
    pub fn alternate_forms_of(&self, id: CharacterId) -> Vec<CharacterId> {
        let mut out: Vec<CharacterId> = self
            .characters
            .values()
            .filter(|c| matches!(c.role, CharacterRole::AlternateForm { primary, .. } if primary == id))
            .map(|c| c.id)
            .collect();
        out.sort_by_key(|id| id.0);
        out
    }

    /// Companions whose parent is `id`.
    pub fn companions_of(&self, id: CharacterId) -> Vec<CharacterId> {
        let mut out: Vec<CharacterId> = self
            .characters
            .values()
            .filter(|c| matches!(c.role, CharacterRole::Companion { parent, .. } if parent == id))
            .map(|c| c.id)
            .collect();
        out.sort_by_key(|id| id.0);
        out
    }

    /// The root primary of the alternate-form tree containing `id`.
    ///
    /// Walks primary links upward; companions are roots of their own
    /// synchronization scope.
    pub fn root_primary(&self, id: CharacterId) -> CharacterId {
        let mut current = id;
        let mut seen = HashSet::new();
        while seen.insert(current) {
            match self.characters.get(&current).map(|c| c.role) {
                Some(CharacterRole::AlternateForm { primary, .. })
                    if self.characters.contains_key(&primary) =>
                {
                    current = primary;
                }
                _ => break,
            }
        }
        current
    }

    /// The top of the whole linked structure containing `id`, walking both
    /// alternate-form and companion links upward. Cap recalculation starts
    /// here so parents are always processed before their children.
    pub fn cap_root(&self, id: CharacterId) -> CharacterId {
        let mut current = id;
        let mut seen = HashSet::new();
        while seen.insert(current) {
            match self.characters.get(&current).and_then(|c| c.role.parent_id()) {
                Some(parent) if self.characters.contains_key(&parent) => current = parent,
                _ => break,
            }
        }
        current
    }

    /// The whole alternate-form tree rooted at `root`, parents before
    /// children. Companions are not members.
    pub fn related_characters(&self, root: CharacterId) -> Vec<CharacterId> {
        let mut out = Vec::new();
        let mut queue = vec![root];
        let mut seen = HashSet::new();
        while let Some(id) = queue.pop() {
            if !seen.insert(id) || !self.characters.contains_key(&id) {
                continue;
            }
            out.push(id);
            queue.extend(self.alternate_forms_of(id));
        }
        out
    }

    /// Remove a character, detaching every record that referenced it.
    ///
    /// Orphaned alternate forms and companions are promoted to primaries;
    /// feat point loans to a removed companion are forgotten.
    pub fn remove_character(&mut self, id: CharacterId) -> Option<Character> {
        let removed = self.characters.remove(&id)?;

        for character in self.characters.values_mut() {
            if character.role.parent_id() == Some(id) {
                character.role = CharacterRole::Primary;
                character.attribute_point_cap = None;
                character.feat_point_cap = None;
            }
            character.feat_point_loans.retain(|l| l.companion != id);
        }

        Some(removed)
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Propagate the source's current values for `fields` to every linked
    /// record. Content fields reach the alternate-form tree only; damage,
    /// legend points, and experience also reach companions of tree members.
    ///
    /// Returns the ids of every record written to, so the caller can
    /// recompute them.
    pub fn sync_from(&mut self, source: CharacterId, fields: &[SyncField]) -> Vec<CharacterId> {
        let Some(src) = self.characters.get(&source).cloned() else {
            tracing::warn!(%source, "sync requested for unknown character");
            return Vec::new();
        };

        let root = self.root_primary(source);
        let tree = self.related_characters(root);

        let mut touched = Vec::new();

        for &id in &tree {
            if id == source {
                continue;
            }
            if let Some(target) = self.characters.get_mut(&id) {
                for field in fields {
                    copy_field(&src, target, *field);
                }
                touched.push(id);
            }
        }

        // Companions hang off tree members but only ever receive the
        // non-content fields.
        let non_content: Vec<SyncField> = fields
            .iter()
            .copied()
            .filter(|f| !f.is_content())
            .collect();
        if !non_content.is_empty() {
            for &member in &tree {
                for companion in self.companions_of(member) {
                    if companion == source {
                        continue;
                    }
                    if let Some(target) = self.characters.get_mut(&companion) {
                        for field in &non_content {
                            copy_field(&src, target, *field);
                        }
                        touched.push(companion);
                    }
                }
            }
        }

        touched
    }

    // ========================================================================
    // Cap recalculation
    // ========================================================================

    /// Recalculate stored point caps for every linked record under `root`.
    ///
    /// Runs in hierarchy order: a child's cap formula reads its parent's
    /// already-recalculated budget, so parents are processed first.
    pub fn recalculate_caps(&mut self, root: CharacterId, catalog: &Catalog) {
        let mut queue = vec![root];
        let mut seen = HashSet::new();

        while let Some(parent_id) = queue.pop() {
            if !seen.insert(parent_id) {
                continue;
            }

            let children: Vec<CharacterId> = self
                .alternate_forms_of(parent_id)
                .into_iter()
                .chain(self.companions_of(parent_id))
                .collect();

            for child_id in children {
                self.recalculate_child_caps(parent_id, child_id, catalog);
                queue.push(child_id);
            }
        }
    }

    fn recalculate_child_caps(
        &mut self,
        parent_id: CharacterId,
        child_id: CharacterId,
        catalog: &Catalog,
    ) {
        let (parent_attr_total, parent_feat_total) = match self.characters.get(&parent_id) {
            Some(parent) => (
                resolve::attribute_budget(parent).total,
                resolve::feat_budget(parent, catalog).total,
            ),
            None => return,
        };
        let (role, child_level, child_used) = match self.characters.get(&child_id) {
            Some(child) => (
                child.role,
                child.level() as u32,
                resolve::used_feat_points(child, catalog),
            ),
            None => return,
        };

        let (attr_cap, feat_cap) = match role {
            CharacterRole::AlternateForm { tier: 1, .. } => (parent_attr_total.div_ceil(2), 3),
            CharacterRole::AlternateForm { .. } => {
                (parent_attr_total, parent_feat_total.saturating_sub(3))
            }
            CharacterRole::Companion { tier, .. } => {
                let (attr_cap, base_feat_cap) = match tier {
                    1 => (20 + 4 * child_level, 0),
                    2 => (20 + 4 * child_level, 3),
                    _ => (30 + 6 * child_level, 3),
                };

                let feat_cap = if tier >= 3 {
                    // Tier 3 draws on the parent's unused feat points. The
                    // loan ledger on the parent records what this companion
                    // has already drawn, so exclude it from "unused" before
                    // recomputing the loan.
                    let parent = self.characters.get_mut(&parent_id).expect("checked above");
                    let other_loans: u32 = parent
                        .feat_point_loans
                        .iter()
                        .filter(|l| l.companion != child_id)
                        .map(|l| l.points)
                        .sum();
                    let parent_used = resolve::used_feat_points(parent, catalog);
                    let parent_unused = parent_feat_total
                        .saturating_sub(parent_used)
                        .saturating_sub(other_loans);

                    let loan = child_used.saturating_sub(base_feat_cap);
                    parent.feat_point_loans.retain(|l| l.companion != child_id);
                    if loan > 0 {
                        parent
                            .feat_point_loans
                            .push(crate::character::FeatPointLoan {
                                companion: child_id,
                                points: loan,
                            });
                    }
                    base_feat_cap + parent_unused.max(loan)
                } else {
                    base_feat_cap
                };

                (attr_cap, feat_cap)
            }
            CharacterRole::Primary => return,
        };

        if let Some(child) = self.characters.get_mut(&child_id) {
            child.attribute_point_cap = Some(attr_cap);
            child.feat_point_cap = Some(feat_cap);
        }
    }
}

fn copy_field(src: &Character, target: &mut Character, field: SyncField) {
    match field {
        SyncField::TotalDamage => target.total_damage_taken = src.total_damage_taken,
        SyncField::LethalDamage => target.lethal_damage = src.lethal_damage,
        SyncField::LegendPoints => target.legend_points = src.legend_points,
        SyncField::ExperiencePoints => target.experience_points = src.experience_points,
        SyncField::Boons => target.boons = src.boons.clone(),
        SyncField::Banes => target.banes = src.banes.clone(),
        SyncField::Equipment => target.equipment = src.equipment.clone(),
        SyncField::Perks => target.perks = src.perks.clone(),
        SyncField::Flaws => target.flaws = src.flaws.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn linked_pair() -> (Roster, CharacterId, CharacterId) {
        let mut roster = Roster::new();
        let primary = roster.insert(Character::new("Mara"));
        let mut form = Character::new("Mara (wolf)");
        form.role = CharacterRole::AlternateForm {
            primary,
            tier: 1,
        };
        let form_id = roster.insert(form);
        (roster, primary, form_id)
    }

    #[test]
    fn test_root_primary_walks_up() {
        let (mut roster, primary, form_id) = linked_pair();
        let mut nested = Character::new("Mara (dire wolf)");
        nested.role = CharacterRole::AlternateForm {
            primary: form_id,
            tier: 1,
        };
        let nested_id = roster.insert(nested);

        assert_eq!(roster.root_primary(nested_id), primary);
        assert_eq!(roster.root_primary(primary), primary);

        let related = roster.related_characters(primary);
        assert_eq!(related.len(), 3);
        // Parents come before their children
        let pos = |id| related.iter().position(|&x| x == id).unwrap();
        assert!(pos(primary) < pos(form_id));
        assert!(pos(form_id) < pos(nested_id));
    }

    #[test]
    fn test_sync_content_to_alternate_forms() {
        let (mut roster, primary, form_id) = linked_pair();
        roster.get_mut(primary).unwrap().legend_points = 4;
        roster
            .get_mut(primary)
            .unwrap()
            .perks
            .push(crate::character::TakenPerk {
                name: "Courageous".to_string(),
                detail: None,
                description: String::new(),
            });

        let touched = roster.sync_from(primary, &SyncField::all());
        assert_eq!(touched, vec![form_id]);

        let form = roster.get(form_id).unwrap();
        assert_eq!(form.legend_points, 4);
        assert_eq!(form.perks.len(), 1);
    }

    #[test]
    fn test_companions_excluded_from_content() {
        let mut roster = Roster::new();
        let parent = roster.insert(Character::new("Ranger"));
        let mut wolf = Character::new("Wolf");
        wolf.role = CharacterRole::Companion { parent, tier: 1 };
        let wolf_id = roster.insert(wolf);

        {
            let p = roster.get_mut(parent).unwrap();
            p.legend_points = 2;
            p.experience_points = 6;
            p.total_damage_taken = 5;
            p.boons.push(crate::character::ActiveBoon {
                name: "Haste".to_string(),
                power_level: 5,
                sustaining: true,
                source: Default::default(),
                description: String::new(),
                effect: String::new(),
            });
        }

        roster.sync_from(parent, &SyncField::all());

        let wolf = roster.get(wolf_id).unwrap();
        assert_eq!(wolf.legend_points, 2);
        assert_eq!(wolf.experience_points, 6);
        assert_eq!(wolf.total_damage_taken, 5);
        assert!(wolf.boons.is_empty());
        assert!(wolf.equipment.is_empty());
    }

    #[test]
    fn test_alternate_form_caps() {
        let catalog = Catalog::builtin();
        let (mut roster, primary, form_id) = linked_pair();
        roster.get_mut(primary).unwrap().experience_points = 4; // 52 attr, 10 feat

        roster.recalculate_caps(primary, &catalog);
        let form = roster.get(form_id).unwrap();
        assert_eq!(form.attribute_point_cap, Some(26)); // ceil(52 / 2)
        assert_eq!(form.feat_point_cap, Some(3));

        roster.get_mut(form_id).unwrap().role = CharacterRole::AlternateForm {
            primary,
            tier: 2,
        };
        roster.recalculate_caps(primary, &catalog);
        let form = roster.get(form_id).unwrap();
        assert_eq!(form.attribute_point_cap, Some(52));
        assert_eq!(form.feat_point_cap, Some(7)); // 10 - 3
    }

    #[test]
    fn test_companion_caps_by_tier() {
        let catalog = Catalog::builtin();
        let mut roster = Roster::new();
        let parent = roster.insert(Character::new("Summoner"));
        let mut companion = Character::new("Golem");
        companion.experience_points = 6; // level 3
        companion.role = CharacterRole::Companion { parent, tier: 1 };
        let companion_id = roster.insert(companion);

        roster.recalculate_caps(parent, &catalog);
        let golem = roster.get(companion_id).unwrap();
        assert_eq!(golem.attribute_point_cap, Some(32)); // 20 + 4*3
        assert_eq!(golem.feat_point_cap, Some(0));

        roster.get_mut(companion_id).unwrap().role =
            CharacterRole::Companion { parent, tier: 3 };
        roster.recalculate_caps(parent, &catalog);
        let golem = roster.get(companion_id).unwrap();
        assert_eq!(golem.attribute_point_cap, Some(48)); // 30 + 6*3
        // 3 of its own plus the parent's 6 unused feat points
        assert_eq!(golem.feat_point_cap, Some(9));
    }

    #[test]
    fn test_remove_character_detaches_links() {
        let (mut roster, primary, form_id) = linked_pair();
        roster.remove_character(primary);
        let form = roster.get(form_id).unwrap();
        assert!(form.role.is_primary());
        assert!(form.attribute_point_cap.is_none());
    }
}
