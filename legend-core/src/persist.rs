//! Roster persistence: save, load, import, and the export transform.
//!
//! The whole character collection is serialized as one JSON envelope with a
//! version number. Importing characters remaps every character id to a fresh
//! one, consistently across relationship links, before insertion. The
//! clean/reconstruct pair strips catalog-derived display text for export and
//! restores it by re-joining against the catalog.

use crate::catalog::Catalog;
use crate::character::{Character, CharacterId, CharacterRole};
use crate::roster::Roster;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// The serialized roster envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterFile {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created (unix seconds).
    pub saved_at: String,

    /// Every character record.
    pub characters: Vec<Character>,
}

/// Quick-access information about a save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterMetadata {
    pub saved_at: String,
    pub character_count: usize,
}

impl RosterFile {
    /// Capture the current roster.
    pub fn from_roster(roster: &Roster) -> Self {
        let mut characters: Vec<Character> = roster.iter().cloned().collect();
        characters.sort_by_key(|c| c.id.0);
        Self {
            version: SAVE_VERSION,
            saved_at: timestamp_now(),
            characters,
        }
    }

    /// Rebuild a roster, normalizing every record against the catalog and
    /// recomputing derived state.
    pub fn into_roster(self, catalog: &Catalog) -> Roster {
        let mut roster = Roster::new();
        for mut character in self.characters {
            character.normalize(catalog);
            roster.insert(character);
        }
        for id in roster.ids() {
            roster.recompute_tree(id, catalog);
        }
        roster
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read a save's metadata without deserializing every character.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<RosterMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            saved_at: String,
            characters: Vec<serde_json::Value>,
        }

        let partial: Partial = serde_json::from_str(&content)?;
        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(RosterMetadata {
            saved_at: partial.saved_at,
            character_count: partial.characters.len(),
        })
    }
}

/// Insert imported characters into a roster, remapping every character id to
/// a fresh one. Relationship links and loan ledgers are rewritten through
/// the same map, so the imported graph keeps its shape.
pub fn import_characters(
    roster: &mut Roster,
    incoming: Vec<Character>,
    catalog: &Catalog,
) -> Vec<CharacterId> {
    let id_map: HashMap<CharacterId, CharacterId> = incoming
        .iter()
        .map(|c| (c.id, CharacterId::new()))
        .collect();

    let mut inserted = Vec::new();
    for mut character in incoming {
        character.id = id_map[&character.id];

        character.role = match character.role {
            CharacterRole::AlternateForm { primary, tier } => match id_map.get(&primary) {
                Some(&new_primary) => CharacterRole::AlternateForm {
                    primary: new_primary,
                    tier,
                },
                None => {
                    tracing::warn!(character = %character.name,
                        "imported alternate form's primary is not in the import, promoting");
                    CharacterRole::Primary
                }
            },
            CharacterRole::Companion { parent, tier } => match id_map.get(&parent) {
                Some(&new_parent) => CharacterRole::Companion {
                    parent: new_parent,
                    tier,
                },
                None => {
                    tracing::warn!(character = %character.name,
                        "imported companion's parent is not in the import, promoting");
                    CharacterRole::Primary
                }
            },
            CharacterRole::Primary => CharacterRole::Primary,
        };

        for loan in &mut character.feat_point_loans {
            if let Some(&new_id) = id_map.get(&loan.companion) {
                loan.companion = new_id;
            }
        }
        character
            .feat_point_loans
            .retain(|l| id_map.contains_key(&l.companion));

        character.normalize(catalog);
        inserted.push(roster.insert(character));
    }

    for &id in &inserted {
        roster.recompute_tree(id, catalog);
    }
    inserted
}

// ============================================================================
// Export transform
// ============================================================================

/// Strip catalog-derived display fields down to name, tier/power level, and
/// user-supplied custom details.
pub fn clean_character(character: &Character) -> Character {
    let mut out = character.clone();
    for feat in &mut out.feats {
        feat.description.clear();
        feat.effect.clear();
    }
    for boon in &mut out.boons {
        boon.description.clear();
        boon.effect.clear();
    }
    for bane in &mut out.banes {
        bane.description.clear();
        bane.effect.clear();
    }
    for perk in &mut out.perks {
        perk.description.clear();
    }
    for flaw in &mut out.flaws {
        flaw.description.clear();
    }
    out
}

/// Restore catalog-derived display fields by re-joining against the catalog
/// by name (and tier, for feats). Entries the catalog no longer knows keep
/// empty display fields and log a warning.
pub fn reconstruct_character(character: &mut Character, catalog: &Catalog) {
    let name = character.name.clone();
    for feat in &mut character.feats {
        match catalog.feat(&feat.name) {
            Some(entry) => {
                feat.description = entry.description.clone();
                feat.effect = entry.effect(feat.tier).unwrap_or("").to_string();
            }
            None => {
                tracing::warn!(character = %name, feat = %feat.name,
                    "feat not in catalog, display fields left empty");
            }
        }
    }
    for boon in &mut character.boons {
        match catalog.boon(&boon.name) {
            Some(entry) => {
                boon.description = entry.description.clone();
                boon.effect = entry.effect.clone();
            }
            None => {
                tracing::warn!(character = %name, boon = %boon.name,
                    "boon not in catalog, display fields left empty");
            }
        }
    }
    for bane in &mut character.banes {
        match catalog.bane(&bane.name) {
            Some(entry) => {
                bane.description = entry.description.clone();
                bane.effect = entry.effect.clone();
            }
            None => {
                tracing::warn!(character = %name, bane = %bane.name,
                    "bane not in catalog, display fields left empty");
            }
        }
    }
    for perk in &mut character.perks {
        match catalog.perk(&perk.name) {
            Some(entry) => perk.description = entry.description.clone(),
            None => {
                tracing::warn!(character = %name, perk = %perk.name,
                    "perk not in catalog, display fields left empty");
            }
        }
    }
    for flaw in &mut character.flaws {
        match catalog.flaw(&flaw.name) {
            Some(entry) => flaw.description = entry.description.clone(),
            None => {
                tracing::warn!(character = %name, flaw = %flaw.name,
                    "flaw not in catalog, display fields left empty");
            }
        }
    }
}

/// Current timestamp as unix seconds.
fn timestamp_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", now.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;
    use crate::catalog::Catalog;
    use crate::character::FeatDetail;

    fn sample_roster(catalog: &Catalog) -> (Roster, CharacterId) {
        let mut roster = Roster::new();
        let id = roster.create_character("Kestrel", catalog);
        roster
            .set_attribute(id, Attribute::Alteration, 6, catalog)
            .unwrap();
        roster
            .set_attribute(id, Attribute::Fortitude, 3, catalog)
            .unwrap();
        roster
            .add_feat(id, "Tough as Nails", 1, None, catalog)
            .unwrap();
        roster.add_boon(id, "Haste", 6, catalog).unwrap();
        roster.add_perk(id, "Courageous", None, catalog).unwrap();
        (roster, id)
    }

    #[test]
    fn test_clean_then_reconstruct_round_trips() {
        let catalog = Catalog::builtin();
        let (roster, id) = sample_roster(&catalog);
        let original = roster.get(id).unwrap();
        assert!(!original.feats[0].description.is_empty());

        let mut cleaned = clean_character(original);
        assert!(cleaned.feats[0].description.is_empty());
        assert!(cleaned.boons[0].effect.is_empty());
        assert!(cleaned.perks[0].description.is_empty());
        // Name, tier, and custom details survive cleaning
        assert_eq!(cleaned.feats[0].name, original.feats[0].name);
        assert_eq!(cleaned.feats[0].tier, original.feats[0].tier);

        reconstruct_character(&mut cleaned, &catalog);
        assert_eq!(cleaned.feats[0].description, original.feats[0].description);
        assert_eq!(cleaned.feats[0].effect, original.feats[0].effect);
        assert_eq!(cleaned.boons[0].effect, original.boons[0].effect);
        assert_eq!(cleaned.perks[0].description, original.perks[0].description);
    }

    #[test]
    fn test_reconstruct_uses_tier_for_feat_effect() {
        let catalog = Catalog::builtin();
        let mut roster = Roster::new();
        let id = roster.create_character("Test", &catalog);
        roster
            .set_attribute(id, Attribute::Agility, 4, &catalog)
            .unwrap();
        roster
            .add_feat(id, "Fleet of Foot", 2, None, &catalog)
            .unwrap();

        let mut cleaned = clean_character(roster.get(id).unwrap());
        reconstruct_character(&mut cleaned, &catalog);
        assert_eq!(
            cleaned.feats[0].effect,
            catalog.feat("Fleet of Foot").unwrap().effect(2).unwrap()
        );
    }

    #[test]
    fn test_import_remaps_relationship_graph() {
        let catalog = Catalog::builtin();
        let mut source = Roster::new();
        let primary = source.create_character("Mara", &catalog);
        source
            .set_attribute(primary, Attribute::Alteration, 5, &catalog)
            .unwrap();
        source
            .add_feat(primary, "Alternate Form", 1, None, &catalog)
            .unwrap();
        let form = source
            .grant_alternate_form(primary, "Mara (wolf)", 1, &catalog)
            .unwrap();

        let exported: Vec<Character> = source.iter().cloned().collect();
        let old_ids: Vec<CharacterId> = exported.iter().map(|c| c.id).collect();

        let mut target = Roster::new();
        let inserted = import_characters(&mut target, exported, &catalog);
        assert_eq!(inserted.len(), 2);
        // Every id is fresh
        for id in &inserted {
            assert!(!old_ids.contains(id));
        }

        // The graph shape survived: one primary with one alternate form
        let new_primary = target
            .iter()
            .find(|c| c.role.is_primary())
            .expect("imported primary");
        let forms = target.alternate_forms_of(new_primary.id);
        assert_eq!(forms.len(), 1);
        let new_form = target.get(forms[0]).unwrap();
        assert_eq!(new_form.name, "Mara (wolf)");
        assert_eq!(new_form.role.parent_id(), Some(new_primary.id));

        let _ = (primary, form);
    }

    #[test]
    fn test_import_promotes_orphans() {
        let catalog = Catalog::builtin();
        let stray_parent = CharacterId::new();
        let mut orphan = Character::new("Orphan");
        orphan.role = CharacterRole::AlternateForm {
            primary: stray_parent,
            tier: 1,
        };

        let mut target = Roster::new();
        let inserted = import_characters(&mut target, vec![orphan], &catalog);
        assert!(target.get(inserted[0]).unwrap().role.is_primary());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        use tempfile::TempDir;

        let catalog = Catalog::builtin();
        let (roster, id) = sample_roster(&catalog);

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("roster.json");

        let file = RosterFile::from_roster(&roster);
        file.save_json(&path).await.expect("Save should succeed");

        let loaded = RosterFile::load_json(&path)
            .await
            .expect("Load should succeed");
        assert_eq!(loaded.version, SAVE_VERSION);

        let restored = loaded.into_roster(&catalog);
        assert_eq!(restored.len(), 1);
        let ch = restored.get(id).expect("same id survives save/load");
        assert_eq!(ch.name, "Kestrel");
        assert_eq!(ch.attributes.get(Attribute::Alteration), 6);
        assert!(ch.has_boon("Haste"));
    }

    #[tokio::test]
    async fn test_peek_metadata() {
        use tempfile::TempDir;

        let catalog = Catalog::builtin();
        let (roster, _) = sample_roster(&catalog);

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("roster.json");
        RosterFile::from_roster(&roster)
            .save_json(&path)
            .await
            .expect("Save should succeed");

        let metadata = RosterFile::peek_metadata(&path)
            .await
            .expect("Peek should succeed");
        assert_eq!(metadata.character_count, 1);
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("roster.json");
        let content = serde_json::json!({
            "version": 99,
            "saved_at": "0",
            "characters": []
        });
        tokio::fs::write(&path, content.to_string())
            .await
            .expect("Write should succeed");

        let result = RosterFile::load_json(&path).await;
        assert!(matches!(
            result,
            Err(PersistError::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
    }

    #[test]
    fn test_clean_preserves_custom_details() {
        let catalog = Catalog::builtin();
        let mut roster = Roster::new();
        let id = roster.create_character("Test", &catalog);
        roster
            .add_feat(
                id,
                "Extraordinary Focus",
                1,
                Some(FeatDetail::Attribute(Attribute::Energy)),
                &catalog,
            )
            .unwrap();

        let cleaned = clean_character(roster.get(id).unwrap());
        assert_eq!(
            cleaned.feats[0].detail,
            Some(FeatDetail::Attribute(Attribute::Energy))
        );
    }
}
