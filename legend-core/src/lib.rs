//! Open Legend character engine.
//!
//! This crate provides:
//! - The character record and its invariants
//! - Derived-stat computation: effective attributes, defenses, hit points,
//!   movement, initiative, and point budgets folded over every modifier
//! - Eligibility checking for feats, boons, and banes
//! - Synchronization across linked characters (alternate forms, companions)
//! - Roster persistence, import with id remapping, and the clean/reconstruct
//!   export transform
//!
//! # Quick Start
//!
//! ```
//! use legend_core::{Attribute, Catalog, Roster};
//!
//! let catalog = Catalog::builtin();
//! let mut roster = Roster::new();
//!
//! let id = roster.create_character("Kestrel", &catalog);
//! roster.set_attribute(id, Attribute::Fortitude, 3, &catalog)?;
//! roster.set_attribute(id, Attribute::Presence, 2, &catalog)?;
//! roster.set_attribute(id, Attribute::Will, 1, &catalog)?;
//!
//! let stats = roster.derived(id, &catalog)?;
//! assert_eq!(stats.base_max_hp, 22);
//! # Ok::<(), legend_core::OpError>(())
//! ```

pub mod attributes;
pub mod catalog;
pub mod character;
pub mod dice;
pub mod eligibility;
pub mod engine;
pub mod equipment;
pub mod persist;
pub mod resolve;
pub mod roster;

// Primary public API
pub use attributes::{dice_for_score, score_cost, Attribute, AttributeScores, Defense};
pub use catalog::{BaneEntry, BoonEntry, Catalog, FeatEntry, CATALOG};
pub use character::{
    ActiveBane, ActiveBoon, Character, CharacterId, CharacterRole, FeatDetail, TakenFeat,
};
pub use engine::{DerivedStats, OpError};
pub use equipment::{EquipmentItem, EquipmentKind, ItemId, UniversalProperty};
pub use persist::{clean_character, import_characters, reconstruct_character, RosterFile};
pub use resolve::{AttributeDice, Movement, PointBudget};
pub use roster::{Roster, SyncField};
