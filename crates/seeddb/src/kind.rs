//! Entity kinds that can be related to a URL, and the per-kind lookup table
//!
//! Adding a kind means adding an [`EntityKind`] variant and one row to
//! [`KIND_SPECS`]; the client builds its caches and response selectors from
//! the table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::{NamedEntity, Relation};

/// Category of entity a URL can be related to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Person or group credited on releases
    Artist,
    /// Imprint or organization releasing recordings
    Label,
}

impl EntityKind {
    /// All kinds, in table order
    pub const ALL: [EntityKind; 2] = [EntityKind::Artist, EntityKind::Label];

    /// Static lookup parameters for this kind
    pub fn spec(self) -> &'static KindSpec {
        &KIND_SPECS[self as usize]
    }

    /// Name used by the remote API for this kind
    pub fn as_str(self) -> &'static str {
        self.spec().target_type
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one entity kind is requested and read back from the remote API
pub struct KindSpec {
    /// Kind described by this row
    pub kind: EntityKind,
    /// `target-type` attribute of the matching relation list
    pub target_type: &'static str,
    /// Token passed in the `inc` query parameter
    pub include: &'static str,
    /// Picks the related entity out of a relation record
    pub select: fn(&Relation) -> Option<&NamedEntity>,
}

/// Per-kind table, indexed by `EntityKind as usize`
pub static KIND_SPECS: [KindSpec; 2] = [
    KindSpec {
        kind: EntityKind::Artist,
        target_type: "artist",
        include: "artist-rels",
        select: select_artist,
    },
    KindSpec {
        kind: EntityKind::Label,
        target_type: "label",
        include: "label-rels",
        select: select_label,
    },
];

fn select_artist(rel: &Relation) -> Option<&NamedEntity> {
    rel.artist.as_ref()
}

fn select_label(rel: &Relation) -> Option<&NamedEntity> {
    rel.label.as_ref()
}

/// Identifier and display name of a related entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityInfo {
    /// Canonical identifier (MBID)
    pub id: String,
    /// Display name as stored in the database
    pub name: String,
}

impl EntityInfo {
    /// Build an entity from its identifier and name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
