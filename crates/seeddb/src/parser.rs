//! Identifier validation and response decoding
//!
//! Identifiers (MBIDs) are lowercase UUIDs:
//! ```text
//! xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
//! ```
//!
//! Entity lookups answer with JSON carrying a numeric `id`. URL lookups
//! answer with XML:
//! ```text
//! <metadata>
//!   <url id="...">
//!     <resource>https://...</resource>
//!     <relation-list target-type="artist">
//!       <relation type="bandcamp">
//!         <target>MBID</target>
//!         <artist id="MBID"><name>Name</name></artist>
//!       </relation>
//!     </relation-list>
//!   </url>
//! </metadata>
//! ```

use std::collections::HashSet;

use nom::{
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, recognize},
    sequence::tuple,
    IResult,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::kind::{EntityInfo, EntityKind};

fn is_lower_hex(c: char) -> bool {
    matches!(c, '0'..='9' | 'a'..='f')
}

fn hex_run<'a>(len: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    take_while_m_n(len, len, is_lower_hex)
}

fn mbid(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        hex_run(8),
        char('-'),
        hex_run(4),
        char('-'),
        hex_run(4),
        char('-'),
        hex_run(4),
        char('-'),
        hex_run(12),
    )))(input)
}

/// Check that `input` is exactly one MBID
pub fn parse_mbid(input: &str) -> Result<&str> {
    all_consuming(mbid)(input)
        .map(|(_, id)| id)
        .map_err(|_| Error::InvalidIdentifier(input.to_string()))
}

#[derive(Debug, Deserialize)]
struct EntityResponse {
    #[serde(default)]
    id: Option<u64>,
}

/// Extract the database ID from an entity lookup response
pub fn decode_entity_id(body: &str) -> Result<u64> {
    let resp: EntityResponse = serde_json::from_str(body)?;
    match resp.id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(Error::MissingData("entity response has no database ID".to_string())),
    }
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    url: Option<UrlNode>,
}

#[derive(Debug, Default, Deserialize)]
struct UrlNode {
    #[serde(rename = "relation-list", default)]
    relation_lists: Vec<RelationList>,
}

#[derive(Debug, Deserialize)]
struct RelationList {
    #[serde(rename = "@target-type", default)]
    target_type: String,
    #[serde(rename = "relation", default)]
    relations: Vec<Relation>,
}

/// One relation record between a URL and an entity
#[derive(Debug, Deserialize)]
pub struct Relation {
    /// Relationship type, e.g. `bandcamp` or `discogs`
    #[serde(rename = "@type", default)]
    pub relation_type: String,
    /// Identifier of the related entity
    #[serde(default)]
    pub target: Option<Target>,
    /// Related artist, for artist relation lists
    #[serde(default)]
    pub artist: Option<NamedEntity>,
    /// Related label, for label relation lists
    #[serde(default)]
    pub label: Option<NamedEntity>,
}

/// Text of a relation's `<target>` element
#[derive(Debug, Deserialize)]
pub struct Target {
    /// Target identifier
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// Entity embedded in a relation record
#[derive(Debug, Deserialize)]
pub struct NamedEntity {
    /// Entity identifier
    #[serde(rename = "@id", default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// Extract the entities of `kind` related to the looked-up URL.
///
/// Document order is kept; an entity linked more than once is listed once.
pub fn decode_relations(body: &str, kind: EntityKind) -> Result<Vec<EntityInfo>> {
    let metadata: Metadata = quick_xml::de::from_str(body)?;
    let Some(url) = metadata.url else {
        return Ok(Vec::new());
    };

    let spec = kind.spec();
    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    let relations = url
        .relation_lists
        .iter()
        .filter(|list| list.target_type == spec.target_type)
        .flat_map(|list| list.relations.iter());

    for rel in relations {
        let Some(entity) = (spec.select)(rel) else {
            continue;
        };
        let id = if entity.id.is_empty() {
            rel.target.as_ref().map(|t| t.value.trim()).unwrap_or_default()
        } else {
            entity.id.as_str()
        };
        if id.is_empty() || !seen.insert(id.to_string()) {
            continue;
        }
        entities.push(EntityInfo::new(id, entity.name.as_str()));
    }

    Ok(entities)
}
