//! Campaign Knowledge Base
//!
//! Read-only store of the characters, locations, items and events that a
//! letter can reference. Lookups are total: an identifier that is not in the
//! table resolves to a placeholder record so a mistyped tag still renders.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::content::{fetch_json, ContentError, ContentSource};

/// Campaign table compiled into the binary.
const EMBEDDED_CAMPAIGN: &str = include_str!("../../data/campaign.json");

/// Type label used by every placeholder record.
pub const UNKNOWN_TYPE: &str = "Unknown";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum KnowledgeBaseError {
    #[error("Failed to read knowledge base source: {0}")]
    Source(#[from] ContentError),

    #[error("Knowledge base is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Knowledge base must be a JSON object, found {0}")]
    InvalidShape(&'static str),

    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),
}

pub type Result<T> = std::result::Result<T, KnowledgeBaseError>;

// ============================================================================
// Entity Kinds
// ============================================================================

/// The four kinds of entity a reference tag may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Character,
    Location,
    Item,
    Event,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Character,
        EntityKind::Location,
        EntityKind::Item,
        EntityKind::Event,
    ];

    /// Tag keyword, e.g. `character` in `{character:rothbart}`.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Character => "character",
            EntityKind::Location => "location",
            EntityKind::Item => "item",
            EntityKind::Event => "event",
        }
    }

    /// Top-level key of this kind's section in the JSON document.
    pub fn section(self) -> &'static str {
        match self {
            EntityKind::Character => "characters",
            EntityKind::Location => "locations",
            EntityKind::Item => "items",
            EntityKind::Event => "events",
        }
    }

    /// Attribute carrying the identifier on an annotated span.
    pub fn data_attribute(self) -> &'static str {
        match self {
            EntityKind::Character => "data-character",
            EntityKind::Location => "data-location",
            EntityKind::Item => "data-item",
            EntityKind::Event => "data-event",
        }
    }

    /// Class applied to annotated spans of this kind.
    pub fn css_class(self) -> &'static str {
        match self {
            EntityKind::Character => "character-ref",
            EntityKind::Location => "location-ref",
            EntityKind::Item => "item-ref",
            EntityKind::Event => "event-ref",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Character => "Character",
            EntityKind::Location => "Location",
            EntityKind::Item => "Item",
            EntityKind::Event => "Event",
        }
    }

    /// Tag keyword lookup without allocating an error.
    pub fn from_tag(keyword: &str) -> Option<Self> {
        EntityKind::ALL.into_iter().find(|k| k.as_str() == keyword)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = KnowledgeBaseError;

    fn from_str(s: &str) -> Result<Self> {
        EntityKind::from_tag(s).ok_or_else(|| KnowledgeBaseError::UnknownKind(s.to_string()))
    }
}

// ============================================================================
// Entity Records
// ============================================================================

/// One character, location, item or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub description: String,
    /// Any further attributes in source order (relationship, status, ...).
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, String>,
}

impl EntityRecord {
    /// Record synthesized for an identifier the knowledge base does not hold.
    pub fn placeholder(kind: EntityKind, id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: id.to_string(),
            entity_type: UNKNOWN_TYPE.to_string(),
            description: format!("{} data not available", kind.label()),
            extra: IndexMap::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.entity_type == UNKNOWN_TYPE && self.name == self.id
    }

    /// Visible text for an annotated span.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    fn matches(&self, term: &str) -> bool {
        [&self.name, &self.entity_type, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(term))
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name.clone()));
        obj.insert("type".into(), Value::String(self.entity_type.clone()));
        obj.insert("description".into(), Value::String(self.description.clone()));
        for (key, value) in &self.extra {
            obj.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(obj)
    }
}

/// Shape of one record in the source document.
#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    entity_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

impl RawEntity {
    fn into_record(self, kind: EntityKind, id: &str) -> EntityRecord {
        let extra = self
            .extra
            .into_iter()
            // Computed by older loaders, never authored.
            .filter(|(key, _)| key != "id" && key != "displayName")
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                other => Some((key, other.to_string())),
            })
            .collect();

        EntityRecord {
            id: id.to_string(),
            kind,
            name: self.name.unwrap_or_default(),
            entity_type: self.entity_type.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            extra,
        }
    }
}

// ============================================================================
// Knowledge Base
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    sections: [IndexMap<String, EntityRecord>; 4],
    case_insensitive: bool,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Icewind Dale campaign table shipped with the crate.
    pub fn embedded() -> Self {
        Self::from_json_str(EMBEDDED_CAMPAIGN).expect("embedded campaign data is valid")
    }

    /// Load from the configured source.
    pub async fn load(source: &ContentSource) -> Result<Self> {
        match source {
            ContentSource::Embedded => Ok(Self::embedded()),
            other => {
                let value: Value = fetch_json(other).await?;
                Self::from_value(value)
            }
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build from a parsed document. Missing or malformed sections degrade to
    /// empty ones.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(KnowledgeBaseError::InvalidShape(json_type_name(&value)));
        };

        let mut kb = Self::new();
        for kind in EntityKind::ALL {
            let section = match root.remove(kind.section()) {
                Some(Value::Object(section)) => section,
                Some(other) => {
                    tracing::warn!(
                        section = kind.section(),
                        found = json_type_name(&other),
                        "Campaign data section is not an object; treating as empty"
                    );
                    continue;
                }
                None => {
                    tracing::warn!(section = kind.section(), "Missing campaign data section");
                    continue;
                }
            };

            for (id, raw) in section {
                match serde_json::from_value::<RawEntity>(raw) {
                    Ok(raw) => kb.insert(raw.into_record(kind, &id)),
                    Err(e) => {
                        tracing::warn!(kind = %kind, id = %id, error = %e, "Skipping malformed record")
                    }
                }
            }
        }

        tracing::debug!(
            characters = kb.records(EntityKind::Character).count(),
            locations = kb.records(EntityKind::Location).count(),
            items = kb.records(EntityKind::Item).count(),
            events = kb.records(EntityKind::Event).count(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Match identifiers regardless of ASCII case.
    pub fn with_case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    pub fn insert(&mut self, record: EntityRecord) {
        self.sections[record.kind.index()].insert(record.id.clone(), record);
    }

    /// Exact (or case-folded) lookup.
    pub fn lookup(&self, kind: EntityKind, id: &str) -> Option<&EntityRecord> {
        let section = &self.sections[kind.index()];
        section.get(id).or_else(|| {
            if self.case_insensitive {
                section
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(id))
                    .map(|(_, record)| record)
            } else {
                None
            }
        })
    }

    /// Total lookup: unknown identifiers produce a placeholder.
    pub fn get(&self, kind: EntityKind, id: &str) -> Cow<'_, EntityRecord> {
        match self.lookup(kind, id) {
            Some(record) => Cow::Borrowed(record),
            None => {
                tracing::debug!(kind = %kind, id, "Entity not found, using placeholder");
                Cow::Owned(EntityRecord::placeholder(kind, id))
            }
        }
    }

    pub fn records(&self, kind: EntityKind) -> impl Iterator<Item = &EntityRecord> {
        self.sections[kind.index()].values()
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive substring search over name, type and description.
    pub fn search(&self, term: &str) -> Vec<&EntityRecord> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        EntityKind::ALL
            .into_iter()
            .flat_map(|kind| self.records(kind))
            .filter(|record| record.matches(&term))
            .collect()
    }

    /// Serialize back into the source document shape.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for kind in EntityKind::ALL {
            let section: Map<String, Value> = self
                .records(kind)
                .map(|record| (record.id.clone(), record.to_json()))
                .collect();
            root.insert(kind.section().to_string(), Value::Object(section));
        }
        Value::Object(root)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
