//! What a tooltip says about its target.

use crate::core::knowledge_base::{EntityKind, EntityRecord};

/// Category used for `data-tooltip` fallbacks.
pub const GENERAL_CATEGORY: &str = "general";

/// Populated overlay text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipContent {
    /// Entity kind keyword, or `general`. Also applied as an overlay class.
    pub category: String,
    pub title: String,
    pub type_label: String,
    pub description: String,
    /// Extra attributes joined with ` • `.
    pub details: String,
}

impl TooltipContent {
    pub fn for_entity(record: &EntityRecord) -> Self {
        Self {
            category: record.kind.as_str().to_string(),
            title: record.display_name().to_string(),
            type_label: record.entity_type.clone(),
            description: record.description.clone(),
            details: format_details(record),
        }
    }

    /// Content for an element carrying only a `data-tooltip` attribute.
    pub fn general(title: &str, text: &str) -> Self {
        let title = if title.trim().is_empty() { "Information" } else { title.trim() };
        Self {
            category: GENERAL_CATEGORY.to_string(),
            title: title.to_string(),
            type_label: String::new(),
            description: text.to_string(),
            details: String::new(),
        }
    }
}

/// Attributes shown first for each kind, in this order.
fn preferred_keys(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Character => &["relationship", "location"],
        EntityKind::Location => &["status", "population"],
        EntityKind::Item => &["effects", "abilities"],
        EntityKind::Event => &["session", "outcome"],
    }
}

fn format_details(record: &EntityRecord) -> String {
    let preferred = preferred_keys(record.kind);
    let first = preferred
        .iter()
        .filter_map(|key| record.extra.get_key_value(*key));
    let rest = record
        .extra
        .iter()
        .filter(|(key, _)| !preferred.contains(&key.as_str()));

    first
        .chain(rest)
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| format!("{}: {}", label_for(key), value))
        .collect::<Vec<_>>()
        .join(" • ")
}

/// `population` → `Population`, `last_seen` → `Last Seen`.
fn label_for(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
