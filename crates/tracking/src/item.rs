//! Tracked item catalog: the medications, symptoms or triggers a participant can select.
//!
//! Catalog entries are read from task definitions and only ever supply display text and
//! defaults. The participant's own data lives in the answers built from them.

use crate::{parse_wire, TrackingError, TrackingResult};
use datatrack_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A selectable item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedItem {
    pub identifier: NonEmptyText,
    pub section_identifier: Option<String>,
    pub title: Option<String>,
    pub short_text: Option<String>,
    pub detail: Option<String>,
    /// Selecting this item deselects every other item.
    pub is_exclusive: bool,
    pub icon: Option<String>,
    /// Medications only: the medication is delivered by continuous injection and has no
    /// dosage schedule.
    pub is_continuous_injection: Option<bool>,
}

impl TrackedItem {
    pub fn new(identifier: NonEmptyText) -> Self {
        Self {
            identifier,
            section_identifier: None,
            title: None,
            short_text: None,
            detail: None,
            is_exclusive: false,
            icon: None,
            is_continuous_injection: None,
        }
    }

    /// Display text: the title, else the short text, else the identifier.
    pub fn text(&self) -> &str {
        self.title
            .as_deref()
            .or(self.short_text.as_deref())
            .unwrap_or(self.identifier.as_str())
    }

    pub fn from_json(json: &Value) -> TrackingResult<Self> {
        let wire: TrackedItemWire = parse_wire(json, "Tracked item", "")?;
        item_wire_to_domain(wire, "")
    }

    pub fn to_json(&self) -> TrackingResult<Value> {
        serde_json::to_value(item_domain_to_wire(self))
            .map_err(|e| TrackingError::Translation(format!("Failed to serialize tracked item: {e}")))
    }
}

/// A heading that groups catalog items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedSection {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// The items and sections offered for selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackedCatalog {
    pub items: Vec<TrackedItem>,
    pub sections: Vec<TrackedSection>,
}

impl TrackedCatalog {
    /// Parses a catalog document: `{"items": [...], "sections": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Translation`] naming the failing path when the document does not
    /// match the schema, or when an item has an empty identifier.
    pub fn parse(json: &Value) -> TrackingResult<Self> {
        let wire: CatalogWire = parse_wire(json, "Tracked item catalog", "")?;
        let items = wire
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| item_wire_to_domain(item, &format!("items[{index}]")))
            .collect::<TrackingResult<Vec<_>>>()?;
        Ok(Self {
            items,
            sections: wire.sections,
        })
    }

    pub fn item(&self, identifier: &str) -> Option<&TrackedItem> {
        self.items.iter().find(|item| item.identifier == identifier)
    }

    pub fn items_in_section(&self, section_identifier: &str) -> Vec<&TrackedItem> {
        self.items
            .iter()
            .filter(|item| item.section_identifier.as_deref() == Some(section_identifier))
            .collect()
    }
}

/// The participant's answer for one selected item.
pub trait TrackedItemAnswer {
    fn identifier(&self) -> &str;

    /// Whether enough has been entered for the answer to count as complete.
    fn has_required_values(&self) -> bool;
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct TrackedItemWire {
    identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    section_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    short_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(default)]
    is_exclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(rename = "injection", default, skip_serializing_if = "Option::is_none")]
    is_continuous_injection: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CatalogWire {
    #[serde(default)]
    items: Vec<TrackedItemWire>,
    #[serde(default)]
    sections: Vec<TrackedSection>,
}

fn item_wire_to_domain(wire: TrackedItemWire, path: &str) -> TrackingResult<TrackedItem> {
    let identifier = NonEmptyText::new(&wire.identifier).map_err(|_| {
        let path = if path.is_empty() { "<root>" } else { path };
        TrackingError::Translation(format!("Tracked item at {path} has an empty identifier"))
    })?;
    Ok(TrackedItem {
        identifier,
        section_identifier: wire.section_identifier,
        title: wire.title,
        short_text: wire.short_text,
        detail: wire.detail,
        is_exclusive: wire.is_exclusive,
        icon: wire.icon,
        is_continuous_injection: wire.is_continuous_injection,
    })
}

fn item_domain_to_wire(item: &TrackedItem) -> TrackedItemWire {
    TrackedItemWire {
        identifier: item.identifier.to_string(),
        section_identifier: item.section_identifier.clone(),
        title: item.title.clone(),
        short_text: item.short_text.clone(),
        detail: item.detail.clone(),
        is_exclusive: item.is_exclusive,
        icon: item.icon.clone(),
        is_continuous_injection: item.is_continuous_injection,
    }
}
