//! Data models for the exhibit packet.
//!
//! `Page` doubles as the persisted JSON shape (camelCase keys) and as the
//! CRDT value stored in the collaborative document via autosurgeon derives.

use autosurgeon::{Hydrate, Reconcile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// DOCUMENT ROOT
// =============================================================================

/// Root document structure for a collaborative exhibit packet.
///
/// Pages are keyed by id. There is no separate order list: `Page::position`
/// is the ordering key.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub struct PacketRoot {
    /// Packet title shown above the exhibit list.
    pub title: String,

    /// Map of page id -> Page.
    pub pages: HashMap<String, Page>,
}

impl PacketRoot {
    /// Creates a new empty packet root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if there are no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns the pages in storage order (unsorted).
    pub fn page_list(&self) -> Vec<Page> {
        self.pages.values().cloned().collect()
    }

    /// Replaces every page with the given collection.
    pub fn set_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages.into_iter().map(|p| (p.id.clone(), p)).collect();
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// One exhibit/attachment entry in the packet being assembled.
///
/// A page is not a single printed sheet: it starts at `page_number` and
/// occupies a span of printed pages inferred from the next page's number.
#[derive(Debug, Clone, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Unique identifier, immutable after creation.
    pub id: String,

    /// 1-based rank among all pages.
    pub position: i64,

    /// Free-text label, may be empty.
    #[serde(default)]
    pub description: String,

    /// Printed page number at which this exhibit begins.
    pub page_number: i64,

    /// Snippet captured by an extraction pass. Never touched by the sequencer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Page {
    /// Creates a page with an empty description.
    pub fn new(id: impl Into<String>, position: i64, page_number: i64) -> Self {
        Self {
            id: id.into(),
            position,
            description: String::new(),
            page_number,
            hint: None,
        }
    }

    /// Builder: Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: Set hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// =============================================================================
// LAYOUT ENTRY
// =============================================================================

/// One row of the printable exhibit list handed to the PDF renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub id: String,
    pub position: i64,
    pub description: String,
    /// First printed page.
    pub page_number: i64,
    /// Number of printed pages occupied.
    pub span: i64,
    /// Last printed page (inclusive).
    pub last_page: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_root_default() {
        let root = PacketRoot::default();
        assert!(root.is_empty());
        assert_eq!(root.len(), 0);
        assert!(root.title.is_empty());
    }

    #[test]
    fn test_page_builder() {
        let page = Page::new("p-1", 1, 1)
            .with_description("Exhibit A - Lease agreement")
            .with_hint("THIS LEASE is made on");

        assert_eq!(page.id, "p-1");
        assert_eq!(page.position, 1);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.description, "Exhibit A - Lease agreement");
        assert_eq!(page.hint.as_deref(), Some("THIS LEASE is made on"));
    }

    #[test]
    fn test_page_json_shape() {
        let page = Page::new("p-1", 2, 5).with_description("Invoice");
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["id"], "p-1");
        assert_eq!(json["position"], 2);
        assert_eq!(json["pageNumber"], 5);
        assert_eq!(json["description"], "Invoice");
        assert!(json.get("hint").is_none());
    }

    #[test]
    fn test_page_json_tolerates_extra_and_missing_fields() {
        let page: Page = serde_json::from_str(
            r#"{"id":"x","position":1,"pageNumber":3,"hint":"h","color":"red"}"#,
        )
        .unwrap();

        assert_eq!(page.description, "");
        assert_eq!(page.page_number, 3);
        assert_eq!(page.hint.as_deref(), Some("h"));
    }

    #[test]
    fn test_set_pages_keys_by_id() {
        let mut root = PacketRoot::new();
        root.set_pages(vec![Page::new("a", 1, 1), Page::new("b", 2, 4)]);

        assert_eq!(root.len(), 2);
        assert_eq!(root.pages["b"].page_number, 4);
    }
}
