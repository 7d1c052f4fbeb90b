//! Collaborative packet document.
//!
//! `PacketManager` wraps an Automerge document holding a `PacketRoot` and
//! routes every page intent through the pure sequencer:
//! - High-level operations via autosurgeon (hydrate/reconcile): the sequencer
//!   computes the new page list and reconcile writes only what changed
//! - Targeted text updates via direct put operations (O(1) instead of O(N))
//! - Save/load, merge and incremental sync of the underlying document

use std::collections::HashSet;

use automerge::{
    transaction::Transactable, AutoCommit, ChangeHash, ObjId, ReadDoc, ScalarValue, Value, ROOT,
};
use autosurgeon::{hydrate, reconcile};
use tracing::debug;

use super::codec::{pages_from_json, pages_to_json};
use super::ids::{IdGenerator, UuidIds};
use super::model::{PacketRoot, Page};
use super::sequencer;
use crate::error::{PacketError, PacketResult};

/// The collaborative document manager for one exhibit packet.
///
/// # Caching Strategy
///
/// - `cached_state`: Full PacketRoot, invalidated on any direct mutation
/// - `cached_pages_obj`: ObjId of the "pages" map, invalidated on load/merge/sync
pub struct PacketManager {
    doc: AutoCommit,
    /// Source of ids for new pages.
    ids: Box<dyn IdGenerator>,
    /// Cached hydrated state - invalidated after direct document mutations.
    cached_state: Option<PacketRoot>,
    /// Cached ObjId for the "pages" map.
    cached_pages_obj: Option<ObjId>,
}

impl PacketManager {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates a new empty packet with an initialized document schema.
    pub fn new() -> Self {
        let mut doc = AutoCommit::new();
        let root = PacketRoot::default();
        reconcile(&mut doc, &root).expect("Failed to initialize document");
        Self {
            doc,
            ids: Box::new(UuidIds),
            cached_state: Some(root),
            cached_pages_obj: None,
        }
    }

    /// Loads a packet from saved binary data.
    pub fn from_bytes(bytes: &[u8]) -> PacketResult<Self> {
        let doc = AutoCommit::load(bytes)?;
        debug!(bytes = bytes.len(), "loaded packet document");
        Ok(Self {
            doc,
            ids: Box::new(UuidIds),
            cached_state: None,
            cached_pages_obj: None,
        })
    }

    /// Creates a packet from the persisted JSON page list.
    pub fn from_json(json: &str) -> PacketResult<Self> {
        let pages = pages_from_json(json)?;
        let mut manager = Self::new();
        manager.replace_pages(pages)?;
        Ok(manager)
    }

    /// Builder: Use a different id source for new pages.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Saves the document to binary format.
    pub fn save(&mut self) -> Vec<u8> {
        self.doc.save()
    }

    /// Encodes the pages as the persisted JSON page list.
    pub fn to_json(&mut self) -> PacketResult<String> {
        let pages = self.pages()?;
        pages_to_json(&pages)
    }

    /// Returns the current heads (for sync protocol).
    pub fn get_heads(&mut self) -> Vec<ChangeHash> {
        self.doc.get_heads()
    }

    /// Gets the actor ID for this document instance.
    pub fn actor_id(&self) -> String {
        self.doc.get_actor().to_hex_string()
    }

    fn invalidate_all_caches(&mut self) {
        self.cached_state = None;
        self.cached_pages_obj = None;
    }

    // =========================================================================
    // HIGH-LEVEL OPERATIONS (via Hydrate/Reconcile)
    // =========================================================================

    /// Hydrates the entire document state to Rust structs.
    pub fn get_state(&mut self) -> PacketResult<PacketRoot> {
        if let Some(ref cached) = self.cached_state {
            return Ok(cached.clone());
        }
        let state: PacketRoot = hydrate(&self.doc)?;
        self.cached_state = Some(state.clone());
        Ok(state)
    }

    /// Applies a function to mutate the state, then reconciles back to the document.
    pub fn update_state<F>(&mut self, f: F) -> PacketResult<()>
    where
        F: FnOnce(&mut PacketRoot),
    {
        let mut state = self.get_state()?;
        f(&mut state);
        reconcile(&mut self.doc, &state)?;
        self.cached_state = Some(state);
        Ok(())
    }

    /// Runs a sequencer intent over the full page list and stores the result.
    fn apply<F>(&mut self, intent: F) -> PacketResult<()>
    where
        F: FnOnce(&[Page]) -> Vec<Page>,
    {
        self.update_state(|state| {
            let pages = intent(&state.page_list());
            state.set_pages(pages);
        })
    }

    /// Returns all pages in position order.
    pub fn pages(&mut self) -> PacketResult<Vec<Page>> {
        let state = self.get_state()?;
        Ok(sequencer::get_sorted_pages(&state.page_list()))
    }

    /// Gets a page by ID.
    pub fn get_page(&mut self, id: &str) -> PacketResult<Option<Page>> {
        let state = self.get_state()?;
        Ok(state.pages.get(id).cloned())
    }

    /// Appends a new empty page after the current last page.
    pub fn add_page(&mut self) -> PacketResult<Page> {
        self.add_page_with_hint(None)
    }

    /// Appends a new page carrying an extraction hint.
    pub fn add_page_with_hint(&mut self, hint: Option<&str>) -> PacketResult<Page> {
        let state = self.get_state()?;
        let mut page = sequencer::create_page(&state.page_list(), self.ids.as_mut());
        page.hint = hint.map(str::to_string);

        let stored = page.clone();
        self.update_state(|state| {
            state.pages.insert(stored.id.clone(), stored);
        })?;
        debug!(id = %page.id, position = page.position, page_number = page.page_number, "added page");
        Ok(page)
    }

    /// Deletes a page and compacts the remaining positions.
    pub fn delete_page(&mut self, id: &str) -> PacketResult<()> {
        self.apply(|pages| sequencer::delete_page(pages, id))
    }

    /// Edits one page's printed page number; later pages shift with it.
    pub fn set_page_number(&mut self, id: &str, page_number: i64) -> PacketResult<()> {
        self.apply(|pages| sequencer::set_page_number(pages, id, page_number))
    }

    /// Moves a page onto another page's slot (drag-and-drop).
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> PacketResult<()> {
        self.apply(|pages| sequencer::reorder(pages, dragged_id, target_id))
    }

    /// Replaces every page, e.g. after loading a saved page list.
    ///
    /// Pages are stored keyed by id, so a list that repeats an id is rejected
    /// instead of silently losing pages.
    pub fn replace_pages(&mut self, pages: Vec<Page>) -> PacketResult<()> {
        let mut seen = HashSet::with_capacity(pages.len());
        if let Some(dup) = pages.iter().find(|p| !seen.insert(p.id.as_str())) {
            return Err(PacketError::schema_violation(format!(
                "duplicate page id: {}",
                dup.id
            )));
        }
        self.update_state(|state| state.set_pages(pages))
    }

    /// Restores dense positions after merges or loose imports.
    ///
    /// Returns true when positions had to be rewritten.
    pub fn normalize(&mut self) -> PacketResult<bool> {
        let state = self.get_state()?;
        let pages = state.page_list();
        if sequencer::has_dense_positions(&pages) {
            return Ok(false);
        }
        debug!(pages = pages.len(), "compacting non-dense positions");
        self.replace_pages(sequencer::compact_positions(&pages))?;
        Ok(true)
    }

    // =========================================================================
    // TARGETED TEXT UPDATES (Direct put, O(1))
    // =========================================================================

    /// Sets a page description directly, bypassing full reconcile.
    pub fn set_description(&mut self, id: &str, description: &str) -> PacketResult<()> {
        self.cached_state = None;
        let page_obj = self.get_page_obj(id)?;
        self.doc
            .put(&page_obj, "description", ScalarValue::Str(description.into()))?;
        Ok(())
    }

    /// Sets the packet title (O(1)).
    pub fn set_title(&mut self, title: &str) -> PacketResult<()> {
        self.cached_state = None;
        self.doc.put(&ROOT, "title", ScalarValue::Str(title.into()))?;
        Ok(())
    }

    // =========================================================================
    // SYNC OPERATIONS
    // =========================================================================

    /// Merges another document into this one.
    pub fn merge(&mut self, other: &mut Self) -> PacketResult<()> {
        self.invalidate_all_caches();
        self.doc.merge(&mut other.doc)?;
        debug!(actor = %self.actor_id(), "merged packet document");
        Ok(())
    }

    /// Generates sync message for incremental sync.
    /// Returns None if there are no changes since their_heads.
    pub fn generate_sync_message(&mut self, their_heads: &[ChangeHash]) -> Option<Vec<u8>> {
        let changes = self.doc.get_changes(their_heads);
        if changes.is_empty() {
            return None;
        }
        let mut bytes = Vec::new();
        for change in changes {
            bytes.extend_from_slice(change.raw_bytes());
        }
        Some(bytes)
    }

    /// Applies sync message from peer.
    pub fn apply_sync_message(&mut self, msg: &[u8]) -> PacketResult<()> {
        self.invalidate_all_caches();
        self.doc.load_incremental(msg)?;
        debug!(bytes = msg.len(), "applied sync message");
        Ok(())
    }

    // =========================================================================
    // INTERNAL HELPERS - WITH TOPOLOGY CACHING
    // =========================================================================

    /// Gets the cached "pages" map ObjId, or discovers it.
    fn get_pages_obj(&mut self) -> PacketResult<ObjId> {
        if let Some(ref obj) = self.cached_pages_obj {
            return Ok(obj.clone());
        }
        let obj = match self.doc.get(&ROOT, "pages")? {
            Some((Value::Object(_), obj_id)) => obj_id,
            Some(_) => return Err(PacketError::schema_violation("'pages' is not an object")),
            None => return Err(PacketError::field_not_found("pages")),
        };
        self.cached_pages_obj = Some(obj.clone());
        Ok(obj)
    }

    /// Gets a page's ObjId using the cached pages map.
    fn get_page_obj(&mut self, id: &str) -> PacketResult<ObjId> {
        let pages_obj = self.get_pages_obj()?;
        match self.doc.get(&pages_obj, id)? {
            Some((Value::Object(_), obj_id)) => Ok(obj_id),
            Some(_) => Err(PacketError::schema_violation(format!(
                "page '{}' is not an object",
                id
            ))),
            None => Err(PacketError::page_not_found(id)),
        }
    }
}

impl Default for PacketManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::ids::SequentialIds;
    use pretty_assertions::assert_eq;

    fn manager_with_pages(count: usize) -> PacketManager {
        let mut manager = PacketManager::new().with_id_generator(SequentialIds::new("p"));
        for _ in 0..count {
            manager.add_page().unwrap();
        }
        manager
    }

    fn order(manager: &mut PacketManager) -> Vec<String> {
        manager.pages().unwrap().into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_new_manager() {
        let mut manager = PacketManager::new();
        let state = manager.get_state().unwrap();
        assert!(state.is_empty());
        assert!(manager.pages().unwrap().is_empty());
    }

    #[test]
    fn test_add_pages() {
        let mut manager = manager_with_pages(0);
        let first = manager.add_page().unwrap();
        let second = manager.add_page_with_hint(Some("RECEIVED FROM")).unwrap();

        assert_eq!((first.position, first.page_number), (1, 1));
        assert_eq!((second.position, second.page_number), (2, 2));
        assert_eq!(second.hint.as_deref(), Some("RECEIVED FROM"));
        assert_eq!(order(&mut manager), vec!["p-1", "p-2"]);
    }

    #[test]
    fn test_default_ids_are_uuids() {
        let mut manager = PacketManager::new();
        let page = manager.add_page().unwrap();
        assert!(uuid::Uuid::parse_str(&page.id).is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let mut manager = manager_with_pages(2);
        manager.set_description("p-2", "Exhibit B").unwrap();

        let bytes = manager.save();
        let mut loaded = PacketManager::from_bytes(&bytes).unwrap();

        let pages = loaded.pages().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].description, "Exhibit B");
    }

    #[test]
    fn test_set_description_targeted() {
        let mut manager = manager_with_pages(1);
        manager.set_description("p-1", "Lease agreement").unwrap();

        let page = manager.get_page("p-1").unwrap().unwrap();
        assert_eq!(page.description, "Lease agreement");
    }

    #[test]
    fn test_set_description_unknown_page() {
        let mut manager = manager_with_pages(1);
        let err = manager.set_description("ghost", "x").unwrap_err();
        assert!(matches!(err, PacketError::PageNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_set_title() {
        let mut manager = PacketManager::new();
        manager.set_title("Affidavit of Service").unwrap();
        assert_eq!(manager.get_state().unwrap().title, "Affidavit of Service");
    }

    #[test]
    fn test_set_page_number_shifts_following() {
        let mut manager = manager_with_pages(3);
        manager.set_page_number("p-2", 5).unwrap();

        let numbers: Vec<i64> = manager.pages().unwrap().iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 5, 6]);
    }

    #[test]
    fn test_reorder_and_delete() {
        let mut manager = manager_with_pages(4);
        manager.set_page_number("p-2", 4).unwrap();

        manager.reorder("p-4", "p-1").unwrap();
        assert_eq!(order(&mut manager), vec!["p-4", "p-1", "p-2", "p-3"]);

        manager.delete_page("p-1").unwrap();
        let pages = manager.pages().unwrap();
        let positions: Vec<i64> = pages.iter().map(|p| p.position).collect();
        assert_eq!(order(&mut manager), vec!["p-4", "p-2", "p-3"]);
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(manager.get_page("p-1").unwrap().is_none());
    }

    #[test]
    fn test_unknown_ids_leave_document_alone() {
        let mut manager = manager_with_pages(2);
        let before = manager.pages().unwrap();

        manager.reorder("ghost", "p-1").unwrap();
        manager.delete_page("ghost").unwrap();
        manager.set_page_number("ghost", 9).unwrap();

        assert_eq!(manager.pages().unwrap(), before);
    }

    #[test]
    fn test_json_persistence() {
        let mut manager = manager_with_pages(2);
        manager.set_description("p-1", "Invoice").unwrap();
        let json = manager.to_json().unwrap();

        let mut restored = PacketManager::from_json(&json).unwrap();
        assert_eq!(restored.pages().unwrap(), manager.pages().unwrap());
    }

    #[test]
    fn test_from_json_rejects_duplicate_ids() {
        let json = r#"[
            {"id":"x","position":1,"description":"A","pageNumber":1},
            {"id":"x","position":2,"description":"B","pageNumber":3}
        ]"#;
        let err = PacketManager::from_json(json).err().unwrap();
        assert!(matches!(err, PacketError::SchemaViolation(_)));

        let mut manager = manager_with_pages(2);
        let err = manager
            .replace_pages(vec![Page::new("p-1", 1, 1), Page::new("p-1", 2, 2)])
            .unwrap_err();
        assert!(matches!(err, PacketError::SchemaViolation(_)));
        assert_eq!(manager.pages().unwrap().len(), 2);
    }

    #[test]
    fn test_merge_concurrent_appends_then_normalize() {
        let mut base = PacketManager::new().with_id_generator(SequentialIds::new("base"));
        base.add_page().unwrap();

        let bytes = base.save();
        let mut client_a = PacketManager::from_bytes(&bytes)
            .unwrap()
            .with_id_generator(SequentialIds::new("a"));
        let mut client_b = PacketManager::from_bytes(&bytes)
            .unwrap()
            .with_id_generator(SequentialIds::new("b"));

        // Both replicas append at position 2
        client_a.add_page().unwrap();
        client_b.add_page().unwrap();

        client_a.merge(&mut client_b).unwrap();
        let merged = client_a.pages().unwrap();
        assert_eq!(merged.len(), 3);
        assert!(!sequencer::has_dense_positions(&merged));

        assert!(client_a.normalize().unwrap());
        assert_eq!(order(&mut client_a), vec!["base-1", "a-1", "b-1"]);
        assert!(!client_a.normalize().unwrap());
    }

    #[test]
    fn test_incremental_sync() {
        let mut a = manager_with_pages(1);
        let mut b = PacketManager::from_bytes(&a.save()).unwrap();

        let heads = b.get_heads();
        a.add_page().unwrap();
        a.set_description("p-2", "Photographs").unwrap();

        let msg = a.generate_sync_message(&heads).unwrap();
        b.apply_sync_message(&msg).unwrap();

        let page = b.get_page("p-2").unwrap().unwrap();
        assert_eq!(page.description, "Photographs");

        let heads = a.get_heads();
        assert!(a.generate_sync_message(&heads).is_none());
    }
}
