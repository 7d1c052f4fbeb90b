//! WASM bindings for the packet module.
//!
//! Two surfaces for the browser:
//! - free functions that run one sequencer intent over a plain JS array of
//!   pages (for UIs that keep pages in their own state / localStorage)
//! - `JsPacketManager`, a wrapper around the collaborative document

use js_sys::{Array, Uint8Array};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

use super::ids::UuidIds;
use super::manager::PacketManager;
use super::model::Page;
use super::sequencer;
use crate::error::{PacketError, PacketResult};

/// Serialize a value to JsValue with HashMaps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

fn pages_from_js(pages: JsValue) -> Result<Vec<Page>, JsValue> {
    Ok(from_value(pages)?)
}

/// Converts a JS number to a page number, rounding to the nearest integer.
fn page_number_from_js(value: f64) -> PacketResult<i64> {
    if !value.is_finite() {
        return Err(PacketError::schema_violation(format!(
            "page number must be a finite number (got {})",
            value
        )));
    }
    // `as` saturates out-of-range floats at the i64 bounds
    Ok(value.round() as i64)
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<PacketError> for JsValue {
    fn from(err: PacketError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

/// Helper macro for Result conversion
macro_rules! js_result {
    ($expr:expr) => {
        $expr.map_err(|e: PacketError| JsValue::from(e))
    };
}

// =============================================================================
// PURE SEQUENCER FUNCTIONS
// =============================================================================

/// Returns `{ [id]: span }` for an array of pages.
///
/// # Example (JavaScript)
/// ```js
/// const spans = computeSpans(pages); // { "a1": 2, "b7": 3 }
/// ```
#[wasm_bindgen(js_name = computeSpans)]
pub fn compute_spans(pages: JsValue) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    Ok(to_js_value(&sequencer::compute_spans(&pages))?)
}

/// Builds the page "Add page" would append (caller pushes it).
///
/// # Example (JavaScript)
/// ```js
/// const page = createPage(pages);
/// setPages([...pages, page]);
/// ```
#[wasm_bindgen(js_name = createPage)]
pub fn create_page(pages: JsValue) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    let page = sequencer::create_page(&pages, &mut UuidIds);
    Ok(to_js_value(&page)?)
}

/// Applies an edited page number and shifts the pages after it.
///
/// # Example (JavaScript)
/// ```js
/// const next = renumberFrom(pages, { ...page, pageNumber: 5 }, page.pageNumber);
/// ```
#[wasm_bindgen(js_name = renumberFrom)]
pub fn renumber_from(
    pages: JsValue,
    updated_page: JsValue,
    old_page_number: f64,
) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    let updated: Page = from_value(updated_page)?;
    let old_page_number = page_number_from_js(old_page_number)?;
    let result = sequencer::renumber_from(&pages, &updated, old_page_number);
    Ok(to_js_value(&result)?)
}

/// Drag-and-drop: moves `draggedId` onto `targetId`'s slot.
///
/// # Example (JavaScript)
/// ```js
/// onDragEnd(({ active, over }) => setPages(reorderPages(pages, active.id, over.id)));
/// ```
#[wasm_bindgen(js_name = reorderPages)]
pub fn reorder_pages(pages: JsValue, dragged_id: &str, target_id: &str) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    Ok(to_js_value(&sequencer::reorder(&pages, dragged_id, target_id))?)
}

/// Returns the pages sorted by position.
#[wasm_bindgen(js_name = sortPages)]
pub fn sort_pages(pages: JsValue) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    Ok(to_js_value(&sequencer::get_sorted_pages(&pages))?)
}

/// Removes a page and compacts positions.
#[wasm_bindgen(js_name = deletePage)]
pub fn delete_page(pages: JsValue, id: &str) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    Ok(to_js_value(&sequencer::delete_page(&pages, id))?)
}

/// Returns the exhibit list rows for the PDF renderer.
#[wasm_bindgen(js_name = layoutPages)]
pub fn layout_pages(pages: JsValue) -> Result<JsValue, JsValue> {
    let pages = pages_from_js(pages)?;
    Ok(to_js_value(&sequencer::layout(&pages))?)
}

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around PacketManager.
#[wasm_bindgen]
pub struct JsPacketManager {
    inner: PacketManager,
}

#[wasm_bindgen]
impl JsPacketManager {
    /// Creates a new empty packet.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const packet = new JsPacketManager();
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsPacketManager {
        JsPacketManager {
            inner: PacketManager::new(),
        }
    }

    /// Loads from binary bytes (Uint8Array).
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(bytes: &[u8]) -> Result<JsPacketManager, JsValue> {
        let inner = js_result!(PacketManager::from_bytes(bytes))?;
        Ok(JsPacketManager { inner })
    }

    /// Loads from the JSON page list kept in localStorage.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const packet = JsPacketManager.fromJson(localStorage.getItem('pages') ?? '[]');
    /// ```
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<JsPacketManager, JsValue> {
        let inner = js_result!(PacketManager::from_json(json))?;
        Ok(JsPacketManager { inner })
    }

    /// Saves to binary bytes (returns Uint8Array).
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&mut self) -> Uint8Array {
        let bytes = self.inner.save();
        Uint8Array::from(&bytes[..])
    }

    /// Encodes the pages as the JSON page list.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// localStorage.setItem('pages', packet.toJson());
    /// ```
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&mut self) -> Result<String, JsValue> {
        js_result!(self.inner.to_json())
    }

    /// Gets the full document state (`title` and `pages` keyed by id).
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&mut self) -> Result<JsValue, JsValue> {
        let state = js_result!(self.inner.get_state())?;
        Ok(to_js_value(&state)?)
    }

    /// Gets the pages sorted by position.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// for (const page of packet.getPages()) {
    ///   console.log(page.position, page.pageNumber, page.description);
    /// }
    /// ```
    #[wasm_bindgen(js_name = getPages)]
    pub fn get_pages(&mut self) -> Result<JsValue, JsValue> {
        let pages = js_result!(self.inner.pages())?;
        Ok(to_js_value(&pages)?)
    }

    /// Gets the exhibit list rows for the PDF renderer.
    #[wasm_bindgen(js_name = getLayout)]
    pub fn get_layout(&mut self) -> Result<JsValue, JsValue> {
        let pages = js_result!(self.inner.pages())?;
        Ok(to_js_value(&sequencer::layout(&pages))?)
    }

    /// Gets the actor ID for this document instance.
    #[wasm_bindgen(js_name = actorId)]
    pub fn actor_id(&self) -> String {
        self.inner.actor_id()
    }

    /// Gets the current heads (for sync protocol).
    #[wasm_bindgen(js_name = getHeads)]
    pub fn get_heads(&mut self) -> Array {
        let heads = self.inner.get_heads();
        let array = Array::new();
        for head in heads {
            array.push(&JsValue::from_str(&head.to_string()));
        }
        array
    }
}

// =============================================================================
// PAGE INTENTS
// =============================================================================

#[wasm_bindgen]
impl JsPacketManager {
    /// Appends a new page; `hint` may be null. Returns the created page.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const page = packet.addPage(extracted?.snippet ?? null);
    /// ```
    #[wasm_bindgen(js_name = addPage)]
    pub fn add_page(&mut self, hint: Option<String>) -> Result<JsValue, JsValue> {
        let page = js_result!(self.inner.add_page_with_hint(hint.as_deref()))?;
        Ok(to_js_value(&page)?)
    }

    /// Deletes a page and compacts positions.
    #[wasm_bindgen(js_name = deletePage)]
    pub fn delete_page(&mut self, id: &str) -> Result<(), JsValue> {
        js_result!(self.inner.delete_page(id))
    }

    /// Sets a page description (O(1)).
    #[wasm_bindgen(js_name = setDescription)]
    pub fn set_description(&mut self, id: &str, description: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_description(id, description))
    }

    /// Sets the packet title (O(1)).
    #[wasm_bindgen(js_name = setTitle)]
    pub fn set_title(&mut self, title: &str) -> Result<(), JsValue> {
        js_result!(self.inner.set_title(title))
    }

    /// Edits a page number; the pages after it shift by the same amount.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// packet.setPageNumber(page.id, Number(event.target.value));
    /// ```
    #[wasm_bindgen(js_name = setPageNumber)]
    pub fn set_page_number(&mut self, id: &str, page_number: f64) -> Result<(), JsValue> {
        let page_number = page_number_from_js(page_number)?;
        if page_number < 1 {
            return Err(PacketError::schema_violation(format!(
                "page numbers start at 1 (got {})",
                page_number
            ))
            .into());
        }
        js_result!(self.inner.set_page_number(id, page_number))
    }

    /// Drag-and-drop reorder.
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> Result<(), JsValue> {
        js_result!(self.inner.reorder(dragged_id, target_id))
    }

    /// Restores dense positions; returns true if anything changed.
    pub fn normalize(&mut self) -> Result<bool, JsValue> {
        js_result!(self.inner.normalize())
    }
}

// =============================================================================
// SYNC PROTOCOL METHODS
// =============================================================================

#[wasm_bindgen]
impl JsPacketManager {
    /// Merges another manager's changes into this one.
    pub fn merge(&mut self, other: &mut JsPacketManager) -> Result<(), JsValue> {
        js_result!(self.inner.merge(&mut other.inner))
    }

    /// Generates a sync message with every change (full document).
    ///
    /// Returns a Uint8Array, or null if the document has no changes.
    #[wasm_bindgen(js_name = generateSyncMessage)]
    pub fn generate_sync_message(&mut self) -> JsValue {
        match self.inner.generate_sync_message(&[]) {
            Some(bytes) => Uint8Array::from(&bytes[..]).into(),
            None => JsValue::NULL,
        }
    }

    /// Applies a sync message from a peer.
    #[wasm_bindgen(js_name = applySyncMessage)]
    pub fn apply_sync_message(&mut self, msg: &[u8]) -> Result<(), JsValue> {
        js_result!(self.inner.apply_sync_message(msg))
    }
}

impl Default for JsPacketManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_from_js_rounds() {
        assert_eq!(page_number_from_js(4.0).unwrap(), 4);
        assert_eq!(page_number_from_js(2.6).unwrap(), 3);
        assert_eq!(page_number_from_js(1e300).unwrap(), i64::MAX);
    }

    #[test]
    fn test_page_number_from_js_rejects_non_finite() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = page_number_from_js(value).unwrap_err();
            assert!(matches!(err, PacketError::SchemaViolation(_)));
        }
    }
}
