//! JSON codec for the persisted page list.
//!
//! The stored shape is a flat array of `{ id, position, description,
//! pageNumber, hint? }`. Array order carries no meaning; output is written in
//! position order so saved files diff cleanly.

use crate::error::PacketResult;

use super::model::Page;
use super::sequencer::get_sorted_pages;

/// Encodes pages as a pretty-printed JSON array, sorted by position.
pub fn pages_to_json(pages: &[Page]) -> PacketResult<String> {
    Ok(serde_json::to_string_pretty(&get_sorted_pages(pages))?)
}

/// Decodes a JSON array of pages. Unknown keys are ignored.
pub fn pages_from_json(json: &str) -> PacketResult<Vec<Page>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacketError;

    #[test]
    fn test_output_is_position_ordered() {
        let json = pages_to_json(&[Page::new("b", 2, 4), Page::new("a", 1, 1)]).unwrap();
        let a = json.find("\"a\"").unwrap();
        let b = json.find("\"b\"").unwrap();

        assert!(a < b);
        assert!(json.contains("\"pageNumber\": 4"));
    }

    #[test]
    fn test_reads_browser_storage_shape() {
        let json = r#"[
            {"id":"x1","position":2,"description":"Invoice","pageNumber":3},
            {"id":"x0","position":1,"description":"","pageNumber":1,"hint":"Dear Sir"}
        ]"#;
        let pages = pages_from_json(json).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].description, "Invoice");
        assert_eq!(pages[1].hint.as_deref(), Some("Dear Sir"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = pages_from_json("[{\"id\": 1}]").unwrap_err();
        assert!(matches!(err, PacketError::Json(_)));
    }
}
