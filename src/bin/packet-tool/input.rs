//! Input structs for reading page lists saved by the browser app.
//!
//! Older saves are loosely typed. Key differences from the library model:
//! - every field may be missing
//! - numbers may be floats or numeric strings, ids may be numbers
//! - `page_number` appears snake-cased in some exports
//! - the list may be bare or wrapped as `{ title, pages }`

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// =============================================================================
// ROOT
// =============================================================================

/// A saved packet: a bare page array or a titled wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InputPacket {
    Pages(Vec<InputPage>),
    Document {
        #[serde(default)]
        title: String,
        pages: Vec<InputPage>,
    },
}

impl InputPacket {
    /// Splits into the optional title and the page list.
    pub fn into_parts(self) -> (Option<String>, Vec<InputPage>) {
        match self {
            InputPacket::Pages(pages) => (None, pages),
            InputPacket::Document { title, pages } => {
                let title = if title.is_empty() { None } else { Some(title) };
                (title, pages)
            }
        }
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// One page-like object as found in storage.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPage {
    #[serde(default, deserialize_with = "loose_string")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "loose_int")]
    pub position: Option<i64>,

    #[serde(default, deserialize_with = "loose_string")]
    pub description: Option<String>,

    #[serde(default, alias = "page_number", deserialize_with = "loose_int")]
    pub page_number: Option<i64>,

    #[serde(default, deserialize_with = "loose_string")]
    pub hint: Option<String>,
}

// =============================================================================
// LOOSE SCALARS
// =============================================================================

/// Integer from a JSON number (floats are rounded) or numeric string.
fn loose_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }))
}

/// String from a JSON string or number.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}
