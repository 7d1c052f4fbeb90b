//! Exhibit packet module.
//!
//! Provides the pure page sequencer and the CRDT-backed collaborative packet
//! document built on top of it.

pub mod codec;
pub mod ids;
pub mod manager;
pub mod model;
pub mod sequencer;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use codec::{pages_from_json, pages_to_json};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use manager::PacketManager;
pub use model::{LayoutEntry, PacketRoot, Page};
pub use sequencer::{
    compact_positions, compute_spans, create_page, delete_page, get_sorted_pages,
    has_dense_positions, layout, renumber_from, reorder, set_page_number, total_printed_pages,
    update_description,
};

#[cfg(feature = "wasm")]
pub use wasm::JsPacketManager;
