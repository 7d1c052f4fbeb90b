//! Packet Sequencer - exhibit page ordering for assembled legal packets.
//!
//! An affidavit packet is a list of exhibits ("pages"). Each one has a rank
//! (`position`) and the printed page number it starts on. This crate keeps
//! both consistent while the user edits the list:
//!
//! - **Pure sequencer**: append, delete, renumber and drag-reorder as
//!   functions from a page list to a new page list. No state, no errors.
//! - **Derived spans**: how many printed pages an exhibit covers is inferred
//!   from the next exhibit's number, never stored.
//! - **Collaborative document**: `PacketManager` keeps the pages in an
//!   Automerge document for save/load, merge and incremental sync.
//!
//! # Example
//!
//! ```rust
//! use packet_sequencer::{create_page, reorder, get_sorted_pages, SequentialIds};
//!
//! let mut ids = SequentialIds::new("page");
//! let mut pages = Vec::new();
//! for _ in 0..3 {
//!     let page = create_page(&pages, &mut ids);
//!     pages.push(page);
//! }
//!
//! // Drag the last exhibit onto the first one
//! let pages = reorder(&pages, "page-3", "page-1");
//! let order: Vec<_> = get_sorted_pages(&pages).into_iter().map(|p| p.id).collect();
//! assert_eq!(order, ["page-3", "page-1", "page-2"]);
//! ```

pub mod error;

// Packet module
pub mod packet;

// Re-exports for convenience
pub use error::{PacketError, PacketResult};
pub use packet::{
    compact_positions, compute_spans, create_page, delete_page, get_sorted_pages,
    has_dense_positions, layout, pages_from_json, pages_to_json, renumber_from, reorder,
    set_page_number, total_printed_pages, update_description, IdGenerator, LayoutEntry,
    PacketManager, PacketRoot, Page, SequentialIds, UuidIds,
};

#[cfg(feature = "wasm")]
pub use packet::JsPacketManager;
