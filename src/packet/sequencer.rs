//! Page sequencing: positions, printed page numbers and spans.
//!
//! Every function here takes the full collection by reference and returns a
//! new value. Nothing is stored between calls and nothing fails: an intent
//! that names an unknown page id is ignored and the input comes back as-is,
//! because drag and edit events from the UI can arrive after the page they
//! refer to has already been deleted.
//!
//! `position` is the ordering key regardless of storage order. A page's span
//! (how many printed pages it occupies) is never stored; it is derived from
//! the gap to the next page's `page_number`.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, trace};

use super::ids::IdGenerator;
use super::model::{LayoutEntry, Page};

// =============================================================================
// ORDERING
// =============================================================================

/// Returns the pages in ascending `position` order.
///
/// The sort is stable, so pages sharing a position keep their storage order.
pub fn get_sorted_pages(pages: &[Page]) -> Vec<Page> {
    let mut sorted = pages.to_vec();
    sorted.sort_by_key(|p| p.position);
    sorted
}

fn sorted_refs(pages: &[Page]) -> Vec<&Page> {
    let mut sorted: Vec<&Page> = pages.iter().collect();
    sorted.sort_by_key(|p| p.position);
    sorted
}

/// Returns true when the positions are exactly `1..=N`.
pub fn has_dense_positions(pages: &[Page]) -> bool {
    let mut positions: Vec<i64> = pages.iter().map(|p| p.position).collect();
    positions.sort_unstable();
    positions
        .iter()
        .enumerate()
        .all(|(i, &pos)| pos == i as i64 + 1)
}

/// Renumbers positions to `1..=N`, keeping relative order.
///
/// Ties (e.g. two replicas appending concurrently) are broken by id so every
/// replica compacts to the same order. Page numbers are left alone.
pub fn compact_positions(pages: &[Page]) -> Vec<Page> {
    let mut sorted = pages.to_vec();
    sorted.sort_by(|a, b| match a.position.cmp(&b.position) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
    for (index, page) in sorted.iter_mut().enumerate() {
        page.position = index as i64 + 1;
    }
    trace!(pages = sorted.len(), "compacted positions");
    sorted
}

// =============================================================================
// SPANS
// =============================================================================

/// Computes each page's span, keyed by page id.
///
/// A page spans up to the next page's number. The last page has nothing after
/// it, so it reuses the gap from its predecessor; a lone page spans 1. Spans
/// are never below 1. Page-number arithmetic saturates at the `i64` bounds.
pub fn compute_spans(pages: &[Page]) -> HashMap<String, i64> {
    let sorted = sorted_refs(pages);
    let mut spans = HashMap::with_capacity(sorted.len());

    for (i, page) in sorted.iter().enumerate() {
        let span = if let Some(next) = sorted.get(i + 1) {
            next.page_number.saturating_sub(page.page_number)
        } else if i > 0 {
            page.page_number.saturating_sub(sorted[i - 1].page_number)
        } else {
            1
        };
        spans.insert(page.id.clone(), span.max(1));
    }

    spans
}

// =============================================================================
// INTENTS
// =============================================================================

/// Builds the page that "add page" would append. The input is not modified.
///
/// The new page goes after the current last page and starts right after that
/// page's span. An empty packet starts at position 1, page 1.
pub fn create_page<G>(pages: &[Page], ids: &mut G) -> Page
where
    G: IdGenerator + ?Sized,
{
    let id = ids.next_id();

    let Some(last) = sorted_refs(pages).last().copied() else {
        return Page::new(id, 1, 1);
    };

    let last_span = compute_spans(pages).get(&last.id).copied().unwrap_or(1);
    let page = Page::new(
        id,
        last.position.saturating_add(1),
        last.page_number.saturating_add(last_span),
    );
    trace!(id = %page.id, position = page.position, page_number = page.page_number, "created page");
    page
}

/// Shifts every page after an edited page by the same delta as the edit.
///
/// `updated` is the edited page with its new `page_number` already applied and
/// replaces the stored copy. Pages positioned after it move by
/// `updated.page_number - old_page_number`; pages at or before it are kept.
pub fn renumber_from(pages: &[Page], updated: &Page, old_page_number: i64) -> Vec<Page> {
    let Some(edited) = pages.iter().find(|p| p.id == updated.id) else {
        debug!(id = %updated.id, "renumber ignored: page not found");
        return pages.to_vec();
    };

    let edited_position = edited.position;
    let delta = updated.page_number.saturating_sub(old_page_number);

    pages
        .iter()
        .map(|page| {
            if page.id == updated.id {
                updated.clone()
            } else if page.position > edited_position {
                Page {
                    page_number: page.page_number.saturating_add(delta),
                    ..page.clone()
                }
            } else {
                page.clone()
            }
        })
        .collect()
}

/// Moves `dragged_id` to the slot held by `target_id`, then renumbers.
///
/// Positions come out dense (`1..=N`). Page numbers restart at 1 and advance
/// by each page's span as it was *before* the move, so every exhibit keeps its
/// printed length. Unknown ids leave the collection unchanged.
pub fn reorder(pages: &[Page], dragged_id: &str, target_id: &str) -> Vec<Page> {
    let original_spans = compute_spans(pages);
    let mut sorted = get_sorted_pages(pages);

    let from = sorted.iter().position(|p| p.id == dragged_id);
    let to = sorted.iter().position(|p| p.id == target_id);
    let (Some(from), Some(to)) = (from, to) else {
        debug!(dragged_id, target_id, "reorder ignored: page not found");
        return pages.to_vec();
    };

    let moved = sorted.remove(from);
    sorted.insert(to, moved);

    let mut running = 1;
    for (index, page) in sorted.iter_mut().enumerate() {
        page.position = index as i64 + 1;
        page.page_number = running;
        running = running.saturating_add(original_spans.get(&page.id).copied().unwrap_or(1));
    }

    trace!(dragged_id, target_id, from, to, "reordered pages");
    sorted
}

/// Removes a page and closes the gap it leaves in the positions.
///
/// Page numbers of the remaining pages are not touched.
pub fn delete_page(pages: &[Page], id: &str) -> Vec<Page> {
    if !pages.iter().any(|p| p.id == id) {
        debug!(id, "delete ignored: page not found");
        return pages.to_vec();
    }

    let remaining: Vec<Page> = pages.iter().filter(|p| p.id != id).cloned().collect();
    compact_positions(&remaining)
}

/// Sets one page's description.
pub fn update_description(pages: &[Page], id: &str, description: &str) -> Vec<Page> {
    if !pages.iter().any(|p| p.id == id) {
        debug!(id, "description update ignored: page not found");
        return pages.to_vec();
    }

    pages
        .iter()
        .map(|page| {
            if page.id == id {
                Page {
                    description: description.to_string(),
                    ..page.clone()
                }
            } else {
                page.clone()
            }
        })
        .collect()
}

/// Applies a user edit of one page's number and shifts the pages after it.
pub fn set_page_number(pages: &[Page], id: &str, new_page_number: i64) -> Vec<Page> {
    let Some(page) = pages.iter().find(|p| p.id == id) else {
        debug!(id, "page number edit ignored: page not found");
        return pages.to_vec();
    };

    let old_page_number = page.page_number;
    let updated = Page {
        page_number: new_page_number,
        ..page.clone()
    };
    renumber_from(pages, &updated, old_page_number)
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Produces the ordered exhibit list consumed by the PDF renderer.
pub fn layout(pages: &[Page]) -> Vec<LayoutEntry> {
    let spans = compute_spans(pages);

    sorted_refs(pages)
        .into_iter()
        .map(|page| {
            let span = spans.get(&page.id).copied().unwrap_or(1);
            LayoutEntry {
                id: page.id.clone(),
                position: page.position,
                description: page.description.clone(),
                page_number: page.page_number,
                span,
                last_page: page.page_number.saturating_add(span - 1),
                hint: page.hint.clone(),
            }
        })
        .collect()
}

/// Number of printed pages in the assembled packet, 0 when empty.
pub fn total_printed_pages(pages: &[Page]) -> i64 {
    layout(pages).last().map_or(0, |entry| entry.last_page)
}

// =============================================================================
// TESTS
// =============================================================================
