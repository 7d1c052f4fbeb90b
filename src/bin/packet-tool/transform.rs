//! Normalization from loosely typed input pages to library `Page`s.
//!
//! Key transformations:
//! - Missing or duplicate ids → fresh ids
//! - Missing positions → appended after the known ones, in input order
//! - Gapped or colliding positions → compacted to 1..N
//! - Missing or non-positive page numbers → previous page number + 1 (or 1)

use std::collections::HashSet;

use packet_sequencer::{compact_positions, get_sorted_pages, IdGenerator, Page};
use tracing::debug;

use crate::input::InputPage;

/// What had to be repaired while normalizing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub generated_ids: usize,
    pub filled_positions: usize,
    pub filled_page_numbers: usize,
    pub compacted: bool,
}

impl TransformReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Turns input pages into a consistent page list.
pub fn normalize_pages<G>(input: Vec<InputPage>, ids: &mut G) -> (Vec<Page>, TransformReport)
where
    G: IdGenerator + ?Sized,
{
    let mut report = TransformReport::default();
    let mut seen = HashSet::new();

    let mut next_position = input
        .iter()
        .filter_map(|p| p.position)
        .max()
        .unwrap_or(0)
        + 1;

    // Page number 0 marks "missing" until the pages are in order.
    let mut pages: Vec<Page> = input
        .into_iter()
        .map(|p| {
            let id = match p.id {
                Some(id) if !id.is_empty() && !seen.contains(&id) => id,
                _ => {
                    report.generated_ids += 1;
                    ids.next_id()
                }
            };
            seen.insert(id.clone());

            let position = p.position.unwrap_or_else(|| {
                report.filled_positions += 1;
                next_position += 1;
                next_position - 1
            });

            Page {
                id,
                position,
                description: p.description.unwrap_or_default(),
                page_number: p.page_number.filter(|n| *n >= 1).unwrap_or(0),
                hint: p.hint,
            }
        })
        .collect();

    let sorted = get_sorted_pages(&pages);
    let dense = sorted
        .iter()
        .enumerate()
        .all(|(i, p)| p.position == i as i64 + 1);
    if !dense {
        report.compacted = true;
        pages = compact_positions(&pages);
    } else {
        pages = sorted;
    }

    let mut previous = 0;
    for page in pages.iter_mut() {
        if page.page_number == 0 {
            report.filled_page_numbers += 1;
            page.page_number = previous + 1;
        }
        previous = page.page_number;
    }

    if !report.is_clean() {
        debug!(?report, "repaired input pages");
    }
    (pages, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packet_sequencer::{has_dense_positions, SequentialIds};

    fn input(id: Option<&str>, position: Option<i64>, page_number: Option<i64>) -> InputPage {
        InputPage {
            id: id.map(str::to_string),
            position,
            page_number,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_input_passes_through() {
        let (pages, report) = normalize_pages(
            vec![input(Some("b"), Some(2), Some(3)), input(Some("a"), Some(1), Some(1))],
            &mut SequentialIds::new("gen"),
        );

        assert!(report.is_clean());
        assert_eq!(pages[0].id, "a");
        assert_eq!(pages[1].page_number, 3);
    }

    #[test]
    fn test_repairs_ids_positions_and_numbers() {
        let (pages, report) = normalize_pages(
            vec![
                input(Some("a"), Some(3), Some(1)),
                input(None, None, None),
                input(Some("a"), Some(7), Some(4)),
            ],
            &mut SequentialIds::new("gen"),
        );

        assert_eq!(report.generated_ids, 2);
        assert_eq!(report.filled_positions, 1);
        assert_eq!(report.filled_page_numbers, 1);
        assert!(report.compacted);
        assert!(has_dense_positions(&pages));

        let ids: Vec<&str> = pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "gen-2", "gen-1"]);
        let numbers: Vec<i64> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 4, 5]);
    }

    #[test]
    fn test_non_positive_page_number_is_refilled() {
        let (pages, report) = normalize_pages(
            vec![input(Some("a"), Some(1), Some(0)), input(Some("b"), Some(2), Some(-3))],
            &mut SequentialIds::new("gen"),
        );

        assert_eq!(report.filled_page_numbers, 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].page_number, 2);
    }
}
