//! Reading-order reconstruction for word-level engine output.
//!
//! Horizontal fragments read top-to-bottom then left-to-right; vertical
//! fragments read in right-to-left columns, top-to-bottom inside a column.
//! The two groups are concatenated horizontal first. Mixed-direction pages that
//! interleave columns and rows are not modelled.

use std::cmp::Ordering;

use crate::model::{BoundingBox, Direction, TextFragment};

#[derive(Debug, Clone, Copy)]
pub struct PlacedFragment<'a> {
    pub fragment: &'a TextFragment,
    pub bbox: BoundingBox,
}

#[derive(Debug, Default)]
pub struct DirectionGroups<'a> {
    pub horizontal: Vec<PlacedFragment<'a>>,
    pub vertical: Vec<PlacedFragment<'a>>,
    /// Fragments without geometry; they cannot be placed on the page.
    pub unplaced: Vec<&'a TextFragment>,
}

impl<'a> DirectionGroups<'a> {
    /// Sorts both groups in place (stable) and returns them merged.
    pub fn into_reading_order(mut self) -> Vec<&'a TextFragment> {
        self.horizontal.sort_by(|a, b| {
            a.bbox
                .top()
                .total_cmp(&b.bbox.top())
                .then_with(|| a.bbox.left().total_cmp(&b.bbox.left()))
        });
        self.vertical.sort_by(|a, b| compare_vertical(&a.bbox, &b.bbox));

        self.horizontal
            .into_iter()
            .chain(self.vertical)
            .map(|placed| placed.fragment)
            .collect()
    }
}

fn compare_vertical(a: &BoundingBox, b: &BoundingBox) -> Ordering {
    (-a.right())
        .total_cmp(&-b.right())
        .then_with(|| a.top().total_cmp(&b.top()))
}

pub fn group_by_direction(fragments: &[TextFragment]) -> DirectionGroups<'_> {
    let mut groups = DirectionGroups::default();

    for fragment in fragments {
        let Some(bbox) = fragment.bbox else {
            groups.unplaced.push(fragment);
            continue;
        };

        let placed = PlacedFragment { fragment, bbox };
        match fragment.direction {
            Direction::Horizontal => groups.horizontal.push(placed),
            Direction::Vertical => groups.vertical.push(placed),
        }
    }

    groups
}

/// Returns the placeable fragments in reading order. Fragments without a box
/// are dropped.
pub fn reorder(fragments: &[TextFragment]) -> Vec<TextFragment> {
    group_by_direction(fragments)
        .into_reading_order()
        .into_iter()
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(content: &str, bbox: (f64, f64, f64, f64), direction: Direction) -> TextFragment {
        TextFragment::new(
            content,
            Some(BoundingBox::new(bbox.0, bbox.1, bbox.2, bbox.3)),
            direction,
        )
    }

    fn contents(fragments: &[TextFragment]) -> Vec<&str> {
        fragments
            .iter()
            .map(|fragment| fragment.content.as_str())
            .collect()
    }

    #[test]
    fn horizontal_fragments_precede_vertical_ones() {
        let fragments = vec![
            fragment("vertical", (50.0, 0.0, 5.0, 30.0), Direction::Vertical),
            fragment("second", (0.0, 20.0, 10.0, 5.0), Direction::Horizontal),
            fragment("first", (0.0, 0.0, 10.0, 5.0), Direction::Horizontal),
        ];

        let ordered = reorder(&fragments);
        assert_eq!(contents(&ordered), vec!["first", "second", "vertical"]);
    }

    #[test]
    fn horizontal_rows_read_left_to_right() {
        let fragments = vec![
            fragment("right", (40.0, 10.0, 10.0, 5.0), Direction::Horizontal),
            fragment("left", (0.0, 10.0, 10.0, 5.0), Direction::Horizontal),
            fragment("top", (20.0, 0.0, 10.0, 5.0), Direction::Horizontal),
        ];

        let ordered = reorder(&fragments);
        assert_eq!(contents(&ordered), vec!["top", "left", "right"]);
    }

    #[test]
    fn vertical_columns_read_right_to_left_then_top_to_bottom() {
        let fragments = vec![
            fragment("left-column", (10.0, 0.0, 5.0, 30.0), Direction::Vertical),
            fragment("right-lower", (40.0, 40.0, 5.0, 30.0), Direction::Vertical),
            fragment("right-upper", (40.0, 0.0, 5.0, 30.0), Direction::Vertical),
        ];

        let ordered = reorder(&fragments);
        assert_eq!(
            contents(&ordered),
            vec!["right-upper", "right-lower", "left-column"]
        );
    }

    #[test]
    fn identical_keys_keep_input_order_and_runs_are_deterministic() {
        let fragments = vec![
            fragment("a", (0.0, 0.0, 10.0, 5.0), Direction::Horizontal),
            fragment("b", (0.0, 0.0, 10.0, 5.0), Direction::Horizontal),
            fragment("c", (0.0, 0.0, 10.0, 5.0), Direction::Horizontal),
            fragment("x", (5.0, 0.0, 5.0, 5.0), Direction::Vertical),
            fragment("y", (5.0, 0.0, 5.0, 5.0), Direction::Vertical),
        ];

        let first = reorder(&fragments);
        let second = reorder(&fragments);
        assert_eq!(contents(&first), vec!["a", "b", "c", "x", "y"]);
        assert_eq!(first, second);
    }

    #[test]
    fn fragments_without_geometry_are_not_placed() {
        let fragments = vec![
            TextFragment::new("floating", None, Direction::Horizontal),
            fragment("anchored", (0.0, 0.0, 10.0, 5.0), Direction::Horizontal),
        ];

        let groups = group_by_direction(&fragments);
        assert_eq!(groups.horizontal.len() + groups.vertical.len(), 1);
        assert_eq!(groups.unplaced.len(), 1);
        assert_eq!(contents(&reorder(&fragments)), vec!["anchored"]);
    }
}
