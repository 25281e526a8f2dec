use serde::Deserialize;
use serde::de::IgnoredAny;

use super::Extraction;
use crate::error::SampleError;
use crate::model::{ArtifactFormat, BoundingBox, Direction, StructuralCounts, TextFragment};

#[derive(Debug, Deserialize)]
struct LayoutPayload {
    #[serde(default)]
    paragraphs: Vec<ParagraphRecord>,
    #[serde(default)]
    tables: Vec<IgnoredAny>,
    #[serde(default)]
    figures: Vec<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct ParagraphRecord {
    #[serde(default)]
    contents: Option<String>,
    #[serde(default, rename = "box")]
    bbox: Option<Vec<f64>>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    order: Option<i64>,
}

impl ParagraphRecord {
    fn into_fragment(self) -> TextFragment {
        let fragment = TextFragment::new(
            self.contents.unwrap_or_default(),
            self.bbox.as_deref().and_then(BoundingBox::from_xywh),
            Direction::from_label(self.direction.as_deref()),
        );
        TextFragment {
            order: self.order,
            ..fragment
        }
    }
}

pub(super) fn extract(payload: &str) -> Result<Extraction, SampleError> {
    let parsed: LayoutPayload = serde_json::from_str(payload)
        .map_err(|err| SampleError::parse_failure(ArtifactFormat::ParagraphJson, err))?;

    let structural_counts = StructuralCounts {
        paragraphs: parsed.paragraphs.len(),
        tables: parsed.tables.len(),
        figures: parsed.figures.len(),
    };

    let mut fragments = parsed
        .paragraphs
        .into_iter()
        .map(ParagraphRecord::into_fragment)
        .collect::<Vec<TextFragment>>();
    // Stable: equal ranks keep engine order.
    fragments.sort_by_key(|fragment| fragment.order.unwrap_or(0));

    let text = fragments
        .iter()
        .map(|fragment| fragment.content.as_str())
        .collect::<String>();

    Ok(Extraction {
        text,
        structural_counts: Some(structural_counts),
        confidence_stats: None,
        warnings: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_order_and_counts_structure() {
        let payload = r#"
        {
          "paragraphs": [
            {"contents": "三", "box": [0, 40, 10, 5], "direction": "horizontal", "order": 3, "role": null},
            {"contents": "一", "box": [0, 0, 10, 5], "direction": "horizontal", "order": 1, "role": "section_headings"},
            {"contents": "二", "box": [0, 20, 10, 5], "direction": "vertical", "order": 2}
          ],
          "tables": [{"box": [0, 60, 100, 40], "cells": []}],
          "figures": [{"box": [0, 120, 50, 50]}, {"box": [60, 120, 50, 50]}]
        }
        "#;

        let extraction = extract(payload).expect("payload parses");
        assert_eq!(extraction.text, "一二三");
        assert_eq!(
            extraction.structural_counts,
            Some(StructuralCounts {
                paragraphs: 3,
                tables: 1,
                figures: 2,
            })
        );
    }

    #[test]
    fn missing_or_null_order_ranks_as_zero_and_ties_keep_input_order() {
        let payload = r#"
        {
          "paragraphs": [
            {"contents": "B", "order": 1},
            {"contents": "x", "order": null},
            {"contents": "y"},
            {"contents": "z", "order": 0},
            {"contents": "A", "order": -1}
          ]
        }
        "#;

        let extraction = extract(payload).expect("payload parses");
        assert_eq!(extraction.text, "AxyzB");
    }

    #[test]
    fn empty_layout_has_zero_counts() {
        let extraction = extract("{}").expect("payload parses");
        assert_eq!(extraction.text, "");
        assert_eq!(extraction.structural_counts, Some(StructuralCounts::default()));
    }
}
