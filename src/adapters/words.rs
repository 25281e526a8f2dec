use serde::Deserialize;

use super::{ExtractOptions, Extraction};
use crate::error::SampleError;
use crate::model::{ArtifactFormat, BoundingBox, ConfidenceStats, Direction, TextFragment};
use crate::reading_order::reorder;

#[derive(Debug, Deserialize)]
struct WordsPayload {
    #[serde(default)]
    words: Vec<WordRecord>,
}

#[derive(Debug, Deserialize)]
struct WordRecord {
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "box")]
    bbox: Option<Vec<f64>>,
    #[serde(default)]
    points: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    det_score: Option<f64>,
    #[serde(default)]
    rec_score: Option<f64>,
}

impl WordRecord {
    fn into_fragment(self) -> TextFragment {
        let bbox = self
            .bbox
            .as_deref()
            .and_then(BoundingBox::from_xywh)
            .or_else(|| self.points.as_deref().and_then(BoundingBox::from_points));

        TextFragment {
            content: self.content.unwrap_or_default(),
            bbox,
            direction: Direction::from_label(self.direction.as_deref()),
            order: None,
            detection_confidence: self.det_score,
            recognition_confidence: self.rec_score,
        }
    }
}

pub(super) fn extract(payload: &str, options: &ExtractOptions) -> Result<Extraction, SampleError> {
    let parsed: WordsPayload = serde_json::from_str(payload)
        .map_err(|err| SampleError::parse_failure(ArtifactFormat::WordJson, err))?;

    let retained = parsed
        .words
        .into_iter()
        .map(WordRecord::into_fragment)
        .filter(|fragment| passes_threshold(fragment, options.min_score))
        .collect::<Vec<TextFragment>>();

    let ordered = reorder(&retained);
    let unplaced = retained.len() - ordered.len();

    let mut warnings = Vec::new();
    if unplaced > 0 {
        warnings.push(SampleError::UnplacedFragments { count: unplaced }.to_string());
    }

    let confidence_stats = confidence_stats(&ordered);
    let text = ordered
        .iter()
        .map(|fragment| fragment.content.as_str())
        .collect::<String>();

    Ok(Extraction {
        text,
        structural_counts: None,
        confidence_stats: Some(confidence_stats),
        warnings,
    })
}

/// A missing score counts as zero, so it only survives a zero threshold.
fn passes_threshold(fragment: &TextFragment, min_score: f64) -> bool {
    fragment.detection_confidence.unwrap_or(0.0) >= min_score
        && fragment.recognition_confidence.unwrap_or(0.0) >= min_score
}

/// Computed over placed fragments only; unplaced ones never reach the text.
fn confidence_stats(fragments: &[TextFragment]) -> ConfidenceStats {
    let mut det = ScoreRange::default();
    let mut rec = ScoreRange::default();
    let mut horizontal_count = 0;
    let mut vertical_count = 0;

    for fragment in fragments {
        match fragment.direction {
            Direction::Horizontal => horizontal_count += 1,
            Direction::Vertical => vertical_count += 1,
        }
        if let Some(score) = fragment.detection_confidence {
            det.push(score);
        }
        if let Some(score) = fragment.recognition_confidence {
            rec.push(score);
        }
    }

    ConfidenceStats {
        fragment_count: fragments.len(),
        avg_det_score: det.mean(),
        min_det_score: det.min,
        max_det_score: det.max,
        avg_rec_score: rec.mean(),
        min_rec_score: rec.min,
        max_rec_score: rec.max,
        horizontal_count,
        vertical_count,
    }
}

#[derive(Debug, Default)]
struct ScoreRange {
    sum: f64,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl ScoreRange {
    fn push(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
        self.min = Some(self.min.map_or(score, |min| min.min(score)));
        self.max = Some(self.max.map_or(score, |max| max.max(score)));
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}
