use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactFormat {
    Markup,
    PlainText,
    WordJson,
    ParagraphJson,
}

impl ArtifactFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::PlainText => "plain-text",
            Self::WordJson => "word-json",
            Self::ParagraphJson => "paragraph-json",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Markup => &["html", "htm", "xhtml"],
            Self::PlainText => &["md", "txt"],
            Self::WordJson | Self::ParagraphJson => &["json"],
        }
    }
}

/// One engine's output for one document image, as read from disk.
#[derive(Debug, Clone)]
pub struct RawSample {
    pub sample_key: String,
    pub format: ArtifactFormat,
    /// `None` when the artifact was empty.
    pub payload: Option<String>,
    pub source_path: PathBuf,
}

/// Polygons with fewer corners than a quadrilateral are treated as unplaced.
pub const MIN_POLYGON_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from an `[x, y, w, h]` array; anything shorter is rejected.
    pub fn from_xywh(values: &[f64]) -> Option<Self> {
        match values {
            [x, y, width, height, ..] => Some(Self::new(*x, *y, *width, *height)),
            _ => None,
        }
    }

    /// Axis-aligned bounds of a quadrilateral or wider polygon given as `[x, y]`
    /// points. Fewer than four usable points cannot place a fragment.
    pub fn from_points(points: &[Vec<f64>]) -> Option<Self> {
        let coords = points
            .iter()
            .filter_map(|point| match point.as_slice() {
                [x, y, ..] => Some((*x, *y)),
                _ => None,
            })
            .collect::<Vec<(f64, f64)>>();
        if coords.len() < MIN_POLYGON_POINTS {
            return None;
        }

        let (first_x, first_y) = coords[0];
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first_x, first_y, first_x, first_y);
        for &(x, y) in &coords[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

impl Direction {
    /// Engines spell this field loosely; anything but "vertical" reads horizontally.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|value| value.trim().to_ascii_lowercase()) {
            Some(value) if value == "vertical" => Self::Vertical,
            _ => Self::Horizontal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub content: String,
    pub bbox: Option<BoundingBox>,
    pub direction: Direction,
    pub order: Option<i64>,
    pub detection_confidence: Option<f64>,
    pub recognition_confidence: Option<f64>,
}

impl TextFragment {
    pub fn new(content: impl Into<String>, bbox: Option<BoundingBox>, direction: Direction) -> Self {
        Self {
            content: content.into(),
            bbox,
            direction,
            order: None,
            detection_confidence: None,
            recognition_confidence: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralCounts {
    pub paragraphs: usize,
    pub tables: usize,
    pub figures: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub fragment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_det_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_det_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_det_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rec_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rec_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rec_score: Option<f64>,
    pub horizontal_count: usize,
    pub vertical_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSample {
    pub sample_key: String,
    pub text: String,
    pub structural_counts: Option<StructuralCounts>,
    pub confidence_stats: Option<ConfidenceStats>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundTruthRecord {
    #[serde(default)]
    pub path: String,
    #[serde(default, alias = "text")]
    pub gt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruthEntry {
    pub sample_key: String,
    pub reference_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub sample_key: String,
    pub source_path: String,
    pub predicted: String,
    pub ground_truth: String,
    pub exact_match: bool,
    pub edit_distance: usize,
    pub cer: f64,
    pub predicted_length: usize,
    pub ground_truth_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_counts: Option<StructuralCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_stats: Option<ConfidenceStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_samples: usize,
    pub exact_matches: usize,
    pub accuracy: f64,
    pub avg_cer: f64,
    pub avg_edit_distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_paragraph_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_table_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_figure_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_det_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rec_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationPaths {
    pub input_dir: String,
    pub gt_dataset_path: String,
    pub output_dir: String,
    pub results_path: String,
    pub summary_path: String,
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationCounts {
    pub ground_truth_entries: usize,
    pub discovered_artifacts: usize,
    pub duplicate_page_artifacts: usize,
    pub unmatched_samples: usize,
    pub missing_artifacts: usize,
    pub samples_with_warnings: usize,
    pub scored_samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub engine: String,
    pub format: ArtifactFormat,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub min_score: f64,
    pub gt_sha256: String,
    pub paths: EvaluationPaths,
    pub counts: EvaluationCounts,
    pub summary: SummaryStatistics,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedTextRow {
    pub sample_key: String,
    pub texts: BTreeMap<String, String>,
}
