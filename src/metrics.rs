use std::path::Path;

use strsim::levenshtein;

use crate::model::{EvaluationResult, ExtractedSample, GroundTruthEntry};
use crate::normalize::normalize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextScore {
    pub exact_match: bool,
    pub edit_distance: usize,
    pub cer: f64,
    pub predicted_length: usize,
    pub ground_truth_length: usize,
}

/// Scores `predicted` against `reference` after normalizing both sides.
/// Lengths and distances count Unicode code points.
pub fn score(predicted: &str, reference: &str) -> TextScore {
    let predicted_norm = normalize(predicted);
    let reference_norm = normalize(reference);

    let predicted_length = predicted_norm.chars().count();
    let ground_truth_length = reference_norm.chars().count();
    let edit_distance = levenshtein(&predicted_norm, &reference_norm);

    TextScore {
        exact_match: predicted_norm == reference_norm,
        edit_distance,
        cer: character_error_rate(edit_distance, predicted_length, ground_truth_length),
        predicted_length,
        ground_truth_length,
    }
}

/// Edit distance over reference length. An empty reference scores 0.0 against
/// empty output and 1.0 against anything else. Values above 1.0 are legitimate
/// when the prediction is much longer than the reference.
pub fn character_error_rate(
    edit_distance: usize,
    predicted_length: usize,
    reference_length: usize,
) -> f64 {
    if reference_length == 0 {
        return if predicted_length == 0 { 0.0 } else { 1.0 };
    }

    edit_distance as f64 / reference_length as f64
}

pub fn evaluate_sample(
    extracted: &ExtractedSample,
    entry: &GroundTruthEntry,
    source_path: &Path,
) -> EvaluationResult {
    let score = score(&extracted.text, &entry.reference_text);

    EvaluationResult {
        sample_key: entry.sample_key.clone(),
        source_path: source_path.display().to_string(),
        predicted: extracted.text.clone(),
        ground_truth: entry.reference_text.clone(),
        exact_match: score.exact_match,
        edit_distance: score.edit_distance,
        cer: score.cer,
        predicted_length: score.predicted_length,
        ground_truth_length: score.ground_truth_length,
        structural_counts: extracted.structural_counts,
        confidence_stats: extracted.confidence_stats.clone(),
    }
}
