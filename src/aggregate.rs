use crate::model::{EvaluationResult, SummaryStatistics};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn push_opt(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.push(value);
        }
    }

    fn merge(&mut self, other: RunningMean) {
        self.sum += other.sum;
        self.count += other.count;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Per-field sums and counts. `merge` combines partial accumulators; counts
/// merge exactly, float sums only up to rounding, so reported summaries come
/// from a single in-order fold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryAccumulator {
    total_samples: usize,
    exact_matches: usize,
    cer: RunningMean,
    edit_distance: RunningMean,
    paragraphs: RunningMean,
    tables: RunningMean,
    figures: RunningMean,
    det_score: RunningMean,
    rec_score: RunningMean,
}

impl SummaryAccumulator {
    pub fn push(&mut self, result: &EvaluationResult) {
        self.total_samples += 1;
        if result.exact_match {
            self.exact_matches += 1;
        }
        self.cer.push(result.cer);
        self.edit_distance.push(result.edit_distance as f64);

        if let Some(counts) = result.structural_counts {
            self.paragraphs.push(counts.paragraphs as f64);
            self.tables.push(counts.tables as f64);
            self.figures.push(counts.figures as f64);
        }

        if let Some(stats) = &result.confidence_stats {
            self.det_score.push_opt(stats.avg_det_score);
            self.rec_score.push_opt(stats.avg_rec_score);
        }
    }

    pub fn merge(mut self, other: SummaryAccumulator) -> SummaryAccumulator {
        self.total_samples += other.total_samples;
        self.exact_matches += other.exact_matches;
        self.cer.merge(other.cer);
        self.edit_distance.merge(other.edit_distance);
        self.paragraphs.merge(other.paragraphs);
        self.tables.merge(other.tables);
        self.figures.merge(other.figures);
        self.det_score.merge(other.det_score);
        self.rec_score.merge(other.rec_score);
        self
    }

    pub fn finish(&self) -> SummaryStatistics {
        let accuracy = if self.total_samples == 0 {
            0.0
        } else {
            self.exact_matches as f64 / self.total_samples as f64
        };

        SummaryStatistics {
            total_samples: self.total_samples,
            exact_matches: self.exact_matches,
            accuracy,
            avg_cer: self.cer.mean().unwrap_or(0.0),
            avg_edit_distance: self.edit_distance.mean().unwrap_or(0.0),
            avg_paragraph_count: self.paragraphs.mean(),
            avg_table_count: self.tables.mean(),
            avg_figure_count: self.figures.mean(),
            avg_det_score: self.det_score.mean(),
            avg_rec_score: self.rec_score.mean(),
        }
    }
}

impl<'a> Extend<&'a EvaluationResult> for SummaryAccumulator {
    fn extend<I: IntoIterator<Item = &'a EvaluationResult>>(&mut self, iter: I) {
        for result in iter {
            self.push(result);
        }
    }
}

/// Folds results in slice order. Callers sort first so that the same result
/// set always sums to the same bits, whatever the worker count.
pub fn aggregate(results: &[EvaluationResult]) -> SummaryStatistics {
    let mut accumulator = SummaryAccumulator::default();
    accumulator.extend(results);
    accumulator.finish()
}
