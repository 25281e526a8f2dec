use super::*;

/// What happened to one selected artifact.
#[derive(Debug)]
pub(super) enum SampleOutcome {
    Scored {
        result: EvaluationResult,
        warnings: Vec<String>,
    },
    Missing {
        sample_key: String,
        error: SampleError,
    },
}

#[derive(Debug, Default)]
pub(super) struct PipelineOutput {
    pub(super) results: Vec<EvaluationResult>,
    pub(super) summary: SummaryStatistics,
    pub(super) counts: EvaluationCounts,
    pub(super) warnings: Vec<String>,
}

/// Joins artifacts to the corpus, scores every matched sample in parallel and
/// folds the results into summary statistics.
pub(super) fn evaluate_artifacts(
    artifacts: Vec<Artifact>,
    index: &GroundTruthIndex,
    adapter: &Adapter,
    options: &ExtractOptions,
) -> PipelineOutput {
    let mut output = PipelineOutput::default();
    output.counts.ground_truth_entries = index.len();
    output.counts.discovered_artifacts = artifacts.len();

    let selection = select_one_per_key(artifacts, |sample_key| {
        index
            .lookup(sample_key)
            .map(|entry| (entry.sample_key.clone(), entry))
    });

    for artifact in &selection.unresolved {
        let err = SampleError::UnmatchedGroundTruth {
            key: artifact.sample_key.key.clone(),
        };
        warn!(path = %artifact.path.display(), "{err}");
        output
            .warnings
            .push(format!("{}: {err}", artifact.path.display()));
    }
    output.counts.unmatched_samples = selection.unresolved.len();

    for artifact in &selection.duplicates {
        info!(
            path = %artifact.path.display(),
            page = artifact.sample_key.page_rank(),
            "skipping additional page for already selected sample"
        );
    }
    output.counts.duplicate_page_artifacts = selection.duplicates.len();

    let outcomes = selection
        .selected
        .par_iter()
        .map(|(sample_key, artifact, entry)| {
            process_sample(sample_key, artifact, entry, adapter, options)
        })
        .collect::<Vec<SampleOutcome>>();

    for outcome in outcomes {
        match outcome {
            SampleOutcome::Scored { result, warnings } => {
                if !warnings.is_empty() {
                    output.counts.samples_with_warnings += 1;
                }
                for warning in warnings {
                    warn!(sample_key = %result.sample_key, "{warning}");
                    output
                        .warnings
                        .push(format!("{}: {warning}", result.sample_key));
                }
                output.results.push(result);
            }
            SampleOutcome::Missing { sample_key, error } => {
                warn!(sample_key = %sample_key, error = %error, "skipping sample");
                output.warnings.push(format!("{sample_key}: {error}"));
                output.counts.missing_artifacts += 1;
            }
        }
    }

    output
        .results
        .sort_by(|left, right| left.sample_key.cmp(&right.sample_key));
    output.counts.scored_samples = output.results.len();

    // Folded after sorting so float sums do not depend on worker scheduling.
    output.summary = aggregate(&output.results);

    output
}

fn process_sample(
    sample_key: &str,
    artifact: &Artifact,
    entry: &GroundTruthEntry,
    adapter: &Adapter,
    options: &ExtractOptions,
) -> SampleOutcome {
    let raw = match read_raw_sample(artifact, sample_key, adapter.format()) {
        Ok(raw) => raw,
        Err(error) => {
            return SampleOutcome::Missing {
                sample_key: sample_key.to_string(),
                error,
            };
        }
    };

    let extracted = adapter.extract(&raw, options);
    let result = evaluate_sample(&extracted, entry, &raw.source_path);

    SampleOutcome::Scored {
        result,
        warnings: extracted.warnings,
    }
}
