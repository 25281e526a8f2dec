use super::pipeline::{PipelineOutput, evaluate_artifacts};
use super::*;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let options = ExtractOptions::with_min_score(args.min_score)?;

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let stamp = utc_compact_string(started_ts);
    let run_id = format!("eval-{stamp}");

    if !args.input_dir.is_dir() {
        bail!("input directory does not exist: {}", args.input_dir.display());
    }

    let engine = args
        .engine
        .clone()
        .unwrap_or_else(|| engine_name(&args.input_dir));
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| sibling_with_suffix(&args.input_dir, EVALUATION_DIR_SUFFIX));
    let db_path = (!args.no_store).then(|| {
        args.db_path
            .clone()
            .unwrap_or_else(|| args.cache_root.join(DEFAULT_DB_FILE))
    });

    info!(
        run_id = %run_id,
        engine = %engine,
        format = args.format.as_str(),
        input_dir = %args.input_dir.display(),
        min_score = args.min_score,
        "starting evaluation"
    );

    let index = GroundTruthIndex::load(&args.gt_dataset)?;
    let gt_sha256 = sha256_file(&args.gt_dataset)?;
    info!(
        path = %args.gt_dataset.display(),
        entries = index.len(),
        "loaded ground truth corpus"
    );
    if index.is_empty() {
        warn!(path = %args.gt_dataset.display(), "ground truth corpus has no entries");
    }

    let adapter = Adapter::for_format(args.format);

    let artifacts = discover_artifacts(&args.input_dir, args.format)?;
    info!(count = artifacts.len(), "discovered artifacts");
    if artifacts.is_empty() {
        warn!(
            input_dir = %args.input_dir.display(),
            format = args.format.as_str(),
            "no artifacts with a matching extension"
        );
    }

    let mut output = run_pipeline(args.threads, artifacts, &index, &adapter, &options)?;
    output.warnings.extend(
        index
            .duplicate_keys()
            .iter()
            .map(|key| format!("duplicate ground truth key {key}, last entry wins")),
    );

    ensure_directory(&output_dir)?;
    let results_path = output_dir.join(format!("results_{stamp}.json"));
    let summary_path = output_dir.join(format!("summary_{stamp}.json"));
    let manifest_path = output_dir.join(format!("evaluation_run_{stamp}.json"));

    write_json_pretty(&results_path, &output.results)?;
    write_json_pretty(&summary_path, &output.summary)?;

    if let Some(db_path) = &db_path {
        let mut store = RunStore::open(db_path)?;
        store
            .record_run(
                &RunRecord {
                    run_id: run_id.clone(),
                    engine: engine.clone(),
                    format: args.format.as_str().to_string(),
                    input_dir: args.input_dir.display().to_string(),
                    gt_sha256: gt_sha256.clone(),
                    min_score: args.min_score,
                    started_at: started_at.clone(),
                    finished_at: now_utc_string(),
                    summary: output.summary.clone(),
                },
                &output.results,
            )
            .with_context(|| format!("failed to record run in {}", db_path.display()))?;
        info!(path = %db_path.display(), run_id = %run_id, "recorded run");
    }

    let manifest = EvaluationRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        engine: engine.clone(),
        format: args.format,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        min_score: args.min_score,
        gt_sha256,
        paths: EvaluationPaths {
            input_dir: args.input_dir.display().to_string(),
            gt_dataset_path: args.gt_dataset.display().to_string(),
            output_dir: output_dir.display().to_string(),
            results_path: results_path.display().to_string(),
            summary_path: summary_path.display().to_string(),
            db_path: db_path.as_ref().map(|path| path.display().to_string()),
        },
        counts: output.counts.clone(),
        summary: output.summary.clone(),
        warnings: output.warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    log_summary(&engine, &output.summary);
    info!(
        results = %results_path.display(),
        summary = %summary_path.display(),
        manifest = %manifest_path.display(),
        "evaluation complete"
    );

    Ok(())
}

fn engine_name(input_dir: &Path) -> String {
    input_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn run_pipeline(
    threads: Option<usize>,
    artifacts: Vec<Artifact>,
    index: &GroundTruthIndex,
    adapter: &Adapter,
    options: &ExtractOptions,
) -> Result<PipelineOutput> {
    let Some(threads) = threads else {
        return Ok(evaluate_artifacts(artifacts, index, adapter, options));
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .with_context(|| format!("failed to build worker pool with {threads} threads"))?;
    Ok(pool.install(|| evaluate_artifacts(artifacts, index, adapter, options)))
}

fn log_summary(engine: &str, summary: &SummaryStatistics) {
    info!(
        engine = %engine,
        total_samples = summary.total_samples,
        exact_matches = summary.exact_matches,
        accuracy_pct = %format!("{:.2}", summary.accuracy * 100.0),
        avg_cer_pct = %format!("{:.2}", summary.avg_cer * 100.0),
        avg_edit_distance = %format!("{:.2}", summary.avg_edit_distance),
        "evaluation summary"
    );

    if let (Some(paragraphs), Some(tables), Some(figures)) = (
        summary.avg_paragraph_count,
        summary.avg_table_count,
        summary.avg_figure_count,
    ) {
        info!(
            avg_paragraphs = %format!("{paragraphs:.2}"),
            avg_tables = %format!("{tables:.2}"),
            avg_figures = %format!("{figures:.2}"),
            "layout structure"
        );
    }

    if summary.avg_det_score.is_some() || summary.avg_rec_score.is_some() {
        info!(
            avg_det_score = %format!("{:.4}", summary.avg_det_score.unwrap_or_default()),
            avg_rec_score = %format!("{:.4}", summary.avg_rec_score.unwrap_or_default()),
            "word confidence"
        );
    }
}
