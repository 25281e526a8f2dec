use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{DEFAULT_DB_FILE, RunStore};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join(DEFAULT_DB_FILE));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "results database missing");
        return Ok(());
    }

    let store = RunStore::open(&db_path)?;
    let runs = store.recent_runs(args.limit)?;

    info!(
        path = %db_path.display(),
        schema_version = %store.schema_version()?.unwrap_or_default(),
        runs = runs.len(),
        "database status"
    );

    for run in runs {
        info!(
            run_id = %run.run_id,
            engine = %run.engine,
            format = %run.format,
            finished_at = %run.finished_at,
            total_samples = run.total_samples,
            exact_matches = run.exact_matches,
            accuracy_pct = %format!("{:.2}", run.accuracy * 100.0),
            avg_cer_pct = %format!("{:.2}", run.avg_cer * 100.0),
            avg_edit_distance = %format!("{:.2}", run.avg_edit_distance),
            sample_rows = run.sample_rows,
            "recorded run"
        );
    }

    Ok(())
}
