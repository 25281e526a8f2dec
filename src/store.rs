use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{EvaluationResult, SummaryStatistics};
use crate::util::ensure_directory;

pub const DB_SCHEMA_VERSION: &str = "1";
pub const DEFAULT_DB_FILE: &str = "ocr_eval_runs.sqlite";

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_id: String,
    pub engine: String,
    pub format: String,
    pub input_dir: String,
    pub gt_sha256: String,
    pub min_score: f64,
    pub started_at: String,
    pub finished_at: String,
    pub summary: SummaryStatistics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunRow {
    pub run_id: String,
    pub engine: String,
    pub format: String,
    pub finished_at: String,
    pub total_samples: i64,
    pub exact_matches: i64,
    pub accuracy: f64,
    pub avg_cer: f64,
    pub avg_edit_distance: f64,
    pub sample_rows: i64,
}

/// History of evaluation runs, one row per run plus one per scored sample.
pub struct RunStore {
    connection: Connection,
}

impl RunStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_directory(parent)?;
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;

        Ok(Self { connection })
    }

    pub fn record_run(&mut self, run: &RunRecord, results: &[EvaluationResult]) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .context("failed to start run transaction")?;

        tx.execute("DELETE FROM sample_results WHERE run_id = ?1", params![run.run_id])
            .context("failed to clear previous sample rows")?;

        let summary = &run.summary;
        tx.execute(
            "
            INSERT OR REPLACE INTO runs (
              run_id, engine, format, input_dir, gt_sha256, min_score,
              started_at, finished_at, total_samples, exact_matches, accuracy,
              avg_cer, avg_edit_distance, avg_det_score, avg_rec_score,
              avg_paragraph_count, avg_table_count, avg_figure_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ",
            params![
                run.run_id,
                run.engine,
                run.format,
                run.input_dir,
                run.gt_sha256,
                run.min_score,
                run.started_at,
                run.finished_at,
                summary.total_samples as i64,
                summary.exact_matches as i64,
                summary.accuracy,
                summary.avg_cer,
                summary.avg_edit_distance,
                summary.avg_det_score,
                summary.avg_rec_score,
                summary.avg_paragraph_count,
                summary.avg_table_count,
                summary.avg_figure_count,
            ],
        )
        .with_context(|| format!("failed to insert run {}", run.run_id))?;

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO sample_results (
                  run_id, sample_key, source_path, exact_match, edit_distance, cer,
                  predicted_length, ground_truth_length
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )?;
            for result in results {
                statement
                    .execute(params![
                        run.run_id,
                        result.sample_key,
                        result.source_path,
                        result.exact_match,
                        result.edit_distance as i64,
                        result.cer,
                        result.predicted_length as i64,
                        result.ground_truth_length as i64,
                    ])
                    .with_context(|| {
                        format!("failed to insert sample result {}", result.sample_key)
                    })?;
            }
        }

        tx.commit().context("failed to commit run transaction")?;
        Ok(())
    }

    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRow>> {
        let mut statement = self.connection.prepare(
            "
            SELECT
              r.run_id,
              r.engine,
              r.format,
              r.finished_at,
              r.total_samples,
              r.exact_matches,
              r.accuracy,
              r.avg_cer,
              r.avg_edit_distance,
              (SELECT COUNT(*) FROM sample_results s WHERE s.run_id = r.run_id)
            FROM runs r
            ORDER BY r.finished_at DESC, r.run_id DESC
            LIMIT ?1
            ",
        )?;

        let rows = statement
            .query_map(params![limit as i64], |row| {
                Ok(RunRow {
                    run_id: row.get(0)?,
                    engine: row.get(1)?,
                    format: row.get(2)?,
                    finished_at: row.get(3)?,
                    total_samples: row.get(4)?,
                    exact_matches: row.get(5)?,
                    accuracy: row.get(6)?,
                    avg_cer: row.get(7)?,
                    avg_edit_distance: row.get(8)?,
                    sample_rows: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<RunRow>>>()
            .context("failed to read run history")?;

        Ok(rows)
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        let version = self
            .connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS runs (
              run_id TEXT PRIMARY KEY,
              engine TEXT NOT NULL,
              format TEXT NOT NULL,
              input_dir TEXT NOT NULL,
              gt_sha256 TEXT NOT NULL,
              min_score REAL NOT NULL,
              started_at TEXT NOT NULL,
              finished_at TEXT NOT NULL,
              total_samples INTEGER NOT NULL,
              exact_matches INTEGER NOT NULL,
              accuracy REAL NOT NULL,
              avg_cer REAL NOT NULL,
              avg_edit_distance REAL NOT NULL,
              avg_det_score REAL,
              avg_rec_score REAL,
              avg_paragraph_count REAL,
              avg_table_count REAL,
              avg_figure_count REAL
            );

            CREATE TABLE IF NOT EXISTS sample_results (
              run_id TEXT NOT NULL,
              sample_key TEXT NOT NULL,
              source_path TEXT NOT NULL,
              exact_match INTEGER NOT NULL,
              edit_distance INTEGER NOT NULL,
              cer REAL NOT NULL,
              predicted_length INTEGER NOT NULL,
              ground_truth_length INTEGER NOT NULL,
              PRIMARY KEY(run_id, sample_key),
              FOREIGN KEY(run_id) REFERENCES runs(run_id)
            );

            CREATE INDEX IF NOT EXISTS idx_sample_results_key ON sample_results(sample_key);
            ",
        )
        .context("failed to create results schema")?;

    connection
        .execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}
