use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::adapters::{Adapter, ExtractOptions};
use crate::aggregate::aggregate;
use crate::artifacts::{
    Artifact, EVALUATION_DIR_SUFFIX, discover_artifacts, read_raw_sample, select_one_per_key,
};
use crate::cli::EvaluateArgs;
use crate::error::SampleError;
use crate::ground_truth::GroundTruthIndex;
use crate::metrics::evaluate_sample;
use crate::model::{
    EvaluationCounts, EvaluationPaths, EvaluationResult, EvaluationRunManifest,
    GroundTruthEntry, SummaryStatistics,
};
use crate::store::{DEFAULT_DB_FILE, RunRecord, RunStore};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, sibling_with_suffix, utc_compact_string,
    write_json_pretty,
};

const MANIFEST_VERSION: u32 = 1;

mod pipeline;
mod run;

pub use run::run;
