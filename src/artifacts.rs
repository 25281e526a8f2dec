use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::error::SampleError;
use crate::ground_truth::{SampleKey, derive_sample_key};
use crate::model::{ArtifactFormat, RawSample};

/// Directories ending with this suffix hold our own reports, never engine output.
pub const EVALUATION_DIR_SUFFIX: &str = "_evaluation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub sample_key: SampleKey,
}

/// Artifacts selected for evaluation, one per resolved key.
#[derive(Debug)]
pub struct Selection<T> {
    pub selected: Vec<(String, Artifact, T)>,
    pub duplicates: Vec<Artifact>,
    pub unresolved: Vec<Artifact>,
}

pub fn discover_artifacts(input_dir: &Path, format: ArtifactFormat) -> Result<Vec<Artifact>> {
    let extensions = format.extensions();
    let mut artifacts = Vec::new();

    let walker = WalkDir::new(input_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_string_lossy()
                    .ends_with(EVALUATION_DIR_SUFFIX)
        });

    for entry in walker {
        let entry =
            entry.with_context(|| format!("failed to walk {}", input_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matches_format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|known| ext.eq_ignore_ascii_case(known)))
            .unwrap_or(false);
        if !matches_format {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        artifacts.push(Artifact {
            sample_key: derive_sample_key(&file_name),
            path: path.to_path_buf(),
        });
    }

    Ok(artifacts)
}

/// Resolves every artifact to a key and keeps the lowest page per key, so each
/// key is backed by exactly one artifact. Ties keep the earlier path.
pub fn select_one_per_key<T, F>(artifacts: Vec<Artifact>, mut resolve: F) -> Selection<T>
where
    F: FnMut(&SampleKey) -> Option<(String, T)>,
{
    let mut by_key: BTreeMap<String, (Artifact, T)> = BTreeMap::new();
    let mut selection = Selection {
        selected: Vec::new(),
        duplicates: Vec::new(),
        unresolved: Vec::new(),
    };

    for artifact in artifacts {
        let Some((key, value)) = resolve(&artifact.sample_key) else {
            selection.unresolved.push(artifact);
            continue;
        };

        match by_key.remove(&key) {
            Some((current, current_value))
                if current.sample_key.page_rank() <= artifact.sample_key.page_rank() =>
            {
                selection.duplicates.push(artifact);
                by_key.insert(key, (current, current_value));
            }
            Some((current, _)) => {
                selection.duplicates.push(current);
                by_key.insert(key, (artifact, value));
            }
            None => {
                by_key.insert(key, (artifact, value));
            }
        }
    }

    selection.selected = by_key
        .into_iter()
        .map(|(key, (artifact, value))| (key, artifact, value))
        .collect();
    selection
}

/// Reads an artifact as text. Invalid UTF-8 is replaced rather than rejected,
/// and an all-whitespace file yields an absent payload.
pub fn read_raw_sample(
    artifact: &Artifact,
    sample_key: &str,
    format: ArtifactFormat,
) -> Result<RawSample, SampleError> {
    let bytes = fs::read(&artifact.path).map_err(|source| SampleError::MissingArtifact {
        path: artifact.path.clone(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    Ok(RawSample {
        sample_key: sample_key.to_string(),
        format,
        payload: (!content.trim().is_empty()).then_some(content),
        source_path: artifact.path.clone(),
    })
}
