use std::collections::{BTreeMap, HashSet};

use anyhow::{Result, bail};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::adapters::{Adapter, ExtractOptions};
use crate::artifacts::{discover_artifacts, read_raw_sample, select_one_per_key};
use crate::cli::{CombineArgs, EngineSource};
use crate::ground_truth::GroundTruthIndex;
use crate::model::CombinedTextRow;
use crate::util::write_json_pretty;

pub fn run(args: CombineArgs) -> Result<()> {
    let options = ExtractOptions::with_min_score(args.min_score)?;
    let index = args
        .gt_dataset
        .as_deref()
        .map(GroundTruthIndex::load)
        .transpose()?;

    info!(
        engines = args.engines.len(),
        keyed_by_corpus = index.is_some(),
        "combining engine texts"
    );

    let rows = combine_sources(&args.engines, index.as_ref(), &options)?;
    write_json_pretty(&args.output, &rows)?;

    info!(path = %args.output.display(), rows = rows.len(), "wrote combined texts");
    Ok(())
}

/// Extracts every engine's text and lines the engines up by sample key.
/// Samples an engine produced nothing for are simply absent from its map.
pub fn combine_sources(
    sources: &[EngineSource],
    index: Option<&GroundTruthIndex>,
    options: &ExtractOptions,
) -> Result<Vec<CombinedTextRow>> {
    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.name.as_str()) {
            bail!("engine '{}' given more than once", source.name);
        }
        if !source.dir.is_dir() {
            bail!(
                "input directory for engine '{}' does not exist: {}",
                source.name,
                source.dir.display()
            );
        }
    }

    let mut combined: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

    for source in sources {
        let adapter = Adapter::for_format(source.format);
        let artifacts = discover_artifacts(&source.dir, source.format)?;
        let discovered = artifacts.len();

        let selection = select_one_per_key(artifacts, |sample_key| match index {
            Some(index) => index
                .lookup(sample_key)
                .map(|entry| (entry.sample_key.clone(), ())),
            None => Some((sample_key.key.clone(), ())),
        });

        for artifact in &selection.unresolved {
            warn!(
                engine = %source.name,
                path = %artifact.path.display(),
                "no ground truth entry, leaving artifact out"
            );
        }

        let extracted = selection
            .selected
            .par_iter()
            .map(|(sample_key, artifact, ())| {
                read_raw_sample(artifact, sample_key, source.format)
                    .map(|raw| adapter.extract(&raw, options))
            })
            .collect::<Vec<_>>();

        let mut collected = 0usize;
        for outcome in extracted {
            match outcome {
                Ok(sample) => {
                    for warning in &sample.warnings {
                        warn!(engine = %source.name, sample_key = %sample.sample_key, "{warning}");
                    }
                    combined
                        .entry(sample.sample_key)
                        .or_default()
                        .insert(source.name.clone(), sample.text);
                    collected += 1;
                }
                Err(err) => {
                    warn!(engine = %source.name, error = %err, "skipping artifact");
                }
            }
        }

        info!(
            engine = %source.name,
            format = source.format.as_str(),
            discovered,
            duplicates = selection.duplicates.len(),
            samples = collected,
            "collected engine texts"
        );
    }

    Ok(combined
        .into_iter()
        .map(|(sample_key, texts)| CombinedTextRow { sample_key, texts })
        .collect())
}
