use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::model::{GroundTruthEntry, GroundTruthRecord};

/// Join key derived from an artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleKey {
    /// Stem with any trailing page index removed.
    pub key: String,
    /// Stem as written on disk.
    pub stem: String,
    /// Saturates at `u64::MAX` for digit runs too long to represent.
    pub page_index: Option<u64>,
}

impl SampleKey {
    /// Rank used to pick one artifact per document; unsuffixed names count as page 0.
    pub fn page_rank(&self) -> u64 {
        self.page_index.unwrap_or(0)
    }
}

/// `"batch_0_sample_0_0.json"` becomes key `"batch_0_sample_0"` with page 0.
pub fn derive_sample_key(file_name: &str) -> SampleKey {
    let stem = file_stem(file_name).to_string();

    if let Some((prefix, suffix)) = stem.rsplit_once('_')
        && !prefix.is_empty()
        && !suffix.is_empty()
        && suffix.chars().all(|ch| ch.is_ascii_digit())
    {
        return SampleKey {
            key: prefix.to_string(),
            stem: stem.clone(),
            page_index: Some(suffix.parse::<u64>().unwrap_or(u64::MAX)),
        };
    }

    SampleKey {
        key: stem.clone(),
        stem,
        page_index: None,
    }
}

/// Corpus paths are keyed by base file name without extension.
pub fn corpus_key(path: &str) -> &str {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file_stem(base)
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(index) if index > 0 => &file_name[..index],
        _ => file_name,
    }
}

#[derive(Debug, Default)]
pub struct GroundTruthIndex {
    entries: HashMap<String, GroundTruthEntry>,
    duplicate_keys: Vec<String>,
}

impl GroundTruthIndex {
    /// Loading the corpus is the one failure that aborts a run.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read ground truth corpus {}", path.display()))?;
        let records: Vec<GroundTruthRecord> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse ground truth corpus {}", path.display()))?;

        let index = Self::from_records(records);
        for key in &index.duplicate_keys {
            warn!(key = %key, corpus = %path.display(), "duplicate ground truth key, last entry wins");
        }

        Ok(index)
    }

    pub fn from_records(records: impl IntoIterator<Item = GroundTruthRecord>) -> Self {
        let mut index = Self::default();

        for record in records {
            let sample_key = corpus_key(&record.path).to_string();
            let entry = GroundTruthEntry {
                sample_key: sample_key.clone(),
                reference_text: record.gt,
            };
            if index.entries.insert(sample_key.clone(), entry).is_some() {
                index.duplicate_keys.push(sample_key);
            }
        }

        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicate_keys(&self) -> &[String] {
        &self.duplicate_keys
    }

    pub fn get(&self, key: &str) -> Option<&GroundTruthEntry> {
        self.entries.get(key)
    }

    /// Exact lookup on the derived key, then on the unstripped stem for engines
    /// that name artifacts after the image without a page index.
    pub fn lookup(&self, sample: &SampleKey) -> Option<&GroundTruthEntry> {
        self.get(&sample.key).or_else(|| {
            if sample.page_index.is_some() {
                self.get(&sample.stem)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, gt: &str) -> GroundTruthRecord {
        GroundTruthRecord {
            path: path.to_string(),
            gt: gt.to_string(),
        }
    }

    #[test]
    fn derive_sample_key_strips_extension_and_page_index() {
        let key = derive_sample_key("batch_0_sample_0_0.json");
        assert_eq!(key.key, "batch_0_sample_0");
        assert_eq!(key.stem, "batch_0_sample_0_0");
        assert_eq!(key.page_index, Some(0));

        let key = derive_sample_key("ja_pii_handwriting_0001_12.html");
        assert_eq!(key.key, "ja_pii_handwriting_0001");
        assert_eq!(key.page_index, Some(12));
    }

    #[test]
    fn derive_sample_key_leaves_non_numeric_suffixes() {
        let key = derive_sample_key("receipt_front.md");
        assert_eq!(key.key, "receipt_front");
        assert_eq!(key.page_index, None);

        let key = derive_sample_key("scan_-1.json");
        assert_eq!(key.key, "scan_-1");
        assert_eq!(key.page_index, None);

        let key = derive_sample_key("_7.json");
        assert_eq!(key.key, "_7");
        assert_eq!(key.page_index, None);

        let key = derive_sample_key("noextension_3");
        assert_eq!(key.key, "noextension");
        assert_eq!(key.page_index, Some(3));
    }

    #[test]
    fn oversized_page_suffix_is_still_stripped() {
        let key = derive_sample_key("scan_4294967296.json");
        assert_eq!(key.key, "scan");
        assert_eq!(key.page_index, Some(4_294_967_296));

        let key = derive_sample_key("scan_99999999999999999999999.json");
        assert_eq!(key.key, "scan");
        assert_eq!(key.page_rank(), u64::MAX);
        assert!(derive_sample_key("scan_0.json").page_rank() < key.page_rank());
    }

    #[test]
    fn corpus_key_uses_base_name_without_extension() {
        assert_eq!(corpus_key("cropped_images/batch_0_sample_0.png"), "batch_0_sample_0");
        assert_eq!(corpus_key(r"images\nested\scan.v2.jpg"), "scan.v2");
        assert_eq!(corpus_key("plain"), "plain");
    }

    #[test]
    fn page_suffixed_sample_matches_corpus_basename() {
        let index = GroundTruthIndex::from_records([
            record("cropped_images/batch_0_sample_0.png", "愛知県"),
            record("cropped_images/batch_0_sample_1.png", "岐阜県"),
        ]);

        let entry = index
            .lookup(&derive_sample_key("batch_0_sample_0_0.json"))
            .expect("suffixed artifact should match");
        assert_eq!(entry.sample_key, "batch_0_sample_0");
        assert_eq!(entry.reference_text, "愛知県");
    }

    #[test]
    fn unsuffixed_artifact_falls_back_to_full_stem() {
        let index = GroundTruthIndex::from_records([record("imgs/batch_0_sample_1.png", "岐阜県")]);

        let entry = index
            .lookup(&derive_sample_key("batch_0_sample_1.md"))
            .expect("stem should match exactly");
        assert_eq!(entry.reference_text, "岐阜県");
        assert!(index.lookup(&derive_sample_key("batch_0_sample_9.md")).is_none());
    }

    #[test]
    fn lookup_is_exact_only() {
        let index = GroundTruthIndex::from_records([record("a/Sample.png", "text")]);
        assert!(index.lookup(&derive_sample_key("sample.json")).is_none());
        assert!(index.lookup(&derive_sample_key("Sample .json")).is_none());
    }

    #[test]
    fn duplicate_corpus_keys_keep_last_entry() {
        let index = GroundTruthIndex::from_records([
            record("a/doc.png", "first"),
            record("b/doc.jpg", "second"),
        ]);

        assert_eq!(index.len(), 1);
        assert_eq!(index.duplicate_keys(), ["doc".to_string()]);
        assert_eq!(index.get("doc").map(|entry| entry.reference_text.as_str()), Some("second"));
    }

    #[test]
    fn load_reads_corpus_and_accepts_text_alias() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gt_dataset.json");
        fs::write(
            &path,
            r#"[{"path": "x/one.png", "gt": "一"}, {"path": "x/two.png", "text": "二"}, {"path": "x/three.png"}]"#,
        )
        .expect("write corpus");

        let index = GroundTruthIndex::load(&path).expect("corpus loads");
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("two").map(|entry| entry.reference_text.as_str()), Some("二"));
        assert_eq!(index.get("three").map(|entry| entry.reference_text.as_str()), Some(""));
    }

    #[test]
    fn load_fails_for_missing_or_malformed_corpus() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(GroundTruthIndex::load(&dir.path().join("absent.json")).is_err());

        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").expect("write corpus");
        assert!(GroundTruthIndex::load(&path).is_err());
    }
}
