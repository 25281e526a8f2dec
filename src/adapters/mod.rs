//! Format adapters: one raw engine artifact in, one extracted text out.

use anyhow::{Result, bail};

use crate::error::SampleError;
use crate::model::{
    ArtifactFormat, ConfidenceStats, ExtractedSample, RawSample, StructuralCounts,
};

mod markup;
mod paragraphs;
mod plain_text;
mod words;

pub use markup::MarkupAdapter;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtractOptions {
    /// Word-level fragments below this detection or recognition score are dropped.
    pub min_score: f64,
}

impl ExtractOptions {
    pub fn with_min_score(min_score: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_score) {
            bail!("--min-score must be within [0, 1], got {min_score}");
        }
        Ok(Self { min_score })
    }
}

#[derive(Debug, Default)]
struct Extraction {
    text: String,
    structural_counts: Option<StructuralCounts>,
    confidence_stats: Option<ConfidenceStats>,
    warnings: Vec<String>,
}

#[derive(Debug)]
pub enum Adapter {
    Markup(MarkupAdapter),
    PlainText,
    WordJson,
    ParagraphJson,
}

impl Adapter {
    pub fn for_format(format: ArtifactFormat) -> Self {
        match format {
            ArtifactFormat::Markup => Self::Markup(MarkupAdapter),
            ArtifactFormat::PlainText => Self::PlainText,
            ArtifactFormat::WordJson => Self::WordJson,
            ArtifactFormat::ParagraphJson => Self::ParagraphJson,
        }
    }

    pub fn format(&self) -> ArtifactFormat {
        match self {
            Self::Markup(_) => ArtifactFormat::Markup,
            Self::PlainText => ArtifactFormat::PlainText,
            Self::WordJson => ArtifactFormat::WordJson,
            Self::ParagraphJson => ArtifactFormat::ParagraphJson,
        }
    }

    /// Never fails: unreadable payloads come back as empty text with a warning.
    pub fn extract(&self, raw: &RawSample, options: &ExtractOptions) -> ExtractedSample {
        let extraction = match raw.payload.as_deref() {
            None => Err(SampleError::EmptyPayload { format: raw.format }),
            Some(payload) => match self {
                Self::Markup(adapter) => Ok(adapter.extract(payload)),
                Self::PlainText => Ok(plain_text::extract(payload)),
                Self::WordJson => words::extract(payload, options),
                Self::ParagraphJson => paragraphs::extract(payload),
            },
        };

        let extraction = extraction.unwrap_or_else(|err| Extraction {
            warnings: vec![err.to_string()],
            ..Extraction::default()
        });

        ExtractedSample {
            sample_key: raw.sample_key.clone(),
            text: extraction.text,
            structural_counts: extraction.structural_counts,
            confidence_stats: extraction.confidence_stats,
            warnings: extraction.warnings,
        }
    }
}
