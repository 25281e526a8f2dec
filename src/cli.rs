use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::ArtifactFormat;

#[derive(Parser, Debug)]
#[command(
    name = "ocr-eval",
    version,
    about = "Score OCR engine output against a ground-truth corpus"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    Combine(CombineArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Directory holding one engine's raw output.
    pub input_dir: PathBuf,

    #[arg(long, value_enum)]
    pub format: ArtifactFormat,

    #[arg(long)]
    pub gt_dataset: PathBuf,

    /// Defaults to the input directory name.
    #[arg(long)]
    pub engine: Option<String>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, env = "OCR_EVAL_MIN_SCORE", default_value_t = 0.0)]
    pub min_score: f64,

    #[arg(long)]
    pub threads: Option<usize>,

    #[arg(long, default_value = ".cache/ocr-eval")]
    pub cache_root: PathBuf,

    #[arg(long, env = "OCR_EVAL_DB_PATH")]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_store: bool,
}

/// One engine's output for `combine`, written `NAME=FORMAT:DIR`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSource {
    pub name: String,
    pub format: ArtifactFormat,
    pub dir: PathBuf,
}

pub fn parse_engine_source(value: &str) -> Result<EngineSource, String> {
    let (name, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=FORMAT:DIR, got '{value}'"))?;
    let (format, dir) = rest
        .split_once(':')
        .ok_or_else(|| format!("expected NAME=FORMAT:DIR, got '{value}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("engine name is empty in '{value}'"));
    }
    if dir.is_empty() {
        return Err(format!("engine directory is empty in '{value}'"));
    }
    let format = ArtifactFormat::from_str(format.trim(), true)?;

    Ok(EngineSource {
        name: name.to_string(),
        format,
        dir: PathBuf::from(dir),
    })
}

#[derive(Args, Debug, Clone)]
pub struct CombineArgs {
    #[arg(long = "engine", value_parser = parse_engine_source, required = true)]
    pub engines: Vec<EngineSource>,

    #[arg(long, default_value = "combined_texts.json")]
    pub output: PathBuf,

    /// Key artifacts through the corpus so differently named outputs line up.
    #[arg(long)]
    pub gt_dataset: Option<PathBuf>,

    #[arg(long, env = "OCR_EVAL_MIN_SCORE", default_value_t = 0.0)]
    pub min_score: f64,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/ocr-eval")]
    pub cache_root: PathBuf,

    #[arg(long, env = "OCR_EVAL_DB_PATH")]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}
