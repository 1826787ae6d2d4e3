use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::category::Category;

/// Errors surfaced by the pipeline. Malformed records are not errors; they are
/// dropped and only show up in [`RecordStats`](crate::RecordStats).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("csv read failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("json failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("no input files found under {}", .0.display())]
    NoInput(PathBuf),
    #[error("count for '{word}' ({category}) overflowed")]
    CountOverflow { category: Category, word: String },
}

pub type Result<T> = std::result::Result<T, Error>;
