use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use csv::WriterBuilder;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::Result;
use crate::frequency::RankedList;
use crate::pipeline::TopWords;

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

///Human-readable report: a heading per category followed by `word<TAB>count` lines.
/// # Example
/// ```
/// use sentiment_topwords::{Aggregate, Category, TopWords, render_text};
/// let mut aggregate = Aggregate::default();
/// aggregate.table.accumulate(Category::Positive, "good", 2).unwrap();
/// let report = render_text(&TopWords::from_aggregate(&aggregate, 30));
/// assert_eq!(
///     report,
///     "Top 30 words for negative:\nTop 30 words for positive:\ngood\t2\n"
/// );
/// ```
pub fn render_text(top: &TopWords) -> String {
    let mut out = String::new();
    for category in Category::ALL {
        out.push_str(&format!("Top {} words for {}:\n", top.top_k, category));
        for entry in top.get(category) {
            out.push_str(&format!("{}\t{}\n", entry.word, entry.count));
        }
    }
    out
}

/// Log the first `n` entries of each category.
pub fn preview(top: &TopWords, n: usize) {
    for category in Category::ALL {
        info!("preview {category}:");
        for entry in top.get(category).iter().take(n) {
            info!("  {:<20} {}", entry.word, entry.count);
        }
    }
}

///True for file names shaped like the ones `write_exports` produces:
///`{stem}_{date}_{time}_top{k}[_{category}|_both].{ext}`.
pub(crate) fn is_export_file(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    let stem = match stem.rsplit_once('_') {
        Some((rest, "negative" | "positive" | "both")) => rest,
        _ => stem,
    };
    let mut parts = stem.rsplit('_');
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let top = parts.next().and_then(|p| p.strip_prefix("top"));
    let time = parts.next();
    let date = parts.next();
    matches!(
        (top, time, date, parts.next()),
        (Some(k), Some(t), Some(d), Some(_))
            if is_digits(k) && t.len() == 6 && is_digits(t) && d.len() == 8 && is_digits(d)
    )
}

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn delimiter(format: ExportFormat) -> u8 {
    match format {
        ExportFormat::Tsv => b'\t',
        _ => b',',
    }
}

fn write_list(path: &Path, list: &RankedList, format: ExportFormat) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter(format))
        .from_path(path)?;
    wtr.write_record(["word", "count"])?;
    for entry in list {
        let count = entry.count.to_string();
        wtr.write_record([entry.word.as_str(), count.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_combined(path: &Path, top: &TopWords, format: ExportFormat) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter(format))
        .from_path(path)?;
    wtr.write_record(["sentiment", "word", "count"])?;
    for list in [&top.positive, &top.negative] {
        for entry in list {
            let count = entry.count.to_string();
            wtr.write_record([list.category.as_str(), entry.word.as_str(), count.as_str()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

///Write the ranking into `out_dir` as `{stem}_{timestamp}_top{k}...` files and return
///the paths written. Empty tables are skipped with a warning rather than written.
pub fn write_exports(
    top: &TopWords,
    stem: &str,
    out_dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    let base = format!("{}_{}_top{}", stem, timestamp(), top.top_k);
    let ext = format.extension();
    let mut written = Vec::new();

    match format {
        ExportFormat::Txt => {
            let path = out_dir.join(format!("{base}.{ext}"));
            let mut file = BufWriter::new(File::create(&path)?);
            file.write_all(render_text(top).as_bytes())?;
            file.flush()?;
            written.push(path);
        }
        ExportFormat::Json => {
            let path = out_dir.join(format!("{base}.{ext}"));
            let mut file = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut file, top)?;
            file.flush()?;
            written.push(path);
        }
        ExportFormat::Csv | ExportFormat::Tsv => {
            for category in Category::ALL {
                let list = top.get(category);
                let path = out_dir.join(format!("{base}_{category}.{ext}"));
                if list.is_empty() {
                    warn!("no {category} words; nothing written to {}", path.display());
                    continue;
                }
                write_list(&path, list, format)?;
                written.push(path);
            }
            let path = out_dir.join(format!("{base}_both.{ext}"));
            if top.is_empty() {
                warn!("combined output empty; nothing written to {}", path.display());
            } else {
                write_combined(&path, top, format)?;
                written.push(path);
            }
        }
    }

    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(written)
}
