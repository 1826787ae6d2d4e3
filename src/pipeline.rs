use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::category::Category;
use crate::config::{PipelineConfig, Strategy};
use crate::error::{Error, Result};
use crate::export::is_export_file;
use crate::frequency::{Aggregate, RankedList, RecordStats};
use crate::normalize::{Normalizer, ResolvedSchema};
use crate::tokenize::Tokenizer;

/// Ranked words for both categories plus the label summary of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopWords {
    pub top_k: usize,
    pub negative: RankedList,
    pub positive: RankedList,
    pub stats: RecordStats,
}

impl TopWords {
    pub fn from_aggregate(aggregate: &Aggregate, top_k: usize) -> Self {
        TopWords {
            top_k,
            negative: aggregate.table.rank(Category::Negative, top_k),
            positive: aggregate.table.rank(Category::Positive, top_k),
            stats: aggregate.stats,
        }
    }

    pub fn get(&self, category: Category) -> &RankedList {
        match category {
            Category::Negative => &self.negative,
            Category::Positive => &self.positive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.negative.is_empty() && self.positive.is_empty()
    }
}

/// Per-stream state shared by every record of one input.
struct RecordCounter {
    schema: ResolvedSchema,
    normalizer: Normalizer,
    tokenizer: Tokenizer,
}

impl RecordCounter {
    fn count(&self, record: &StringRecord, into: &mut Aggregate) -> Result<()> {
        let raw = self.schema.project(record);
        let Some((category, text)) = self.normalizer.normalize(&raw) else {
            into.stats.record(None);
            return Ok(());
        };
        into.stats.record(Some(category));
        for token in self.tokenizer.tokenize(text) {
            into.table.accumulate(category, &token, 1)?;
        }
        Ok(())
    }

    fn count_batch(&self, batch: Batch) -> Result<Aggregate> {
        let mut aggregate = Aggregate::default();
        aggregate.stats.rejected += batch.unreadable;
        for record in &batch.records {
            self.count(record, &mut aggregate)?;
        }
        Ok(aggregate)
    }
}

/// Outcome of one read: a record, a row to drop, or end of input.
enum Next {
    Record,
    Unreadable,
    Eof,
}

fn read_next<R: Read>(reader: &mut csv::Reader<R>, record: &mut StringRecord) -> Result<Next> {
    match reader.read_record(record) {
        Ok(true) => Ok(Next::Record),
        Ok(false) => Ok(Next::Eof),
        Err(err) if err.is_io_error() => Err(err.into()),
        Err(err) => {
            debug!("dropping unreadable record: {err}");
            Ok(Next::Unreadable)
        }
    }
}

struct Batch {
    records: Vec<StringRecord>,
    unreadable: u64,
}

/// Splits a CSV stream into owned batches so they can be counted on other threads.
struct Batches<R> {
    reader: csv::Reader<R>,
    size: usize,
    done: bool,
}

impl<R: Read> Iterator for Batches<R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut batch = Batch {
            records: Vec::with_capacity(self.size),
            unreadable: 0,
        };
        let mut record = StringRecord::new();
        while batch.records.len() < self.size {
            match read_next(&mut self.reader, &mut record) {
                Ok(Next::Record) => batch.records.push(std::mem::take(&mut record)),
                Ok(Next::Unreadable) => batch.unreadable += 1,
                Ok(Next::Eof) => {
                    self.done = true;
                    break;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        if batch.records.is_empty() && batch.unreadable == 0 {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

pub(crate) fn csv_reader<R: Read>(input: R, config: &PipelineConfig) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(config.has_headers)
        .flexible(true)
        .delimiter(config.delimiter_byte())
        .from_reader(input)
}

fn record_counter<R: Read>(
    reader: &mut csv::Reader<R>,
    config: &PipelineConfig,
) -> Result<RecordCounter> {
    let headers = if config.has_headers {
        Some(reader.headers()?.clone())
    } else {
        None
    };
    Ok(RecordCounter {
        schema: config.schema.resolve(headers.as_ref())?,
        normalizer: config.normalizer(),
        tokenizer: config.tokenizer(),
    })
}

/// Count one CSV stream. Malformed rows are dropped and tallied in `stats.rejected`.
pub fn analyze_reader<R: Read + Send>(input: R, config: &PipelineConfig) -> Result<Aggregate> {
    config.validate()?;
    let mut reader = csv_reader(input, config);
    let counter = record_counter(&mut reader, config)?;

    match config.strategy {
        Strategy::Sequential => {
            let mut aggregate = Aggregate::default();
            let mut record = StringRecord::new();
            loop {
                match read_next(&mut reader, &mut record)? {
                    Next::Record => counter.count(&record, &mut aggregate)?,
                    Next::Unreadable => aggregate.stats.record(None),
                    Next::Eof => break,
                }
            }
            Ok(aggregate)
        }
        Strategy::Parallel => Batches {
            reader,
            size: config.batch_size,
            done: false,
        }
        .par_bridge()
        .map(|batch| batch.and_then(|b| counter.count_batch(b)))
        .try_reduce(Aggregate::default, Aggregate::merge),
    }
}

pub fn analyze_file(path: &Path, config: &PipelineConfig) -> Result<Aggregate> {
    debug!("reading {}", path.display());
    let file = File::open(path)?;
    let aggregate = analyze_reader(io::BufReader::new(file), config)?;
    debug!(
        "{}: {} accepted, {} rejected",
        path.display(),
        aggregate.stats.accepted(),
        aggregate.stats.rejected
    );
    Ok(aggregate)
}

/// Count several files, each one an independent partition.
pub fn analyze_files(files: &[PathBuf], config: &PipelineConfig) -> Result<Aggregate> {
    match config.strategy {
        Strategy::Sequential => files.iter().try_fold(Aggregate::default(), |acc, path| {
            acc.merge(analyze_file(path, config)?)
        }),
        Strategy::Parallel => files
            .par_iter()
            .map(|path| analyze_file(path, config))
            .try_reduce(Aggregate::default, Aggregate::merge),
    }
}

///Collect input files below `path`: the path itself if it is a file, otherwise every
///`.csv` file in the directory tree, sorted. Rankings written by `write_exports` are
///skipped so a rerun over the output directory does not count them as reviews.
pub fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(path)?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .filter(|p| {
            let export = is_export_file(p);
            if export {
                debug!("skipping exported ranking {}", p.display());
            }
            !export
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Run the whole single-pass pipeline over a file or directory.
pub fn analyze_path(path: &Path, config: &PipelineConfig) -> Result<TopWords> {
    config.validate()?;
    let files = collect_files(path)?;
    if files.is_empty() {
        return Err(Error::NoInput(path.to_path_buf()));
    }
    info!("analyzing {} input file(s) under {}", files.len(), path.display());
    let aggregate = analyze_files(&files, config)?;
    log_summary(&aggregate.stats);
    Ok(TopWords::from_aggregate(&aggregate, config.top_k))
}

pub(crate) fn log_summary(stats: &RecordStats) {
    info!(
        "records by normalized label: negative={} positive={} rejected={}",
        stats.negative, stats.positive, stats.rejected
    );
    if stats.accepted() == 0 {
        warn!("no labeled records found; rankings are empty");
    }
}
