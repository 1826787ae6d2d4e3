//! Two-stage form of the job: a map stage that turns CSV rows into
//! `"{sentiment}:{word}\t{count}"` lines and a reduce stage that sums those lines
//! and ranks them. Any shuffle or sort may sit between the stages; the reducer
//! does not depend on line order.

use std::io::{BufRead, BufWriter, Read, Write};

use csv::StringRecord;
use log::{debug, warn};

use crate::category::Category;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::frequency::{Aggregate, Count, FrequencyTable, RecordStats};
use crate::pipeline::{TopWords, csv_reader, log_summary};

fn emit<W: Write>(out: &mut W, category: Category, word: &str, count: Count) -> Result<()> {
    writeln!(out, "{category}:{word}\t{count}")?;
    Ok(())
}

/// Map stage: reads CSV from `input`, writes one emission per token to `output`.
/// With `config.combine` set, counts are summed locally and each (category, word)
/// is written once, sorted, after the input is exhausted.
pub fn map_stream<R: Read, W: Write>(
    input: R,
    output: W,
    config: &PipelineConfig,
) -> Result<RecordStats> {
    config.validate()?;
    let mut reader = csv_reader(input, config);
    let headers = if config.has_headers {
        Some(reader.headers()?.clone())
    } else {
        None
    };
    let schema = config.schema.resolve(headers.as_ref())?;
    let normalizer = config.normalizer();
    let tokenizer = config.tokenizer();

    let mut out = BufWriter::new(output);
    let mut stats = RecordStats::default();
    let mut local = FrequencyTable::new();
    let mut record = StringRecord::new();

    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                debug!("dropping unreadable record: {err}");
                stats.record(None);
                continue;
            }
        }
        let Some((category, text)) = normalizer.normalize(&schema.project(&record)) else {
            stats.record(None);
            continue;
        };
        stats.record(Some(category));
        for token in tokenizer.tokenize(text) {
            if config.combine {
                local.accumulate(category, &token, 1)?;
            } else {
                emit(&mut out, category, &token, 1)?;
            }
        }
    }

    if config.combine {
        for category in Category::ALL {
            let mut words: Vec<(&str, Count)> = local.iter(category).collect();
            words.sort_unstable();
            for (word, count) in words {
                emit(&mut out, category, word, count)?;
            }
        }
    }
    out.flush()?;
    log_summary(&stats);
    Ok(stats)
}

///Parse one map-stage line. Lines that do not have exactly one tab, a `sentiment:word`
///key and a non-negative integer count yield `None`.
/// # Example
/// ```
/// use sentiment_topwords::{Category, parse_emission};
/// assert_eq!(
///     parse_emission("negative:bad\t2"),
///     Some((Category::Negative, "bad".to_string(), 2))
/// );
/// assert_eq!(parse_emission("negative bad 2"), None);
/// ```
pub fn parse_emission(line: &str) -> Option<(Category, String, Count)> {
    let mut parts = line.trim().split('\t');
    let (key, value) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let count: Count = value.trim().parse().ok()?;
    let (sentiment, word) = key.split_once(':')?;
    let category: Category = sentiment.parse().ok()?;
    if word.is_empty() {
        return None;
    }
    Some((category, word.to_string(), count))
}

/// Reduce stage: sums every emission on `input` and ranks the result.
pub fn reduce_stream<R: BufRead>(input: R, config: &PipelineConfig) -> Result<TopWords> {
    let mut table = FrequencyTable::new();
    let mut dropped = 0u64;
    for line in input.lines() {
        let line = line?;
        match parse_emission(&line) {
            Some((category, word, count)) => table.accumulate(category, &word, count)?,
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("dropped {dropped} malformed line(s)");
    }
    if table.is_empty() {
        warn!("reduce input held no emissions; rankings are empty");
    }
    let aggregate = Aggregate {
        table,
        stats: RecordStats::default(),
    };
    Ok(TopWords::from_aggregate(&aggregate, config.top_k))
}
