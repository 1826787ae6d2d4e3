//! # sentiment_topwords
//!
//! Counts words in a labeled review corpus and ranks the most frequent ones for each
//! sentiment class. Rows carry a numeric label (`1` = negative, `2` = positive by
//! default) and free text; every other row is dropped.
//!
//! The same counting runs in two shapes:
//! - single pass over one or more CSV files ([`analyze_path`]), sequential or
//!   partitioned across the rayon pool;
//! - a map stage and a reduce stage connected by `"{sentiment}:{word}\t{count}"`
//!   lines ([`map_stream`], [`reduce_stream`]).
//!
//! Rankings order by count descending, then by word ascending, so every run over the
//! same input produces the same list.
//!
//! ## Example
//! ```
//! use sentiment_topwords::{Category, PipelineConfig, TopWords, analyze_reader};
//! let input = "1,\"bad bad product\"\n2,\"good good service\"\n1,\"bad service\"\n";
//! let aggregate = analyze_reader(input.as_bytes(), &PipelineConfig::default()).unwrap();
//! let top = TopWords::from_aggregate(&aggregate, 2);
//! let negative: Vec<_> = top.get(Category::Negative).iter().map(|e| e.word.as_str()).collect();
//! assert_eq!(negative, vec!["bad", "product"]);
//! ```

pub mod category;
pub mod config;
pub mod error;
pub mod export;
pub mod frequency;
pub mod normalize;
pub mod pipeline;
pub mod streaming;
pub mod tokenize;

pub use category::{Category, LabelMapping};
pub use config::{PipelineConfig, Strategy};
pub use error::{Error, Result};
pub use export::{ExportFormat, preview, render_text, write_exports};
pub use frequency::{Aggregate, Count, FrequencyTable, RankedEntry, RankedList, RecordStats};
pub use normalize::{FieldRef, Normalizer, RawRecord, RecordSchema, ResolvedSchema};
pub use pipeline::{
    TopWords, analyze_file, analyze_files, analyze_path, analyze_reader, collect_files,
};
pub use streaming::{map_stream, parse_emission, reduce_stream};
pub use tokenize::{Tokenizer, Tokens, WordChars};
