#![forbid(unsafe_code)]
//! # topwords CLI
//!
//! Command-line interface for the `sentiment_topwords` crate: ranks the most
//! frequent words of negative and positive reviews in labeled CSV data.
//!
//! ## Example
//! ```bash
//! # single pass over a file or directory
//! topwords count data/train.csv --top-k 30 --export-format csv --out-dir out
//!
//! # the same job as two streaming stages
//! topwords map < data/train.csv | sort | topwords reduce
//! ```
//!
//! Set `RUST_LOG=info` to see the label summary and previews.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::error;
use sentiment_topwords::{
    ExportFormat, FieldRef, PipelineConfig, Strategy, TopWords, WordChars, analyze_path,
    map_stream, preview, reduce_stream, render_text, write_exports,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count and rank words in a CSV file or a directory of CSV files
    Count {
        /// File or directory to analyze
        path: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Process records on a single thread, in input order
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Records per parallel batch
        #[arg(long)]
        batch_size: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Map stage: CSV on stdin, `sentiment:word<TAB>count` lines on stdout
    Map {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Sum counts locally and emit each word once
        #[arg(long, default_value_t = false)]
        combine: bool,
    },
    /// Reduce stage: map output on stdin, ranked report out
    Reduce {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of words to keep per sentiment
        #[arg(long)]
        top_k: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct PipelineArgs {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from the stricter policy (3 columns, ASCII letters, tokens >= 2 chars)
    #[arg(long, default_value_t = false, conflicts_with = "config")]
    strict: bool,

    /// Number of words to keep per sentiment (default 30)
    #[arg(long)]
    top_k: Option<usize>,

    /// Shortest token to count, in characters
    #[arg(long)]
    min_token_length: Option<usize>,

    /// Characters that make up a word
    #[arg(long)]
    word_chars: Option<WordChars>,

    /// Label column: zero-based index or header name
    #[arg(long)]
    label_field: Option<FieldRef>,

    /// Text column: zero-based index or header name
    #[arg(long)]
    text_field: Option<FieldRef>,

    /// First row is a header (needed to address columns by name)
    #[arg(long, default_value_t = false)]
    has_headers: bool,

    /// Field delimiter
    #[arg(long)]
    delimiter: Option<char>,

    /// Drop records whose text is blank
    #[arg(long, default_value_t = false)]
    require_text: bool,
}

impl PipelineArgs {
    fn into_config(self) -> sentiment_topwords::Result<PipelineConfig> {
        let mut config = match (&self.config, self.strict) {
            (Some(path), _) => PipelineConfig::from_json_file(path)?,
            (None, true) => PipelineConfig::dataframe_variant(),
            (None, false) => PipelineConfig::default(),
        };
        if let Some(k) = self.top_k {
            config.top_k = k;
        }
        if let Some(n) = self.min_token_length {
            config.min_token_length = n;
        }
        if let Some(chars) = self.word_chars {
            config.word_chars = chars;
        }
        if let Some(field) = self.label_field {
            config.schema.label = field;
        }
        if let Some(field) = self.text_field {
            config.schema.text = field;
        }
        if let Some(d) = self.delimiter {
            config.delimiter = d;
        }
        config.has_headers |= self.has_headers;
        config.require_text |= self.require_text;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output format (txt, csv, tsv, json)
    #[arg(long, default_value = "txt")]
    export_format: ExportFormat,

    /// Directory for exported files; txt without it prints to stdout
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Log this many entries per sentiment at info level
    #[arg(long, default_value_t = 10)]
    preview: usize,
}

fn emit(top: &TopWords, stem: &str, output: &OutputArgs) -> sentiment_topwords::Result<()> {
    preview(top, output.preview);
    match (&output.out_dir, output.export_format) {
        (None, ExportFormat::Txt) => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(render_text(top).as_bytes())?;
            stdout.flush()?;
        }
        (out_dir, format) => {
            let dir = out_dir.as_deref().unwrap_or(Path::new("."));
            for path in write_exports(top, stem, dir, format)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn input_stem(path: &Path) -> String {
    if path.is_dir() {
        return "combined".to_string();
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "combined".to_string())
}

fn run(cli: Cli) -> sentiment_topwords::Result<()> {
    match cli.command {
        Command::Count {
            path,
            pipeline,
            sequential,
            batch_size,
            output,
        } => {
            let mut config = pipeline.into_config()?;
            if sequential {
                config.strategy = Strategy::Sequential;
            }
            if let Some(size) = batch_size {
                config.batch_size = size;
            }
            let top = analyze_path(&path, &config)?;
            emit(&top, &input_stem(&path), &output)
        }
        Command::Map { pipeline, combine } => {
            let mut config = pipeline.into_config()?;
            config.combine |= combine;
            map_stream(io::stdin().lock(), io::stdout().lock(), &config)?;
            Ok(())
        }
        Command::Reduce {
            config,
            top_k,
            output,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_json_file(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(k) = top_k {
                config.top_k = k;
            }
            let top = reduce_stream(io::stdin().lock(), &config)?;
            emit(&top, "reduce", &output)
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Error: {}", e);
        process::exit(1);
    }
}
