use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::category::LabelMapping;
use crate::error::{Error, Result};
use crate::normalize::{Normalizer, RecordSchema, default_header_tokens};
use crate::tokenize::{Tokenizer, WordChars};

pub const DEFAULT_TOP_K: usize = 30;
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// How records are scheduled onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One thread, records in input order.
    Sequential,
    /// Files and record batches counted independently on the rayon pool, then merged.
    #[default]
    Parallel,
}

/// Everything a run needs, passed explicitly into each entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub top_k: usize,
    pub min_token_length: usize,
    pub word_chars: WordChars,
    pub label_mapping: LabelMapping,
    pub header_tokens: BTreeSet<String>,
    /// Drop records whose text is blank after trimming.
    pub require_text: bool,
    pub schema: RecordSchema,
    pub has_headers: bool,
    pub delimiter: char,
    pub strategy: Strategy,
    pub batch_size: usize,
    /// Map stage only: sum counts locally before emitting.
    pub combine: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            top_k: DEFAULT_TOP_K,
            min_token_length: 1,
            word_chars: WordChars::Word,
            label_mapping: LabelMapping::default(),
            header_tokens: default_header_tokens(),
            require_text: false,
            schema: RecordSchema::default(),
            has_headers: false,
            delimiter: ',',
            strategy: Strategy::Parallel,
            batch_size: DEFAULT_BATCH_SIZE,
            combine: false,
        }
    }
}

impl PipelineConfig {
    /// Stricter policy: three columns (polarity, title, text), ASCII letters only,
    /// tokens of two or more characters, blank texts dropped.
    pub fn dataframe_variant() -> Self {
        PipelineConfig {
            min_token_length: 2,
            word_chars: WordChars::Letters,
            require_text: true,
            schema: RecordSchema::three_field(),
            ..PipelineConfig::default()
        }
    }

    /// Load from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.label_mapping.negative == self.label_mapping.positive {
            return Err(Error::Config(format!(
                "label codes must differ (both are {})",
                self.label_mapping.negative
            )));
        }
        if !self.delimiter.is_ascii() {
            return Err(Error::Config(format!(
                "delimiter '{}' is not a single-byte character",
                self.delimiter
            )));
        }
        Ok(())
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(
            self.label_mapping,
            self.header_tokens.clone(),
            self.require_text,
        )
    }

    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.word_chars, self.min_token_length)
    }

    pub(crate) fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.delimiter as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FieldRef;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"top_k": 5, "word_chars": "letters", "schema": {{"label": "polarity", "text": 2}}}}"#
        )
        .unwrap();
        let config = PipelineConfig::from_json_file(f.path()).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.word_chars, WordChars::Letters);
        assert_eq!(config.schema.label, FieldRef::Name("polarity".into()));
        assert_eq!(config.schema.text, FieldRef::Index(2));
        assert_eq!(config.min_token_length, 1);
        assert_eq!(config.label_mapping, LabelMapping::default());
        assert_eq!(config.strategy, Strategy::Parallel);
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut config = PipelineConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.label_mapping.positive = config.label_mapping.negative;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.delimiter = '§';
        assert!(config.validate().is_err());

        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::dataframe_variant().validate().is_ok());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{ top_k: ").unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(f.path()),
            Err(Error::Json(_))
        ));
    }
}
