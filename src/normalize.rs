use std::collections::BTreeSet;
use std::str::FromStr;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::category::{Category, LabelMapping};
use crate::error::{Error, Result};

/// A column addressed either by position or by header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Index(usize),
    Name(String),
}

impl FromStr for FieldRef {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("field reference must not be empty".to_string());
        }
        match s.parse::<usize>() {
            Ok(index) => Ok(FieldRef::Index(index)),
            Err(_) => Ok(FieldRef::Name(s.to_string())),
        }
    }
}

/// Which input columns play the label and text roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSchema {
    pub label: FieldRef,
    pub text: FieldRef,
}

impl Default for RecordSchema {
    fn default() -> Self {
        RecordSchema {
            label: FieldRef::Index(0),
            text: FieldRef::Index(1),
        }
    }
}

impl RecordSchema {
    /// polarity, title, text
    pub fn three_field() -> Self {
        RecordSchema {
            label: FieldRef::Index(0),
            text: FieldRef::Index(2),
        }
    }

    /// Resolve column names against the header row once, before any record is read.
    pub fn resolve(&self, headers: Option<&StringRecord>) -> Result<ResolvedSchema> {
        Ok(ResolvedSchema {
            label: resolve_field(&self.label, headers)?,
            text: resolve_field(&self.text, headers)?,
        })
    }
}

fn resolve_field(field: &FieldRef, headers: Option<&StringRecord>) -> Result<usize> {
    match field {
        FieldRef::Index(i) => Ok(*i),
        FieldRef::Name(name) => {
            let headers = headers.ok_or_else(|| {
                Error::Config(format!(
                    "field '{name}' is addressed by name but the input has no header row"
                ))
            })?;
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::Config(format!("no column named '{name}' in header")))
        }
    }
}

/// Column positions after header resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub label: usize,
    pub text: usize,
}

impl ResolvedSchema {
    pub fn project<'a>(&self, record: &'a StringRecord) -> RawRecord<'a> {
        RawRecord {
            label: record.get(self.label),
            text: record.get(self.text),
        }
    }
}

/// The two roles of one input row, borrowed from the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawRecord<'a> {
    pub label: Option<&'a str>,
    pub text: Option<&'a str>,
}

impl<'a> RawRecord<'a> {
    pub fn new(label: &'a str, text: &'a str) -> Self {
        RawRecord {
            label: Some(label),
            text: Some(text),
        }
    }
}

pub fn default_header_tokens() -> BTreeSet<String> {
    ["label", "sentiment"].iter().map(|s| s.to_string()).collect()
}

/// Maps raw rows to a category, dropping headers and anything malformed.
#[derive(Debug, Clone)]
pub struct Normalizer {
    mapping: LabelMapping,
    header_tokens: BTreeSet<String>,
    require_text: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(LabelMapping::default(), default_header_tokens(), false)
    }
}

impl Normalizer {
    pub fn new(
        mapping: LabelMapping,
        header_tokens: BTreeSet<String>,
        require_text: bool,
    ) -> Self {
        Normalizer {
            mapping,
            header_tokens: header_tokens.iter().map(|t| t.to_lowercase()).collect(),
            require_text,
        }
    }

    ///Returns the record's category and text, or `None` when the row should be skipped.
    /// # Example
    /// ```
    /// use sentiment_topwords::{Category, Normalizer, RawRecord};
    /// let normalizer = Normalizer::default();
    /// let accepted = normalizer.normalize(&RawRecord::new(" \"2\" ", "great"));
    /// assert_eq!(accepted, Some((Category::Positive, "great")));
    /// assert_eq!(normalizer.normalize(&RawRecord::new("Label", "text")), None);
    /// ```
    pub fn normalize<'a>(&self, record: &RawRecord<'a>) -> Option<(Category, &'a str)> {
        let label = clean_label(record.label?);
        if self.header_tokens.contains(&label.to_lowercase()) {
            return None;
        }
        let code: i64 = label.parse().ok()?;
        let category = self.mapping.category_for(code)?;
        let text = record.text?;
        if self.require_text && text.trim().is_empty() {
            return None;
        }
        Some((category, text))
    }
}

fn clean_label(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
}
