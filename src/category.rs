use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentiment class derived from a numeric review label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Negative,
    Positive,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Category; 2] = [Category::Negative, Category::Positive];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Negative => "negative",
            Category::Positive => "positive",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Negative => 0,
            Category::Positive => 1,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "negative" => Ok(Category::Negative),
            "positive" => Ok(Category::Positive),
            other => Err(format!("unknown sentiment '{other}'")),
        }
    }
}

/// Numeric label codes for each category. Any other code yields no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelMapping {
    pub negative: i64,
    pub positive: i64,
}

impl Default for LabelMapping {
    fn default() -> Self {
        LabelMapping {
            negative: 1,
            positive: 2,
        }
    }
}

impl LabelMapping {
    ///Map a parsed label code to its category.
    /// # Example
    /// ```
    /// use sentiment_topwords::{Category, LabelMapping};
    /// let mapping = LabelMapping::default();
    /// assert_eq!(mapping.category_for(1), Some(Category::Negative));
    /// assert_eq!(mapping.category_for(2), Some(Category::Positive));
    /// assert_eq!(mapping.category_for(3), None);
    /// ```
    pub fn category_for(&self, code: i64) -> Option<Category> {
        if code == self.negative {
            Some(Category::Negative)
        } else if code == self.positive {
            Some(Category::Positive)
        } else {
            None
        }
    }
}
