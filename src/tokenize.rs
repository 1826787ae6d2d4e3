use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which characters may appear inside a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordChars {
    /// Letters, digits and underscore (any script).
    #[default]
    Word,
    /// ASCII letters only.
    Letters,
}

impl WordChars {
    fn contains(self, c: char) -> bool {
        match self {
            WordChars::Word => c.is_alphanumeric() || c == '_',
            WordChars::Letters => c.is_ascii_alphabetic(),
        }
    }
}

/// Splits review text into lowercase word tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    word_chars: WordChars,
    min_token_length: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new(WordChars::Word, 1)
    }
}

impl Tokenizer {
    pub fn new(word_chars: WordChars, min_token_length: usize) -> Self {
        Tokenizer {
            word_chars,
            min_token_length: min_token_length.max(1),
        }
    }

    ///Lazily yields the tokens of `text`. Repeated words are yielded every time.
    /// # Example
    /// ```
    /// use sentiment_topwords::{Tokenizer, WordChars};
    /// let words: Vec<String> = Tokenizer::default().tokenize("It's GREAT, 10/10!").collect();
    /// assert_eq!(words, vec!["it", "s", "great", "10", "10"]);
    ///
    /// let strict = Tokenizer::new(WordChars::Letters, 2);
    /// let words: Vec<String> = strict.tokenize("It's GREAT, 10/10!").collect();
    /// assert_eq!(words, vec!["it", "great"]);
    /// ```
    pub fn tokenize(&self, text: &str) -> Tokens {
        Tokens {
            text: text.to_lowercase(),
            pos: 0,
            word_chars: self.word_chars,
            min_token_length: self.min_token_length,
        }
    }
}

/// Iterator returned by [`Tokenizer::tokenize`].
#[derive(Debug, Clone)]
pub struct Tokens {
    text: String,
    pos: usize,
    word_chars: WordChars,
    min_token_length: usize,
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            let Some(start) = rest.find(|c: char| self.word_chars.contains(c)) else {
                self.pos = self.text.len();
                return None;
            };
            let run = &rest[start..];
            let end = run
                .find(|c: char| !self.word_chars.contains(c))
                .unwrap_or(run.len());
            let word = &run[..end];
            self.pos += start + end;
            if word.chars().count() >= self.min_token_length {
                return Some(word.to_string());
            }
        }
        None
    }
}
