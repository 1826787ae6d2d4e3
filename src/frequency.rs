use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{Error, Result};

pub type Count = u64;

/// Per-category word counts. Merging is plain pointwise addition, so partial
/// tables can be combined in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    counts: [HashMap<String, Count>; 2],
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    ///Adds `delta` occurrences of `token` to `category`.
    /// # Example
    /// ```
    /// use sentiment_topwords::{Category, FrequencyTable};
    /// let mut table = FrequencyTable::new();
    /// table.accumulate(Category::Negative, "bad", 1).unwrap();
    /// table.accumulate(Category::Negative, "bad", 2).unwrap();
    /// assert_eq!(table.count(Category::Negative, "bad"), 3);
    /// assert_eq!(table.count(Category::Positive, "bad"), 0);
    /// ```
    pub fn accumulate(&mut self, category: Category, token: &str, delta: Count) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let words = &mut self.counts[category.index()];
        match words.get_mut(token) {
            Some(count) => {
                *count = count
                    .checked_add(delta)
                    .ok_or_else(|| overflow(category, token))?;
            }
            None => {
                words.insert(token.to_owned(), delta);
            }
        }
        Ok(())
    }

    /// Folds `other` into `self`. On overflow `self` is left unchanged.
    pub fn merge(&mut self, other: FrequencyTable) -> Result<()> {
        for (category, incoming) in Category::ALL.into_iter().zip(&other.counts) {
            let ours = &self.counts[category.index()];
            let (small, large) = if incoming.len() > ours.len() {
                (ours, incoming)
            } else {
                (incoming, ours)
            };
            for (word, delta) in small {
                if let Some(count) = large.get(word) {
                    if count.checked_add(*delta).is_none() {
                        return Err(overflow(category, word));
                    }
                }
            }
        }
        // every sum below was checked above
        for (category, mut incoming) in Category::ALL.into_iter().zip(other.counts) {
            let ours = &mut self.counts[category.index()];
            // fold the smaller map into the larger one
            if incoming.len() > ours.len() {
                std::mem::swap(ours, &mut incoming);
            }
            for (word, delta) in incoming {
                *ours.entry(word).or_insert(0) += delta;
            }
        }
        Ok(())
    }

    pub fn merged(mut a: FrequencyTable, b: FrequencyTable) -> Result<FrequencyTable> {
        a.merge(b)?;
        Ok(a)
    }

    pub fn count(&self, category: Category, token: &str) -> Count {
        self.counts[category.index()]
            .get(token)
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct tokens seen for `category`.
    pub fn distinct(&self, category: Category) -> usize {
        self.counts[category.index()].len()
    }

    /// Total token occurrences for `category`, or `None` if it does not fit in a `Count`.
    pub fn total(&self, category: Category) -> Option<Count> {
        self.counts[category.index()]
            .values()
            .try_fold(0, |acc: Count, &c| acc.checked_add(c))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(HashMap::is_empty)
    }

    pub fn iter(&self, category: Category) -> impl Iterator<Item = (&str, Count)> {
        self.counts[category.index()]
            .iter()
            .map(|(w, c)| (w.as_str(), *c))
    }

    ///Top `k` words of `category`, by count descending and then word ascending.
    /// # Example
    /// ```
    /// use sentiment_topwords::{Category, FrequencyTable};
    /// let mut table = FrequencyTable::new();
    /// for word in ["service", "bad", "product", "bad"] {
    ///     table.accumulate(Category::Negative, word, 1).unwrap();
    /// }
    /// let ranked = table.rank(Category::Negative, 2);
    /// let top: Vec<(&str, u64)> = ranked
    ///     .iter()
    ///     .map(|e| (e.word.as_str(), e.count))
    ///     .collect();
    /// assert_eq!(top, vec![("bad", 2), ("product", 1)]);
    /// ```
    pub fn rank(&self, category: Category, k: usize) -> RankedList {
        let words = &self.counts[category.index()];
        let mut heap: BinaryHeap<Reverse<Ranked<'_>>> =
            BinaryHeap::with_capacity(k.min(words.len()));
        if k > 0 {
            for (word, &count) in words {
                let candidate = Ranked { word, count };
                if heap.len() < k {
                    heap.push(Reverse(candidate));
                } else if let Some(Reverse(worst)) = heap.peek() {
                    if candidate > *worst {
                        heap.pop();
                        heap.push(Reverse(candidate));
                    }
                }
            }
        }
        // into_sorted_vec is ascending over Reverse, i.e. best first.
        let entries = heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(r)| RankedEntry {
                word: r.word.to_owned(),
                count: r.count,
            })
            .collect();
        RankedList { category, entries }
    }
}

fn overflow(category: Category, token: &str) -> Error {
    Error::CountOverflow {
        category,
        word: token.to_owned(),
    }
}

/// Heap key: greater means ranked higher.
#[derive(Debug, PartialEq, Eq)]
struct Ranked<'a> {
    word: &'a str,
    count: Count,
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.word.cmp(self.word))
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub word: String,
    pub count: Count,
}

/// At most k entries of one category, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedList {
    pub category: Category,
    pub entries: Vec<RankedEntry>,
}

impl RankedList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a RankedEntry;
    type IntoIter = std::slice::Iter<'a, RankedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// How many records each normalized label received, plus the dropped ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub negative: u64,
    pub positive: u64,
    pub rejected: u64,
}

impl RecordStats {
    pub fn record(&mut self, category: Option<Category>) {
        match category {
            Some(Category::Negative) => self.negative += 1,
            Some(Category::Positive) => self.positive += 1,
            None => self.rejected += 1,
        }
    }

    pub fn accepted(&self) -> u64 {
        self.negative + self.positive
    }

    pub fn merge(&mut self, other: RecordStats) {
        self.negative += other.negative;
        self.positive += other.positive;
        self.rejected += other.rejected;
    }
}

/// What one partition of the input produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub table: FrequencyTable,
    pub stats: RecordStats,
}

impl Aggregate {
    pub fn merge(mut self, other: Aggregate) -> Result<Aggregate> {
        self.table.merge(other.table)?;
        self.stats.merge(other.stats);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(Category, &str, Count)]) -> FrequencyTable {
        let mut t = FrequencyTable::new();
        for (c, w, n) in entries {
            t.accumulate(*c, w, *n).unwrap();
        }
        t
    }

    fn pairs(list: &RankedList) -> Vec<(&str, Count)> {
        list.iter().map(|e| (e.word.as_str(), e.count)).collect()
    }

    /// Reference ranking by full sort.
    fn sorted(t: &FrequencyTable, category: Category, k: usize) -> Vec<(String, Count)> {
        let mut all: Vec<(String, Count)> =
            t.iter(category).map(|(w, c)| (w.to_string(), c)).collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.truncate(k);
        all
    }

    #[test]
    fn zero_delta_does_not_create_entries() {
        let t = table(&[(Category::Positive, "ghost", 0)]);
        assert!(t.is_empty());
        assert_eq!(t.distinct(Category::Positive), 0);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut t = table(&[(Category::Negative, "big", Count::MAX)]);
        let err = t.accumulate(Category::Negative, "big", 1).unwrap_err();
        assert!(matches!(err, Error::CountOverflow { category: Category::Negative, .. }));
        assert_eq!(t.count(Category::Negative, "big"), Count::MAX);

        let before = table(&[
            (Category::Negative, "big", Count::MAX),
            (Category::Positive, "kept", 2),
        ]);
        let mut t = before.clone();
        let other = table(&[
            (Category::Negative, "big", 1),
            (Category::Negative, "x", 1),
            (Category::Positive, "kept", 1),
            (Category::Positive, "new", 1),
        ]);
        assert!(matches!(
            t.merge(other),
            Err(Error::CountOverflow { category: Category::Negative, .. })
        ));
        assert_eq!(t, before);
        assert_eq!(t.count(Category::Negative, "big"), Count::MAX);
        assert_eq!(t.count(Category::Negative, "x"), 0);
    }

    #[test]
    fn total_reports_overflow() {
        let t = table(&[
            (Category::Negative, "a", Count::MAX),
            (Category::Negative, "b", 1),
            (Category::Positive, "c", 2),
            (Category::Positive, "d", 3),
        ]);
        assert_eq!(t.total(Category::Negative), None);
        assert_eq!(t.total(Category::Positive), Some(5));
    }

    #[test]
    fn ties_break_by_word() {
        let t = table(&[
            (Category::Positive, "zeta", 2),
            (Category::Positive, "alpha", 2),
            (Category::Positive, "mid", 5),
            (Category::Positive, "beta", 2),
        ]);
        assert_eq!(
            pairs(&t.rank(Category::Positive, 3)),
            vec![("mid", 5), ("alpha", 2), ("beta", 2)]
        );
    }

    #[test]
    fn fewer_than_k_and_empty() {
        let t = table(&[(Category::Negative, "a", 1), (Category::Negative, "b", 3)]);
        assert_eq!(pairs(&t.rank(Category::Negative, 30)), vec![("b", 3), ("a", 1)]);
        assert!(t.rank(Category::Positive, 30).is_empty());
        assert!(t.rank(Category::Negative, 0).is_empty());
    }

    #[test]
    fn heap_matches_full_sort() {
        let mut t = FrequencyTable::new();
        // deterministic pseudo-random counts with plenty of ties
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        for i in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let word = format!("w{}", seed % 97);
            t.accumulate(Category::Negative, &word, (i % 3) + 1).unwrap();
        }
        for k in [0, 1, 5, 30, 96, 97, 200] {
            let ranked: Vec<(String, Count)> = t
                .rank(Category::Negative, k)
                .iter()
                .map(|e| (e.word.clone(), e.count))
                .collect();
            assert_eq!(ranked, sorted(&t, Category::Negative, k), "k = {k}");
        }
    }

    #[test]
    fn top_k_bounded_and_dominant() {
        let t = table(&[
            (Category::Positive, "a", 4),
            (Category::Positive, "b", 1),
            (Category::Positive, "c", 4),
            (Category::Positive, "d", 2),
            (Category::Positive, "e", 9),
        ]);
        let top = t.rank(Category::Positive, 3);
        assert!(top.len() <= 3);
        let min_kept = top.iter().map(|e| e.count).min().unwrap();
        for (word, count) in t.iter(Category::Positive) {
            if !top.iter().any(|e| e.word == word) {
                assert!(count <= min_kept);
            }
        }
        assert!(top.entries.windows(2).all(|w| {
            w[0].count > w[1].count || (w[0].count == w[1].count && w[0].word < w[1].word)
        }));
    }

    #[test]
    fn merge_is_commutative_and_associative() {
        let a = table(&[(Category::Negative, "bad", 2), (Category::Positive, "good", 1)]);
        let b = table(&[(Category::Negative, "bad", 1), (Category::Negative, "meh", 1)]);
        let c = table(&[(Category::Positive, "good", 4), (Category::Positive, "fine", 1)]);

        let ab_c = FrequencyTable::merged(
            FrequencyTable::merged(a.clone(), b.clone()).unwrap(),
            c.clone(),
        )
        .unwrap();
        let a_bc = FrequencyTable::merged(
            a.clone(),
            FrequencyTable::merged(b.clone(), c.clone()).unwrap(),
        )
        .unwrap();
        let cba = FrequencyTable::merged(FrequencyTable::merged(c, b).unwrap(), a).unwrap();

        assert_eq!(ab_c, a_bc);
        assert_eq!(ab_c, cba);
        assert_eq!(ab_c.count(Category::Negative, "bad"), 3);
        assert_eq!(ab_c.count(Category::Positive, "good"), 5);
        assert_eq!(ab_c.total(Category::Positive), Some(6));
    }

    #[test]
    fn stats_merge_and_record() {
        let mut s = RecordStats::default();
        s.record(Some(Category::Negative));
        s.record(None);
        let mut t = RecordStats::default();
        t.record(Some(Category::Positive));
        s.merge(t);
        assert_eq!(
            s,
            RecordStats {
                negative: 1,
                positive: 1,
                rejected: 1
            }
        );
        assert_eq!(s.accepted(), 2);
    }
}
