use std::collections::HashMap;

/// Word counts that remember the order in which words first appeared.
///
/// The first-occurrence order is what makes ranking deterministic: words with
/// equal counts are ranked by which one showed up first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, word: &str) {
        match self.index.get(word) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(word.to_owned(), self.entries.len());
                self.entries.push((word.to_owned(), 1));
            }
        }
    }

    pub fn get(&self, word: &str) -> Option<usize> {
        self.index.get(word).map(|&i| self.entries[i].1)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts, i.e. the length of the counted token sequence.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Entries in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(w, c)| (w.as_str(), *c))
    }

    ///Sort by count descending. Ties keep first-occurrence order because the sort is stable.
    ///`top_n` of `None` or `Some(0)` returns every entry.
    /// # Example
    /// ```
    /// use hanzi_insight::frequency::count;
    /// let tokens: Vec<String> = ["刘备", "关羽", "刘备", "张飞", "刘备"]
    ///     .iter()
    ///     .map(|s| s.to_string())
    ///     .collect();
    /// let table = count(&tokens);
    /// let expected = vec![("刘备".to_string(), 3), ("关羽".to_string(), 1)];
    /// assert_eq!(table.ranked(Some(2)), expected);
    /// ```
    pub fn ranked(&self, top_n: Option<usize>) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(n) = top_n.filter(|&n| n > 0) {
            sorted.truncate(n);
        }
        sorted
    }
}

impl<S: AsRef<str>> FromIterator<S> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for word in iter {
            table.add(word.as_ref());
        }
        table
    }
}

///Counts every token. Returns a [`FrequencyTable`] holding the exact count of each word.
pub fn count<S: AsRef<str>>(tokens: &[S]) -> FrequencyTable {
    tokens.iter().collect()
}

///Counts the tokens and returns the `n` most frequent words (all words for `n == 0`).
pub fn top_n<S: AsRef<str>>(tokens: &[S], n: usize) -> Vec<(String, usize)> {
    count(tokens).ranked(Some(n))
}
