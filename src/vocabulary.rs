//! Term lists backing the custom entity categories.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Default part of speech written for entries of a generated dictionary.
pub const DEFAULT_DICT_TAG: &str = "n";

/// One dictionary line: `term [frequency] [tag]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub term: String,
    /// `None` lets the segmenter estimate a frequency that keeps the term whole.
    pub freq: Option<usize>,
    pub tag: Option<String>,
}

impl DictEntry {
    fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let term = fields.next()?.to_string();
        let mut freq = None;
        let mut tag = None;
        if let Some(second) = fields.next() {
            match second.parse::<usize>() {
                Ok(n) => {
                    freq = Some(n);
                    tag = fields.next().map(String::from);
                }
                Err(_) => tag = Some(second.to_string()),
            }
        }
        Some(Self { term, freq, tag })
    }
}

/// Terms of one custom category, read from a dictionary file with lines of
/// the form `term [frequency] [tag]`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    name: String,
    path: PathBuf,
    entries: Vec<DictEntry>,
    terms: Vec<String>,
    lookup: HashSet<String>,
}

impl Vocabulary {
    /// Load the vocabulary for category `name`.
    ///
    /// A file that does not exist is reported as
    /// [`AnalysisError::MissingVocabulary`] so the caller can skip the category.
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalysisError::MissingVocabulary {
                category: name.to_string(),
                path: path.to_path_buf(),
            });
        }
        let content =
            fs::read_to_string(path).map_err(|e| AnalysisError::io("Read vocabulary", path, e))?;
        Ok(Self::parse(name, path, &content))
    }

    fn parse(name: &str, path: &Path, content: &str) -> Self {
        let mut entries = Vec::new();
        let mut terms = Vec::new();
        let mut lookup = HashSet::new();
        for entry in content.lines().filter_map(DictEntry::parse) {
            if lookup.insert(entry.term.clone()) {
                terms.push(entry.term.clone());
                entries.push(entry);
            }
        }
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            entries,
            terms,
            lookup,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, word: &str) -> bool {
        self.lookup.contains(word)
    }

    /// Dictionary lines in file order, first occurrence of each term only.
    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    /// Distinct terms in file order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Write a custom dictionary usable both by the tagger and by
/// [`Vocabulary::load`]: one `term frequency n` line per entry.
pub fn write_custom_dict<S: AsRef<str>>(entries: &[(S, usize)], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| AnalysisError::io("Create dictionary", path, e))?;
    let mut out = BufWriter::new(file);
    for (term, freq) in entries {
        writeln!(out, "{} {} {}", term.as_ref(), freq, DEFAULT_DICT_TAG)
            .map_err(|e| AnalysisError::io("Write dictionary", path, e))?;
    }
    out.flush()
        .map_err(|e| AnalysisError::io("Write dictionary", path, e))
}
