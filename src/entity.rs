//! Entity extraction: per-category frequency tables.

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frequency::FrequencyTable;
use crate::sink;
use crate::tagger::{TaggedToken, tags};
use crate::vocabulary::Vocabulary;

/// What kind of entity a table holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Person,
    Location,
    /// Terms of a named custom vocabulary, e.g. `weapon`.
    Vocabulary(String),
}

impl EntityCategory {
    /// The reserved tag selecting this category, `None` for vocabularies.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            EntityCategory::Person => Some(tags::PERSON),
            EntityCategory::Location => Some(tags::LOCATION),
            EntityCategory::Vocabulary(_) => None,
        }
    }

    /// Parse a command-line category name. Anything other than `person` /
    /// `location` names a vocabulary.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "person" | "persons" | "name" | "names" => EntityCategory::Person,
            "location" | "locations" => EntityCategory::Location,
            _ => EntityCategory::Vocabulary(name.to_string()),
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityCategory::Person => f.write_str("person"),
            EntityCategory::Location => f.write_str("location"),
            EntityCategory::Vocabulary(name) => f.write_str(name),
        }
    }
}

/// Ranked counts of one category: count descending, ties by first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityTable {
    pub category: EntityCategory,
    pub entries: Vec<(String, usize)>,
}

impl EntityTable {
    fn ranked(category: EntityCategory, table: &FrequencyTable) -> Self {
        Self {
            category,
            entries: table.ranked(None),
        }
    }

    pub fn get(&self, word: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, c)| *c)
    }

    pub fn top(&self, n: usize) -> &[(String, usize)] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Select the words tagged exactly `tag` and count them.
///
/// Used for [`EntityCategory::Person`] and [`EntityCategory::Location`]; a word
/// spelled like a person elsewhere but tagged differently here is not counted.
pub fn extract_by_tag(tagged: &[TaggedToken], category: EntityCategory, tag: &str) -> EntityTable {
    let counts: FrequencyTable = tagged
        .iter()
        .filter(|t| t.tag == tag)
        .map(|t| t.word.as_str())
        .collect();
    EntityTable::ranked(category, &counts)
}

/// Count the tokens that are terms of `vocabulary`.
///
/// `tokens` should come from segmenting with the vocabulary loaded as custom
/// dictionary, otherwise multi-character terms may have been split.
pub fn extract_by_vocabulary<S: AsRef<str>>(tokens: &[S], vocabulary: &Vocabulary) -> EntityTable {
    let counts: FrequencyTable = tokens
        .iter()
        .filter_map(|w| {
            let w: &str = w.as_ref();
            vocabulary.contains(w).then_some(w)
        })
        .collect();
    EntityTable::ranked(
        EntityCategory::Vocabulary(vocabulary.name().to_string()),
        &counts,
    )
}

/// Write an extracted table to `dir/file_name` and return the path.
pub fn persist(table: &EntityTable, dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    sink::save(&table.entries, &path)?;
    info!(
        "Saved {} {} entities to {}",
        table.len(),
        table.category,
        path.display()
    );
    Ok(path)
}
