use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entity::EntityCategory;
use crate::error::{AnalysisError, Result};
use crate::viz::WordCloudOptions;

/// A named custom vocabulary, e.g. `weapon` → `weapon_dict.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularySource {
    pub name: String,
    pub path: PathBuf,
    /// File the extracted table is saved as; `<name>s.txt` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

impl VocabularySource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            output_file: None,
        }
    }

    pub fn with_output_file(mut self, file: impl Into<String>) -> Self {
        self.output_file = Some(file.into());
        self
    }

    /// Parse `NAME=PATH` as given on the command line.
    pub fn parse(value: &str) -> Result<Self> {
        match value.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
                Ok(Self::new(name.trim(), path.trim()))
            }
            _ => Err(AnalysisError::Config(format!(
                "vocabulary must be NAME=PATH, got '{value}'"
            ))),
        }
    }
}

/// Pipeline settings. Every field has a default, so a JSON config file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where entity tables and renderer inputs are written.
    pub output_dir: PathBuf,
    pub person_file: String,
    pub location_file: String,
    pub vocabularies: Vec<VocabularySource>,
    /// Write every extracted entity table as soon as it is computed.
    pub persist_entities: bool,
    /// Let jieba guess unknown words with its HMM.
    pub hmm: bool,
    pub bar_limit: usize,
    pub frequency_top: usize,
    pub word_cloud: WordCloudOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            person_file: "persons.txt".to_string(),
            location_file: "locations.txt".to_string(),
            vocabularies: vec![VocabularySource::new("weapon", "weapon_dict.txt")],
            persist_entities: true,
            hmm: true,
            bar_limit: 15,
            frequency_top: 50,
            word_cloud: WordCloudOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| AnalysisError::io("Read config", path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))
    }

    pub fn vocabulary(&self, name: &str) -> Option<&VocabularySource> {
        self.vocabularies.iter().find(|v| v.name == name)
    }

    /// Add a vocabulary, replacing one with the same name.
    pub fn set_vocabulary(&mut self, source: VocabularySource) {
        match self.vocabularies.iter_mut().find(|v| v.name == source.name) {
            Some(existing) => *existing = source,
            None => self.vocabularies.push(source),
        }
    }

    /// Every category the pipeline knows about, persons and locations first.
    pub fn categories(&self) -> Vec<EntityCategory> {
        let mut all = vec![EntityCategory::Person, EntityCategory::Location];
        all.extend(
            self.vocabularies
                .iter()
                .map(|v| EntityCategory::Vocabulary(v.name.clone())),
        );
        all
    }

    /// File name an extracted category is persisted under.
    pub fn entity_file(&self, category: &EntityCategory) -> String {
        match category {
            EntityCategory::Person => self.person_file.clone(),
            EntityCategory::Location => self.location_file.clone(),
            EntityCategory::Vocabulary(name) => self
                .vocabulary(name)
                .and_then(|v| v.output_file.clone())
                .unwrap_or_else(|| format!("{name}s.txt")),
        }
    }
}
