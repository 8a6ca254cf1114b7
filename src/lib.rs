#![forbid(unsafe_code)]
//! # hanzi_insight
//!
//! Analysis pipeline for Chinese text: segmentation, part-of-speech tagging,
//! word frequency, entity extraction (persons, locations and custom
//! vocabularies such as weapons) and the data behind bar charts, word clouds
//! and relationship graphs.
//!
//! Tokenizing and tagging are delegated to a [`Tagger`]; the crate ships a
//! jieba-backed one and one for pre-annotated `word/tag` corpora. The
//! [`Pipeline`] caches every derived artifact for the loaded document and
//! computes missing stages on demand.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use hanzi_insight::{Document, EntityCategory, Pipeline, PipelineConfig, PreTaggedTagger};
//!
//! let config = PipelineConfig { persist_entities: false, ..PipelineConfig::default() };
//! let pipeline = Pipeline::new(Arc::new(PreTaggedTagger), config);
//! pipeline.load(Document::from_text("刘备/nr 与/p 关羽/nr 至/v 荆州/ns 刘备/nr"));
//!
//! let top = pipeline.ensure_frequency(Some(1)).unwrap();
//! assert_eq!(top, vec![("刘备".to_string(), 2)]);
//!
//! let people = pipeline.ensure_entities(&EntityCategory::Person).unwrap();
//! assert_eq!(people.entries[1], ("关羽".to_string(), 1));
//! ```

pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod frequency;
pub mod pipeline;
pub mod sink;
pub mod tagger;
pub mod viz;
pub mod vocabulary;
pub mod worker;

pub use config::{PipelineConfig, VocabularySource};
pub use document::{Document, DocumentId};
pub use entity::{EntityCategory, EntityTable};
pub use error::{AnalysisError, Result};
pub use frequency::FrequencyTable;
pub use pipeline::{CacheStatus, Extraction, Pipeline};
pub use tagger::{JiebaTagger, PreTaggedTagger, TaggedToken, Tagger, tags};
pub use vocabulary::Vocabulary;
pub use worker::{Completion, Dispatcher, Outcome, Request};

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Collect the `.txt` files under `path`, sorted. A file path is returned as is.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case("txt"))
        })
        .collect();
    files.sort();
    files
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| AnalysisError::io("Create directory", dir, e))
}
