//! Lazily computed, per-document analysis artifacts.
//!
//! [`Pipeline`] owns the loaded [`Document`] and a [`CacheEntry`] of derived
//! artifacts. Every `ensure_*` call returns the cached artifact when present
//! and computes (then caches) it otherwise, pulling in prerequisite stages on
//! demand. Loading a document throws every cached artifact away.
//!
//! Computation runs outside the lock, so two callers racing on the same empty
//! slot may both compute it; the first result stored wins and both callers get
//! the stored value. A result computed for a document that has been replaced
//! in the meantime is returned to its caller but never cached.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::document::{Document, DocumentId};
use crate::entity::{self, EntityCategory, EntityTable};
use crate::error::{AnalysisError, Result};
use crate::frequency::{self, FrequencyTable};
use crate::tagger::{TaggedToken, Tagger};
use crate::vocabulary::Vocabulary;

/// Derived artifacts of one document. Empty slots have not been computed yet.
#[derive(Debug, Default)]
struct CacheEntry {
    tokens: Option<Arc<Vec<String>>>,
    frequency: Option<Arc<FrequencyTable>>,
    tags: Option<Arc<Vec<TaggedToken>>>,
    entities: BTreeMap<EntityCategory, Arc<EntityTable>>,
}

impl CacheEntry {
    fn invalidate(&mut self) {
        *self = CacheEntry::default();
    }
}

#[derive(Debug, Default)]
struct State {
    document: Option<Arc<Document>>,
    cache: CacheEntry,
}

/// Which slots currently hold a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatus {
    pub document: Option<DocumentId>,
    pub tokens: bool,
    pub frequency: bool,
    pub tags: bool,
    pub entities: Vec<EntityCategory>,
}

/// Result of extracting one category in a batch.
#[derive(Debug)]
pub struct Extraction {
    pub category: EntityCategory,
    pub result: Result<Arc<EntityTable>>,
}

pub struct Pipeline {
    tagger: Arc<dyn Tagger>,
    config: PipelineConfig,
    state: Mutex<State>,
}

impl Pipeline {
    pub fn new(tagger: Arc<dyn Tagger>, config: PipelineConfig) -> Self {
        Self {
            tagger,
            config,
            state: Mutex::new(State::default()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave a half-written slot,
        // every update is a single assignment.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `document` current and drop everything derived from the previous one.
    pub fn load(&self, document: Document) -> DocumentId {
        let id = document.id();
        let mut state = self.lock();
        state.cache.invalidate();
        state.document = Some(Arc::new(document));
        info!("Loaded {id}, analysis cache cleared");
        id
    }

    /// Unload the current document.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.cache.invalidate();
        state.document = None;
    }

    pub fn document(&self) -> Option<Arc<Document>> {
        self.lock().document.clone()
    }

    pub fn current_id(&self) -> Option<DocumentId> {
        self.lock().document.as_ref().map(|d| d.id())
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.lock();
        CacheStatus {
            document: state.document.as_ref().map(|d| d.id()),
            tokens: state.cache.tokens.is_some(),
            frequency: state.cache.frequency.is_some(),
            tags: state.cache.tags.is_some(),
            entities: state.cache.entities.keys().cloned().collect(),
        }
    }

    fn current(&self) -> Result<Arc<Document>> {
        self.document().ok_or(AnalysisError::MissingDocument)
    }

    /// Read a slot of the current document, or return the document to compute it from.
    fn lookup<T>(
        &self,
        slot: impl FnOnce(&CacheEntry) -> Option<Arc<T>>,
    ) -> Result<std::result::Result<Arc<T>, Arc<Document>>> {
        let state = self.lock();
        let document = state.document.clone().ok_or(AnalysisError::MissingDocument)?;
        Ok(slot(&state.cache).ok_or(document))
    }

    /// Store `value` for `document` unless the document was replaced or a
    /// racing request already filled the slot. Returns the value now cached,
    /// or `value` itself when the document is stale.
    fn store<T>(
        &self,
        document: &Document,
        value: T,
        slot: impl FnOnce(&mut CacheEntry) -> &mut Option<Arc<T>>,
    ) -> Arc<T> {
        let mut state = self.lock();
        if state.document.as_ref().map(|d| d.id()) != Some(document.id()) {
            warn!(
                "{} was replaced while it was being analysed; result not cached",
                document.id()
            );
            return Arc::new(value);
        }
        slot(&mut state.cache)
            .get_or_insert_with(|| Arc::new(value))
            .clone()
    }

    /// Word tokens of the current document.
    pub fn ensure_tokens(&self) -> Result<Arc<Vec<String>>> {
        let document = match self.lookup(|c| c.tokens.clone())? {
            Ok(tokens) => return Ok(tokens),
            Err(document) => document,
        };
        let tokens = self.tagger.segment(document.text(), None)?;
        debug!("Segmented {} into {} tokens", document.id(), tokens.len());
        Ok(self.store(&document, tokens, |c| &mut c.tokens))
    }

    /// `(word, tag)` pairs of the current document.
    pub fn ensure_tags(&self) -> Result<Arc<Vec<TaggedToken>>> {
        let document = match self.lookup(|c| c.tags.clone())? {
            Ok(tags) => return Ok(tags),
            Err(document) => document,
        };
        let tagged = self.tagger.tag(document.text())?;
        debug!("Tagged {} tokens of {}", tagged.len(), document.id());
        Ok(self.store(&document, tagged, |c| &mut c.tags))
    }

    /// Full frequency table of the current document.
    pub fn ensure_frequency_table(&self) -> Result<Arc<FrequencyTable>> {
        let document = match self.lookup(|c| c.frequency.clone())? {
            Ok(table) => return Ok(table),
            Err(document) => document,
        };
        let tokens = self.ensure_tokens()?;
        if self.current_id() != Some(document.id()) {
            // tokens may belong to the newer document; start over for it
            return self.ensure_frequency_table();
        }
        let table = frequency::count(&tokens);
        Ok(self.store(&document, table, |c| &mut c.frequency))
    }

    /// Ranked `(word, count)` rows, truncated to `top_n` when given.
    ///
    /// Only the full table is cached; truncation happens on every read.
    pub fn ensure_frequency(&self, top_n: Option<usize>) -> Result<Vec<(String, usize)>> {
        Ok(self.ensure_frequency_table()?.ranked(top_n))
    }

    /// Entity table of one category, persisted on first computation when
    /// `persist_entities` is set. A table of a replaced document is neither
    /// cached nor written.
    pub fn ensure_entities(&self, category: &EntityCategory) -> Result<Arc<EntityTable>> {
        let document = match self.lookup(|c| c.entities.get(category).cloned())? {
            Ok(table) => return Ok(table),
            Err(document) => document,
        };

        let table = match category.tag() {
            Some(tag) => {
                let tagged = self.ensure_tags()?;
                if self.current_id() != Some(document.id()) {
                    return self.ensure_entities(category);
                }
                entity::extract_by_tag(&tagged, category.clone(), tag)
            }
            None => self.extract_vocabulary(&document, category)?,
        };

        // The lock is held across the write: `load` cannot swap the document
        // between the check and the write, and a failed write leaves the slot
        // empty.
        let mut state = self.lock();
        if state.document.as_ref().map(|d| d.id()) != Some(document.id()) {
            warn!(
                "{} was replaced during {category} extraction; result not cached",
                document.id()
            );
            return Ok(Arc::new(table));
        }
        if let Some(cached) = state.cache.entities.get(category) {
            return Ok(Arc::clone(cached));
        }
        if self.config.persist_entities {
            let file = self.config.entity_file(category);
            entity::persist(&table, &self.config.output_dir, &file)?;
        }
        let table = Arc::new(table);
        state.cache.entities.insert(category.clone(), Arc::clone(&table));
        Ok(table)
    }

    fn extract_vocabulary(&self, document: &Document, category: &EntityCategory) -> Result<EntityTable> {
        let name = category.to_string();
        let source = self
            .config
            .vocabulary(&name)
            .ok_or_else(|| AnalysisError::UnknownCategory { category: name.clone() })?;
        let vocabulary = Vocabulary::load(&name, &source.path)?;
        let tokens = self.tagger.segment(document.text(), Some(&vocabulary))?;
        Ok(entity::extract_by_vocabulary(&tokens, &vocabulary))
    }

    /// Extract every configured category. A failing category does not stop
    /// the others; each outcome is reported separately, in configuration order.
    pub fn extract_all(&self) -> Result<Vec<Extraction>> {
        self.current()?;
        let categories = self.config.categories();
        Ok(categories
            .into_par_iter()
            .map(|category| {
                let result = self.ensure_entities(&category);
                if let Err(e) = &result {
                    warn!("Skipping {category}: {e}");
                }
                Extraction { category, result }
            })
            .collect())
    }
}
