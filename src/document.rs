use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{info, warn};
use whatlang::Lang;

use crate::error::{AnalysisError, Result};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a loaded document. Every load gets a fresh id, even when the
/// same file is opened twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        DocumentId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Raw text under analysis. Immutable once created; loading another text
/// creates a new `Document`.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    text: String,
    source: Option<PathBuf>,
    language: Option<Lang>,
}

impl Document {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::build(text.into(), None)
    }

    /// Read a UTF-8 text file.
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| AnalysisError::io("Read", path, e))?;
        info!("Loaded {} ({} chars)", path.display(), text.chars().count());
        Ok(Self::build(text, Some(path.to_path_buf())))
    }

    fn build(text: String, source: Option<PathBuf>) -> Self {
        let language = whatlang::detect(&text).map(|info| info.lang());
        if let Some(lang) = language {
            if lang != Lang::Cmn {
                warn!(
                    "Document looks like {} rather than Chinese; segmentation may be poor",
                    lang.eng_name()
                );
            }
        }
        Self {
            id: DocumentId::next(),
            text,
            source,
            language,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Best-effort language detection result, `None` for empty or ambiguous text.
    pub fn language(&self) -> Option<Lang> {
        self.language
    }

    /// File stem used to name reports, `"text"` for in-memory documents.
    pub fn stem(&self) -> String {
        self.source
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "text".to_string())
    }

    /// First `chars` characters, for previews.
    pub fn preview(&self, chars: usize) -> &str {
        match self.text.char_indices().nth(chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}
