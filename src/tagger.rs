//! Segmentation and part-of-speech tagging capability.
//!
//! The pipeline never tokenizes text itself: it asks a [`Tagger`] for word
//! tokens and `(word, tag)` pairs. Two adapters are provided, one backed by
//! `jieba-rs` and one reading corpora that are already annotated as
//! `word/tag` tokens.

use jieba_rs::Jieba;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::vocabulary::Vocabulary;

/// Reserved tag values of the jieba / ICTCLAS tagset that the entity
/// extractor depends on. Every other tag is passed through untouched.
pub mod tags {
    /// Person name (`nr`).
    pub const PERSON: &str = "nr";
    /// Place name (`ns`).
    pub const LOCATION: &str = "ns";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }
}

/// External segmentation/tagging capability.
///
/// Implementations are shared between worker threads, hence `Send + Sync`.
/// Calls may take time proportional to the text length.
pub trait Tagger: Send + Sync {
    /// Split `text` into word tokens. Terms of `vocabulary`, when given, are
    /// kept whole.
    fn segment(&self, text: &str, vocabulary: Option<&Vocabulary>) -> Result<Vec<String>>;

    /// Split `text` into tokens annotated with their part of speech.
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>>;
}

/// [`Tagger`] backed by the jieba dictionary and HMM.
pub struct JiebaTagger {
    jieba: Jieba,
    hmm: bool,
}

impl JiebaTagger {
    pub fn new(hmm: bool) -> Self {
        Self {
            jieba: Jieba::new(),
            hmm,
        }
    }

    /// Fresh jieba instance with the terms of `vocabulary` added on top of the
    /// default dictionary. The shared instance stays untouched, so a
    /// vocabulary never leaks into unrelated segmentations.
    ///
    /// Terms without a frequency get one suggested by jieba, high enough to
    /// keep the term in one piece.
    fn with_user_dict(vocabulary: &Vocabulary) -> Jieba {
        let mut jieba = Jieba::new();
        for entry in vocabulary.entries() {
            jieba.add_word(&entry.term, entry.freq, entry.tag.as_deref());
        }
        debug!(
            "Added {} terms of {} to the dictionary",
            vocabulary.len(),
            vocabulary.path().display()
        );
        jieba
    }
}

impl Default for JiebaTagger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Tagger for JiebaTagger {
    fn segment(&self, text: &str, vocabulary: Option<&Vocabulary>) -> Result<Vec<String>> {
        let words = match vocabulary {
            Some(vocabulary) => {
                let jieba = Self::with_user_dict(vocabulary);
                keep_words(jieba.cut(text, self.hmm))
            }
            None => keep_words(self.jieba.cut(text, self.hmm)),
        };
        Ok(words)
    }

    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        Ok(self
            .jieba
            .tag(text, self.hmm)
            .into_iter()
            .filter(|t| !t.word.trim().is_empty())
            .map(|t| TaggedToken::new(t.word, t.tag))
            .collect())
    }
}

fn keep_words(words: Vec<&str>) -> Vec<String> {
    words
        .into_iter()
        .filter(|w| !w.trim().is_empty())
        .map(String::from)
        .collect()
}

/// [`Tagger`] for text that is already segmented and annotated, e.g.
/// `刘备/nr 与/p 关羽/nr 在/p 荆州/ns`.
///
/// Tokens are separated by whitespace. The tag follows the last `/`; a token
/// without one gets the tag `x`. Segmenting drops the tags; any vocabulary is
/// ignored because the segmentation is fixed by the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreTaggedTagger;

impl PreTaggedTagger {
    fn split(token: &str) -> (&str, &str) {
        match token.rsplit_once('/') {
            Some((word, tag)) if !word.is_empty() && !tag.is_empty() => (word, tag),
            _ => (token, "x"),
        }
    }
}

impl Tagger for PreTaggedTagger {
    fn segment(&self, text: &str, _vocabulary: Option<&Vocabulary>) -> Result<Vec<String>> {
        Ok(text
            .split_whitespace()
            .map(|t| Self::split(t).0.to_string())
            .collect())
    }

    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>> {
        Ok(text
            .split_whitespace()
            .map(|t| {
                let (word, tag) = Self::split(t);
                TaggedToken::new(word, tag)
            })
            .collect())
    }
}
