//! Off-thread execution of pipeline requests.
//!
//! The owner of a [`Dispatcher`] is the coordinating context: it submits
//! requests, which run on the rayon pool, and receives completions on its own
//! thread through [`Dispatcher::recv`]. Completions for a document that is no
//! longer loaded are dropped there, so a slow request can never overwrite the
//! results of a newer document. Every other completion is delivered exactly
//! once, including those that arrive while [`Dispatcher::run_blocking`] waits
//! for its own.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::document::{Document, DocumentId};
use crate::entity::{EntityCategory, EntityTable};
use crate::error::Result;
use crate::pipeline::{Extraction, Pipeline};
use crate::tagger::TaggedToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Tokens,
    Frequency { top_n: Option<usize> },
    Tags,
    Entities(EntityCategory),
    AllEntities,
}

#[derive(Debug)]
pub enum Outcome {
    Tokens(Arc<Vec<String>>),
    Frequency(Vec<(String, usize)>),
    Tags(Arc<Vec<TaggedToken>>),
    Entities(Arc<EntityTable>),
    AllEntities(Vec<Extraction>),
}

#[derive(Debug)]
pub struct Completion {
    /// Document the request was submitted for, `None` if nothing was loaded.
    pub document: Option<DocumentId>,
    pub request: Request,
    pub result: Result<Outcome>,
    ticket: u64,
}

pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    next_ticket: AtomicU64,
    /// Completions received by `run_blocking` on behalf of other submissions.
    pending: Mutex<VecDeque<Completion>>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            pipeline,
            tx,
            rx,
            next_ticket: AtomicU64::new(0),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Load a document. Completions of requests submitted for the previous
    /// document will be discarded.
    pub fn load(&self, document: Document) -> DocumentId {
        self.pipeline.load(document)
    }

    /// Run `request` against the current document on a worker thread.
    ///
    /// Returns the id of the document the request was submitted for, or
    /// `None` when nothing is loaded; in that case the completion carries
    /// `MissingDocument` and is delivered like any other.
    pub fn submit(&self, request: Request) -> Option<DocumentId> {
        self.dispatch(request).0
    }

    fn dispatch(&self, request: Request) -> (Option<DocumentId>, u64) {
        let current = self.pipeline.current_id();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.tx.clone();
        rayon::spawn(move || {
            let result = run(&pipeline, &request);
            let completion = Completion {
                document: current,
                request,
                result,
                ticket,
            };
            // receiver gone means the coordinator shut down; nothing to deliver to
            let _ = tx.send(completion);
        });
        (current, ticket)
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<Completion>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Oldest held-back completion for the current document, dropping stale ones.
    fn pop_pending(&self) -> Option<Completion> {
        let mut pending = self.pending();
        while let Some(completion) = pending.pop_front() {
            if self.is_current(&completion) {
                return Some(completion);
            }
        }
        None
    }

    /// Block until the next completion for the current document arrives.
    pub fn recv(&self) -> Option<Completion> {
        if let Some(completion) = self.pop_pending() {
            return Some(completion);
        }
        loop {
            let completion = self.rx.recv().ok()?;
            if self.is_current(&completion) {
                return Some(completion);
            }
        }
    }

    /// Next pending completion for the current document, without blocking.
    pub fn try_recv(&self) -> Option<Completion> {
        if let Some(completion) = self.pop_pending() {
            return Some(completion);
        }
        loop {
            match self.rx.try_recv() {
                Ok(completion) if self.is_current(&completion) => return Some(completion),
                Ok(_) => continue,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Submit and wait for this submission's completion. Completions of
    /// other submissions that arrive first stay queued for `recv`/`try_recv`.
    pub fn run_blocking(&self, request: Request) -> Option<Completion> {
        let (_, ticket) = self.dispatch(request);
        loop {
            let completion = self.rx.recv().ok()?;
            if completion.ticket == ticket {
                // a stale document still yields None, like recv
                return self.is_current(&completion).then_some(completion);
            }
            if self.is_current(&completion) {
                self.pending().push_back(completion);
            }
        }
    }

    fn is_current(&self, completion: &Completion) -> bool {
        let current = self.pipeline.current_id();
        if completion.document != current {
            debug!(
                "Discarding {:?} result of {:?} (current: {:?})",
                completion.request, completion.document, current
            );
            return false;
        }
        true
    }
}

fn run(pipeline: &Pipeline, request: &Request) -> Result<Outcome> {
    Ok(match request {
        Request::Tokens => Outcome::Tokens(pipeline.ensure_tokens()?),
        Request::Frequency { top_n } => Outcome::Frequency(pipeline.ensure_frequency(*top_n)?),
        Request::Tags => Outcome::Tags(pipeline.ensure_tags()?),
        Request::Entities(category) => Outcome::Entities(pipeline.ensure_entities(category)?),
        Request::AllEntities => Outcome::AllEntities(pipeline.extract_all()?),
    })
}
