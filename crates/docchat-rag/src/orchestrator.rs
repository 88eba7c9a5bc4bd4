//! Session state machine tying ingestion and question answering together.
//!
//! ```text
//! Empty --ingest--> Ingesting --ok--> Ready --ask--> Querying --> Ready
//!                       \--err--> previous state
//! ```
//!
//! The persisted index is only written by the final step of a successful
//! ingestion, so a failed ingestion leaves both the in-memory and the on-disk
//! index as they were.

use std::path::{Path, PathBuf};

use docchat_core::chunker::RecursiveChunker;
use docchat_core::config::Settings;
use docchat_core::extract::extract_corpus;
use docchat_core::traits::{Embedder, Generator};
use docchat_core::types::{Answer, Chunk, Document, IngestReport};
use docchat_core::{Error, ProviderError, Result};
use docchat_vector::VectorIndex;
use tracing::{debug, info, warn};

use crate::retriever::Retriever;
use crate::synthesizer::synthesize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Ingesting,
    Ready,
    Querying,
}

pub struct Orchestrator {
    chunker: RecursiveChunker,
    retriever: Retriever,
    batch_size: usize,
    location: PathBuf,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    index: Option<VectorIndex>,
    state: SessionState,
}

impl Orchestrator {
    /// Build a session and try to load the index at the configured location.
    ///
    /// A missing, unreadable or foreign-model index leaves the session
    /// `Empty`; only invalid settings are an error.
    pub fn open(settings: &Settings, embedder: Box<dyn Embedder>, generator: Box<dyn Generator>) -> Result<Self> {
        settings.validate()?;
        let location = settings.index_location();
        let mut session = Self {
            chunker: RecursiveChunker::new(&settings.chunking)?,
            retriever: Retriever::new(settings.retrieval.top_k, location.clone()),
            batch_size: settings.embedding.batch_size,
            location,
            embedder,
            generator,
            index: None,
            state: SessionState::Empty,
        };
        session.reload();
        Ok(session)
    }

    fn reload(&mut self) {
        match VectorIndex::load(&self.location) {
            Ok(index) if index.embedder_id() != self.embedder.embedder_id() => {
                warn!(
                    indexed = index.embedder_id(),
                    current = self.embedder.embedder_id(),
                    "index was built with a different embedder; ingest again"
                );
            }
            Ok(index) => {
                info!(path = %self.location.display(), entries = index.len(), "index ready");
                self.index = Some(index);
                self.state = SessionState::Ready;
            }
            Err(Error::IndexNotFound(path)) => {
                debug!(path = %path.display(), "no index yet");
            }
            Err(e) => {
                warn!(error = %e, "could not load index; ingest documents to rebuild it");
            }
        }
    }

    pub fn state(&self) -> SessionState { self.state }

    pub fn index(&self) -> Option<&VectorIndex> { self.index.as_ref() }

    pub fn location(&self) -> &Path { &self.location }

    pub fn embedder_id(&self) -> &str { self.embedder.embedder_id() }

    pub fn ingest(&mut self, documents: Vec<Document>) -> Result<IngestReport> {
        self.ingest_with_progress(documents, &mut |_, _| {})
    }

    /// Like [`Orchestrator::ingest`], calling `on_progress(embedded, total)`
    /// after every embedding batch.
    pub fn ingest_with_progress(
        &mut self,
        documents: Vec<Document>,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<IngestReport> {
        let previous = self.state;
        self.state = SessionState::Ingesting;
        match self.build_index(documents, on_progress) {
            Ok((index, report)) => {
                self.index = Some(index);
                self.state = SessionState::Ready;
                info!(
                    documents = report.documents,
                    skipped = report.skipped,
                    chunks = report.chunks,
                    "ingestion complete"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = previous;
                warn!(error = %e, "ingestion failed");
                Err(e)
            }
        }
    }

    fn build_index(
        &self,
        documents: Vec<Document>,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<(VectorIndex, IngestReport)> {
        let extraction = extract_corpus(documents);
        if extraction.text.trim().is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let split = self.chunker.split(&extraction.text);
        let total = split.len();
        // Whitespace-only chunks carry nothing to retrieve; their ordinals are kept.
        let chunks: Vec<Chunk> = split.into_iter().filter(|c| !c.content.trim().is_empty()).collect();
        if chunks.len() < total {
            debug!(dropped = total - chunks.len(), "skipped whitespace-only chunks");
        }
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let report = IngestReport {
            documents: extraction.extracted,
            skipped: extraction.skipped.len(),
            characters: extraction.text.chars().count(),
            chunks: chunks.len(),
        };
        info!(chars = report.characters, chunks = report.chunks, "chunked corpus");

        let embeddings = self.embed_chunks(&chunks, on_progress)?;
        let index = VectorIndex::build(chunks, embeddings, self.embedder.embedder_id());
        index.persist(&self.location)?;
        Ok((index, report))
    }

    fn embed_chunks(&self, chunks: &[Chunk], on_progress: &mut dyn FnMut(usize, usize)) -> Result<Vec<Vec<f32>>> {
        let dim = self.embedder.dim();
        let mut out = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).map_err(Error::EmbeddingProvider)?;
            if embeddings.len() != texts.len() {
                return Err(Error::EmbeddingProvider(ProviderError::Fatal(format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ))));
            }
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dim) {
                return Err(Error::EmbeddingProvider(ProviderError::Fatal(format!(
                    "embedding has dimension {}, expected {dim}",
                    bad.len()
                ))));
            }
            out.extend(embeddings);
            debug!(done = out.len(), total = chunks.len(), "embedded batch");
            on_progress(out.len(), chunks.len());
        }
        Ok(out)
    }

    /// Answer `question` from the loaded index.
    ///
    /// Generation failures come back as a `Failed` answer; retrieval failures
    /// are errors.
    pub fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        if self.index.is_none() {
            return Err(Error::IndexNotFound(self.location.clone()));
        }
        let previous = self.state;
        self.state = SessionState::Querying;
        let result = self.answer(question);
        self.state = previous;
        result
    }

    fn answer(&self, question: &str) -> Result<Answer> {
        let context = self.retriever.retrieve(self.index.as_ref(), self.embedder.as_ref(), question)?;
        match synthesize(&context, question, self.generator.as_ref()) {
            Ok(answer) => Ok(answer),
            Err(e @ Error::Generation(_)) => {
                warn!(error = %e, "generation failed");
                Ok(Answer::failed(e.user_message()))
            }
            Err(e) => Err(e),
        }
    }
}
