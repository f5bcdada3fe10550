use anyhow::{Result, bail};
use rand::Rng;
use tracing::info;

use crate::corpus::{DocumentIndex, chunk_owner_index};
use crate::model::{ChunkRecord, GenerationCounts, Query};
use crate::semantic::{Embedder, SimilarityBand};
use crate::topic::{DEFAULT_CROSS_DOC_TOPICS, Topic, TopicClassifier};

mod assemble;
mod cross_document;
mod per_document;
mod run;

pub use run::run;

pub use assemble::{CoverageReport, compute_coverage};

use assemble::assemble_query_set;
use cross_document::{CrossDocSettings, select_candidates, synthesize_cross_document_queries};
use per_document::{queries_per_document, synthesize_document_queries};

pub const DEFAULT_NUM_QUERIES: usize = 100;
pub const DEFAULT_CROSS_DOC_QUERIES: usize = 8;
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub num_queries: usize,
    pub cross_doc_queries: usize,
    pub batch_size: usize,
    pub band: SimilarityBand,
    pub cross_doc_topics: Vec<Topic>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            num_queries: DEFAULT_NUM_QUERIES,
            cross_doc_queries: DEFAULT_CROSS_DOC_QUERIES,
            batch_size: DEFAULT_BATCH_SIZE,
            band: SimilarityBand::default(),
            cross_doc_topics: DEFAULT_CROSS_DOC_TOPICS.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuerySetOutcome {
    pub queries: Vec<Query>,
    pub coverage: CoverageReport,
    pub counts: GenerationCounts,
    pub document_topics: Vec<(String, Topic)>,
}

pub fn build_query_set<R: Rng + ?Sized>(
    chunks: &[ChunkRecord],
    classifier: &TopicClassifier,
    embedder: &dyn Embedder,
    options: &GenerationOptions,
    rng: &mut R,
) -> Result<QuerySetOutcome> {
    let index = DocumentIndex::build(chunks, classifier);
    if index.is_empty() {
        bail!("corpus contains no documents");
    }

    let queries_per_doc =
        queries_per_document(options.num_queries, options.cross_doc_queries, index.len());
    info!(
        documents = index.len(),
        chunks = chunks.len(),
        queries_per_doc,
        "documents aggregated"
    );

    let mut per_document = Vec::new();
    for group in index.documents() {
        per_document.extend(synthesize_document_queries(group, queries_per_doc, rng));
    }
    let per_document_queries = per_document.len();

    let candidates = select_candidates(&index, classifier, &options.cross_doc_topics);
    let settings = CrossDocSettings {
        num_queries: options.cross_doc_queries,
        batch_size: options.batch_size,
        band: options.band,
        allowed_topics: &options.cross_doc_topics,
    };
    let cross = synthesize_cross_document_queries(&candidates, embedder, &settings, rng)?;
    info!(
        candidates = cross.candidates,
        attempts = cross.attempts,
        accepted = cross.accepted,
        kept = cross.queries.len(),
        "cross-document synthesis completed"
    );

    let counts_template = GenerationCounts {
        chunks: chunks.len(),
        documents: index.len(),
        queries_per_doc,
        per_document_queries,
        cross_doc_candidates: cross.candidates,
        cross_doc_attempts: cross.attempts,
        cross_doc_accepted: cross.accepted,
        ..GenerationCounts::default()
    };

    let queries = assemble_query_set(per_document, cross.queries, options.num_queries);
    let coverage = compute_coverage(
        &queries,
        &chunk_owner_index(chunks),
        index.documents().iter().map(|group| group.filename.as_str()),
    );

    let document_topics = index
        .documents()
        .iter()
        .map(|group| (group.filename.clone(), group.dominant_topic))
        .collect();

    Ok(QuerySetOutcome {
        counts: GenerationCounts {
            total_queries: queries.len(),
            ..counts_template
        },
        queries,
        coverage,
        document_topics,
    })
}
