use anyhow::{Context, Result, bail};
use rand::Rng;
use rand::seq::index;
use tracing::{debug, info, warn};

use crate::corpus::DocumentIndex;
use crate::model::{ChunkRecord, QueryDraft};
use crate::semantic::{Embedder, SimilarityBand, cosine_similarity};
use crate::topic::{Topic, TopicClassifier};
use crate::util::{document_label, truncate_chars};

pub(super) const CROSS_REFERENCE_CHARS: usize = 100;

pub(super) const DRAWS_PER_QUERY: usize = 2;

#[derive(Debug, Clone)]
pub(super) struct CrossDocCandidate<'a> {
    pub(super) chunk: &'a ChunkRecord,
    pub(super) topic: Topic,
}

#[derive(Debug, Clone, Default)]
pub(super) struct CrossDocOutcome {
    pub(super) queries: Vec<QueryDraft>,
    pub(super) candidates: usize,
    pub(super) attempts: usize,
    pub(super) accepted: usize,
}

pub(super) struct CrossDocSettings<'a> {
    pub(super) num_queries: usize,
    pub(super) batch_size: usize,
    pub(super) band: SimilarityBand,
    pub(super) allowed_topics: &'a [Topic],
}

pub(super) fn select_candidates<'a>(
    index: &'a DocumentIndex,
    classifier: &TopicClassifier,
    allowed_topics: &[Topic],
) -> Vec<CrossDocCandidate<'a>> {
    index
        .documents()
        .iter()
        .flat_map(|group| group.chunks.iter())
        .filter_map(|chunk| {
            let topic = classifier.classify(&chunk.text);
            allowed_topics
                .contains(&topic)
                .then_some(CrossDocCandidate { chunk, topic })
        })
        .collect()
}

pub(super) fn synthesize_cross_document_queries<R: Rng + ?Sized>(
    candidates: &[CrossDocCandidate<'_>],
    embedder: &dyn Embedder,
    settings: &CrossDocSettings<'_>,
    rng: &mut R,
) -> Result<CrossDocOutcome> {
    if settings.num_queries == 0 {
        return Ok(CrossDocOutcome {
            candidates: candidates.len(),
            ..CrossDocOutcome::default()
        });
    }

    if candidates.len() < 2 {
        bail!(
            "cross-document pairing needs at least 2 candidate chunks with topics [{}], found {}",
            settings
                .allowed_topics
                .iter()
                .map(|topic| topic.as_str())
                .collect::<Vec<&str>>()
                .join(", "),
            candidates.len()
        );
    }

    let texts = candidates
        .iter()
        .map(|candidate| candidate.chunk.text.clone())
        .collect::<Vec<String>>();
    let embeddings = embedder
        .embed(&texts, settings.batch_size.max(1))
        .with_context(|| {
            format!(
                "failed to embed {} cross-document candidates with {}",
                texts.len(),
                embedder.model_id()
            )
        })?;
    validate_embeddings(&embeddings, texts.len())?;

    info!(
        model_id = %embedder.model_id(),
        candidates = candidates.len(),
        dimensions = embeddings[0].len(),
        declared_dimensions = embedder.dimensions(),
        "cross-document candidates embedded"
    );

    // Fixed draw budget; rejected draws are not retried.
    let attempts = settings.num_queries.saturating_mul(DRAWS_PER_QUERY);
    let mut queries = Vec::<QueryDraft>::new();

    for attempt in 0..attempts {
        let pair = index::sample(rng, candidates.len(), 2);
        let (first, second) = (pair.index(0), pair.index(1));
        let similarity = cosine_similarity(&embeddings[first], &embeddings[second]);
        let accepted = settings.band.contains(similarity);

        debug!(
            attempt,
            first = %candidates[first].chunk.chunk_id,
            second = %candidates[second].chunk.chunk_id,
            similarity,
            accepted,
            "cross-document pair drawn"
        );

        if accepted {
            queries.push(render_cross_document_query(
                &candidates[first],
                &candidates[second],
            ));
        }
    }

    let accepted = queries.len();
    queries.truncate(settings.num_queries);

    if queries.len() < settings.num_queries {
        warn!(
            requested = settings.num_queries,
            produced = queries.len(),
            attempts,
            lower = settings.band.lower(),
            upper = settings.band.upper(),
            "similarity band rejected too many draws; fewer cross-document queries produced"
        );
    }

    Ok(CrossDocOutcome {
        queries,
        candidates: candidates.len(),
        attempts,
        accepted,
    })
}

fn validate_embeddings(embeddings: &[Vec<f32>], expected: usize) -> Result<()> {
    if embeddings.len() != expected {
        bail!(
            "embedder returned {} vectors for {} texts",
            embeddings.len(),
            expected
        );
    }

    let Some(dimensions) = embeddings.first().map(Vec::len) else {
        return Ok(());
    };
    if dimensions == 0 {
        bail!("embedder returned zero-length vectors");
    }
    if let Some(position) = embeddings.iter().position(|vector| vector.len() != dimensions) {
        bail!(
            "embedder returned a {}-dimensional vector at position {position}, expected {dimensions}",
            embeddings[position].len()
        );
    }

    Ok(())
}

pub(super) fn render_cross_document_query(
    basis: &CrossDocCandidate<'_>,
    implementation: &CrossDocCandidate<'_>,
) -> QueryDraft {
    let basis_doc = document_label(&basis.chunk.filename);
    let implementation_doc = document_label(&implementation.chunk.filename);

    QueryDraft {
        text: format!(
            "Apa hubungan antara {} di {basis_doc} dan {} di {implementation_doc}?",
            basis.topic, implementation.topic
        ),
        relevant: vec![
            basis.chunk.chunk_id.clone(),
            implementation.chunk.chunk_id.clone(),
        ],
        reference: format!(
            "Dasar hukum di {basis_doc}: {}... Pelaksanaan di {implementation_doc}: {}...",
            truncate_chars(&basis.chunk.text, CROSS_REFERENCE_CHARS),
            truncate_chars(&implementation.chunk.text, CROSS_REFERENCE_CHARS)
        ),
    }
}
