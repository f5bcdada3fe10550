use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::cli::GenerateArgs;
use crate::corpus::load_chunks;
use crate::model::{GenerationReport, SimilarityBandConfig};
use crate::semantic::{LocalHashEmbedder, SimilarityBand, resolve_model_config};
use crate::topic::{TopicClassifier, resolve_topic_allowlist};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

use super::{GenerationOptions, build_query_set};

pub fn run(args: GenerateArgs) -> Result<()> {
    let started = Instant::now();
    let started_at = now_utc_string();
    let run_id = format!("generate-{}", utc_compact_string(Utc::now()));

    let options = resolve_options(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random::<u64>);
    let model = resolve_model_config(&args.model_id);

    info!(
        run_id = %run_id,
        chunks_dir = %args.chunks_dir.display(),
        num_queries = options.num_queries,
        cross_doc_queries = options.cross_doc_queries,
        seed,
        model_id = %model.model_id,
        "starting query-set generation"
    );

    let corpus = load_chunks(&args.chunks_dir)?;
    let classifier = TopicClassifier::new()?;
    let embedder = LocalHashEmbedder::new(model.clone());
    let mut rng = StdRng::seed_from_u64(seed);

    let outcome = build_query_set(&corpus.chunks, &classifier, &embedder, &options, &mut rng)
        .context("query-set generation failed")?;

    write_json_pretty(&args.output_path, &outcome.queries)?;
    info!(
        path = %args.output_path.display(),
        queries = outcome.queries.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "wrote query set"
    );

    let mut warnings = Vec::<String>::new();
    if outcome.counts.cross_doc_accepted < options.cross_doc_queries {
        warnings.push(format!(
            "only {} of {} requested cross-document queries passed the similarity band",
            outcome.counts.cross_doc_accepted, options.cross_doc_queries
        ));
    }
    if !outcome.coverage.uncovered_documents.is_empty() {
        warn!(
            uncovered = outcome.coverage.uncovered_documents.len(),
            "some documents are not referenced by any query"
        );
        warnings.push(format!(
            "{} documents are not referenced by any query",
            outcome.coverage.uncovered_documents.len()
        ));
    }

    if let Some(report_path) = &args.report_path {
        let mut counts = outcome.counts.clone();
        counts.chunk_files = corpus.files.len();

        let report = GenerationReport {
            manifest_version: 1,
            run_id,
            generated_at: started_at,
            chunks_dir: args.chunks_dir.display().to_string(),
            output_path: args.output_path.display().to_string(),
            seed,
            model,
            similarity_band: SimilarityBandConfig {
                lower: options.band.lower(),
                upper: options.band.upper(),
            },
            cross_doc_topics: options
                .cross_doc_topics
                .iter()
                .map(|topic| topic.as_str().to_string())
                .collect(),
            counts,
            covered_documents: outcome.coverage.covered_documents.iter().cloned().collect(),
            uncovered_documents: outcome
                .coverage
                .uncovered_documents
                .iter()
                .cloned()
                .collect(),
            document_topics: outcome
                .document_topics
                .iter()
                .map(|(filename, topic)| (filename.clone(), topic.as_str().to_string()))
                .collect(),
            source_hashes: corpus.source_hashes()?,
            warnings,
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote generation report");
    }

    println!(
        "Generated {} queries covering {} documents",
        outcome.queries.len(),
        outcome.coverage.covered_count()
    );

    Ok(())
}

pub(super) fn resolve_options(args: &GenerateArgs) -> Result<GenerationOptions> {
    let band = SimilarityBand::new(args.similarity_min, args.similarity_max)
        .context("invalid similarity band")?;
    let cross_doc_topics =
        resolve_topic_allowlist(&args.cross_topics).context("invalid --cross-topic value")?;

    Ok(GenerationOptions {
        num_queries: args.num_queries,
        cross_doc_queries: args.cross_doc_queries,
        batch_size: args.batch_size.max(1),
        band,
        cross_doc_topics,
    })
}
