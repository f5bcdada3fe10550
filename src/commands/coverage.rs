use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::CoverageArgs;
use crate::commands::generate::{CoverageReport, compute_coverage};
use crate::corpus::{chunk_owner_index, load_chunks};
use crate::model::{ChunkRecord, CoverageManifest, Query};
use crate::util::{now_utc_string, write_json_pretty};

pub fn run(args: CoverageArgs) -> Result<()> {
    let queries = read_query_set(&args.query_set_path)?;
    let corpus = load_chunks(&args.chunks_dir)?;
    let documents = document_names(&corpus.chunks);
    let report = coverage_for(&queries, &corpus.chunks, &documents);

    info!(
        query_set = %args.query_set_path.display(),
        queries = queries.len(),
        documents = documents.len(),
        covered = report.covered_count(),
        "coverage computed"
    );
    for document in &report.uncovered_documents {
        warn!(filename = %document, "document not covered by any query");
    }
    if !report.unresolved_chunk_ids.is_empty() {
        warn!(
            unresolved = report.unresolved_chunk_ids.len(),
            "query set references chunk ids missing from the corpus"
        );
    }

    if let Some(report_path) = &args.report_path {
        let manifest = CoverageManifest {
            manifest_version: 1,
            generated_at: now_utc_string(),
            query_set_path: args.query_set_path.display().to_string(),
            chunks_dir: args.chunks_dir.display().to_string(),
            query_count: queries.len(),
            document_count: documents.len(),
            covered_document_count: report.covered_count(),
            covered_documents: report.covered_documents.iter().cloned().collect(),
            uncovered_documents: report.uncovered_documents.iter().cloned().collect(),
            unresolved_chunk_ids: report.unresolved_chunk_ids.clone(),
        };
        write_json_pretty(report_path, &manifest)?;
        info!(path = %report_path.display(), "wrote coverage report");
    }

    println!(
        "Query set with {} queries covers {} of {} documents",
        queries.len(),
        report.covered_count(),
        documents.len()
    );

    if args.fail_on_unresolved && !report.unresolved_chunk_ids.is_empty() {
        let sample = report
            .unresolved_chunk_ids
            .iter()
            .take(5)
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        bail!(
            "{} chunk ids in {} do not resolve to any document (first: {sample})",
            report.unresolved_chunk_ids.len(),
            args.query_set_path.display()
        );
    }

    Ok(())
}

pub fn read_query_set(path: &Path) -> Result<Vec<Query>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse query set {}", path.display()))
}

fn document_names(chunks: &[ChunkRecord]) -> Vec<String> {
    let mut seen = HashSet::<&str>::new();
    let mut names = Vec::<String>::new();
    for chunk in chunks {
        if seen.insert(chunk.filename.as_str()) {
            names.push(chunk.filename.clone());
        }
    }
    names
}

fn coverage_for(queries: &[Query], chunks: &[ChunkRecord], documents: &[String]) -> CoverageReport {
    compute_coverage(
        queries,
        &chunk_owner_index(chunks),
        documents.iter().map(String::as_str),
    )
}
