use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::semantic::SemanticModelConfig;

// Integers above i64::MAX land in `UInt`; every id is echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkId {
    Int(i64),
    UInt(u64),
    Text(String),
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: ChunkId,
    pub text: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryDraft {
    pub text: String,
    pub relevant: Vec<ChunkId>,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: usize,
    pub text: String,
    pub relevant: Vec<ChunkId>,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileHash {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarityBandConfig {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationCounts {
    pub chunk_files: usize,
    pub chunks: usize,
    pub documents: usize,
    pub queries_per_doc: usize,
    pub per_document_queries: usize,
    pub cross_doc_candidates: usize,
    pub cross_doc_attempts: usize,
    pub cross_doc_accepted: usize,
    pub total_queries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub chunks_dir: String,
    pub output_path: String,
    pub seed: u64,
    pub model: SemanticModelConfig,
    pub similarity_band: SimilarityBandConfig,
    pub cross_doc_topics: Vec<String>,
    pub counts: GenerationCounts,
    pub covered_documents: Vec<String>,
    pub uncovered_documents: Vec<String>,
    pub document_topics: BTreeMap<String, String>,
    pub source_hashes: Vec<SourceFileHash>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInventoryEntry {
    pub filename: String,
    pub chunk_count: usize,
    pub dominant_topic: String,
    pub topic_counts: Vec<TopicCountEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicCountEntry {
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub chunk_file_count: usize,
    pub chunk_count: usize,
    pub document_count: usize,
    pub documents: Vec<DocumentInventoryEntry>,
    pub source_hashes: Vec<SourceFileHash>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub query_set_path: String,
    pub chunks_dir: String,
    pub query_count: usize,
    pub document_count: usize,
    pub covered_document_count: usize,
    pub covered_documents: Vec<String>,
    pub uncovered_documents: Vec<String>,
    pub unresolved_chunk_ids: Vec<ChunkId>,
}
