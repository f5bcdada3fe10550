use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{ChunkId, Query, QueryDraft};

pub fn assemble_query_set(
    per_document: Vec<QueryDraft>,
    cross_document: Vec<QueryDraft>,
    target: usize,
) -> Vec<Query> {
    per_document
        .into_iter()
        .chain(cross_document)
        .take(target)
        .enumerate()
        .map(|(position, draft)| Query {
            id: position + 1,
            text: draft.text,
            relevant: draft.relevant,
            reference: draft.reference,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub covered_documents: BTreeSet<String>,
    pub uncovered_documents: BTreeSet<String>,
    pub unresolved_chunk_ids: Vec<ChunkId>,
}

impl CoverageReport {
    pub fn covered_count(&self) -> usize {
        self.covered_documents.len()
    }
}

pub fn compute_coverage<'a>(
    queries: &[Query],
    owners: &HashMap<ChunkId, String>,
    documents: impl IntoIterator<Item = &'a str>,
) -> CoverageReport {
    let mut covered_documents = BTreeSet::<String>::new();
    let mut unresolved_chunk_ids = Vec::<ChunkId>::new();
    let mut unresolved_seen = HashSet::<ChunkId>::new();

    for query in queries {
        for chunk_id in &query.relevant {
            match owners.get(chunk_id) {
                Some(filename) => {
                    covered_documents.insert(filename.clone());
                }
                None => {
                    if unresolved_seen.insert(chunk_id.clone()) {
                        unresolved_chunk_ids.push(chunk_id.clone());
                    }
                }
            }
        }
    }

    let uncovered_documents = documents
        .into_iter()
        .filter(|document| !covered_documents.contains(*document))
        .map(ToOwned::to_owned)
        .collect::<BTreeSet<String>>();

    CoverageReport {
        covered_documents,
        uncovered_documents,
        unresolved_chunk_ids,
    }
}
