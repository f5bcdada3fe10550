use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::model::{ChunkId, ChunkRecord, SourceFileHash};
use crate::topic::{Topic, TopicClassifier};
use crate::util::sha256_file;

#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub files: Vec<PathBuf>,
    pub chunks: Vec<ChunkRecord>,
}

impl LoadedCorpus {
    pub fn source_hashes(&self) -> Result<Vec<SourceFileHash>> {
        self.files
            .iter()
            .map(|path| {
                Ok(SourceFileHash {
                    path: path.display().to_string(),
                    sha256: sha256_file(path)?,
                })
            })
            .collect()
    }
}

pub fn load_chunks(chunks_dir: &Path) -> Result<LoadedCorpus> {
    let files = discover_chunk_files(chunks_dir)?;
    if files.is_empty() {
        bail!("no *.json chunk files found in {}", chunks_dir.display());
    }

    let mut chunks = Vec::<ChunkRecord>::new();
    for path in &files {
        let records = read_chunk_file(path)?;
        info!(path = %path.display(), chunks = records.len(), "loaded chunk file");
        chunks.extend(records);
    }

    info!(
        chunks_dir = %chunks_dir.display(),
        files = files.len(),
        chunks = chunks.len(),
        "corpus loaded"
    );

    Ok(LoadedCorpus { files, chunks })
}

fn discover_chunk_files(chunks_dir: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(chunks_dir)
        .with_context(|| format!("failed to read chunks folder {}", chunks_dir.display()))?;
    if !metadata.is_dir() {
        bail!("chunks path is not a directory: {}", chunks_dir.display());
    }

    let pattern = chunks_dir.join("*.json");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("invalid UTF-8 in chunks folder path: {}", chunks_dir.display()))?;

    let mut files = Vec::<PathBuf>::new();
    for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
        let path = entry.with_context(|| format!("failed to read entry in {}", chunks_dir.display()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

pub fn read_chunk_file(path: &Path) -> Result<Vec<ChunkRecord>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let values: Vec<serde_json::Value> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {} as a JSON array", path.display()))?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<ChunkRecord>(value)
                .with_context(|| format!("invalid chunk record {index} in {}", path.display()))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct DocumentGroup {
    pub filename: String,
    pub chunks: Vec<ChunkRecord>,
    pub topic_counts: Vec<(Topic, usize)>,
    pub dominant_topic: Topic,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    documents: Vec<DocumentGroup>,
}

impl DocumentIndex {
    pub fn build(chunks: &[ChunkRecord], classifier: &TopicClassifier) -> Self {
        let mut positions = HashMap::<String, usize>::new();
        let mut documents = Vec::<DocumentGroup>::new();

        for chunk in chunks {
            let position = *positions.entry(chunk.filename.clone()).or_insert_with(|| {
                documents.push(DocumentGroup {
                    filename: chunk.filename.clone(),
                    chunks: Vec::new(),
                    topic_counts: Vec::new(),
                    dominant_topic: Topic::Lainnya,
                });
                documents.len() - 1
            });

            let group = &mut documents[position];
            group.chunks.push(chunk.clone());

            let topic = classifier.classify(&chunk.text);
            match group
                .topic_counts
                .iter_mut()
                .find(|(seen, _)| *seen == topic)
            {
                Some((_, count)) => *count += 1,
                None => group.topic_counts.push((topic, 1)),
            }
        }

        for group in &mut documents {
            group.dominant_topic = dominant_topic(&group.topic_counts);
            if !has_topic_keywords(&group.topic_counts) {
                warn!(filename = %group.filename, "document has no topic keywords; using lainnya");
            } else if group.dominant_topic == Topic::Lainnya {
                debug!(
                    filename = %group.filename,
                    "most chunks match no topic keywords; using lainnya"
                );
            }
        }

        Self { documents }
    }

    pub fn documents(&self) -> &[DocumentGroup] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Topic with the highest tally; ties go to the topic seen first.
pub fn dominant_topic(topic_counts: &[(Topic, usize)]) -> Topic {
    let mut best: Option<(Topic, usize)> = None;
    for (topic, count) in topic_counts {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((*topic, *count)),
        }
    }
    best.map(|(topic, _)| topic).unwrap_or(Topic::Lainnya)
}

fn has_topic_keywords(topic_counts: &[(Topic, usize)]) -> bool {
    topic_counts.iter().any(|(topic, _)| *topic != Topic::Lainnya)
}

pub fn chunk_owner_index(chunks: &[ChunkRecord]) -> HashMap<ChunkId, String> {
    let mut owners = HashMap::<ChunkId, String>::with_capacity(chunks.len());
    for chunk in chunks {
        owners
            .entry(chunk.chunk_id.clone())
            .or_insert_with(|| chunk.filename.clone());
    }
    owners
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: i64, text: &str, filename: &str) -> ChunkRecord {
        ChunkRecord {
            chunk_id: ChunkId::Int(id),
            text: text.to_string(),
            filename: filename.to_string(),
        }
    }

    fn classifier() -> TopicClassifier {
        TopicClassifier::new().expect("keyword table should compile")
    }

    #[test]
    fn load_chunks_reads_every_json_array_in_sorted_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("b.json"),
            r#"[{"chunk_id": "b-1", "text": "Pajak reklame", "filename": "B.pdf"}]"#,
        )
        .expect("write b");
        fs::write(
            dir.path().join("a.json"),
            r#"[
                {"chunk_id": 1, "text": "Izin bangunan", "filename": "A.pdf", "page": 3},
                {"chunk_id": 2, "text": "Retribusi pasar", "filename": "A.pdf"}
            ]"#,
        )
        .expect("write a");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");

        let corpus = load_chunks(dir.path()).expect("corpus loads");
        assert_eq!(corpus.files.len(), 2);
        assert_eq!(corpus.chunks.len(), 3);
        assert_eq!(corpus.chunks[0].chunk_id, ChunkId::Int(1));
        assert_eq!(corpus.chunks[2].chunk_id, ChunkId::Text("b-1".to_string()));
        assert_eq!(corpus.source_hashes().expect("hashes").len(), 2);
    }

    #[test]
    fn load_chunks_fails_on_missing_field_naming_the_record() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("broken.json"),
            r#"[{"chunk_id": 1, "text": "ok", "filename": "A.pdf"}, {"chunk_id": 2, "text": "no filename"}]"#,
        )
        .expect("write broken");

        let err = load_chunks(dir.path()).expect_err("missing filename must fail");
        let message = format!("{err:#}");
        assert!(message.contains("invalid chunk record 1"), "{message}");
        assert!(message.contains("broken.json"), "{message}");
    }

    #[test]
    fn load_chunks_fails_on_missing_or_empty_folder() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(load_chunks(&dir.path().join("absent")).is_err());
        assert!(load_chunks(dir.path()).is_err());
    }

    #[test]
    fn build_groups_by_filename_in_first_seen_order() {
        let chunks = vec![
            chunk(1, "Objek pajak hotel", "Z.pdf"),
            chunk(2, "Persetujuan bangunan gedung", "A.pdf"),
            chunk(3, "Pajak parkir", "Z.pdf"),
        ];
        let index = DocumentIndex::build(&chunks, &classifier());

        let names = index
            .documents()
            .iter()
            .map(|group| group.filename.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(names, vec!["Z.pdf", "A.pdf"]);
        assert_eq!(index.documents()[0].chunks.len(), 2);
        assert_eq!(index.documents()[0].dominant_topic, Topic::Pajak);
        assert_eq!(index.documents()[1].dominant_topic, Topic::Izin);
        assert_eq!(index.documents()[0].topic_counts, vec![(Topic::Pajak, 2)]);
    }

    #[test]
    fn dominant_topic_prefers_majority_then_first_seen() {
        assert_eq!(
            dominant_topic(&[(Topic::Sanksi, 1), (Topic::Pajak, 3), (Topic::Izin, 2)]),
            Topic::Pajak
        );
        assert_eq!(
            dominant_topic(&[(Topic::Hukum, 2), (Topic::Pajak, 2)]),
            Topic::Hukum
        );
        assert_eq!(dominant_topic(&[]), Topic::Lainnya);
    }

    #[test]
    fn document_without_keywords_defaults_to_lainnya() {
        let chunks = vec![chunk(1, "Cukup jelas.", "X.pdf"), chunk(2, "Cukup jelas.", "X.pdf")];
        let index = DocumentIndex::build(&chunks, &classifier());
        assert_eq!(index.len(), 1);
        assert_eq!(index.documents()[0].dominant_topic, Topic::Lainnya);
    }

    #[test]
    fn lainnya_majority_still_counts_as_keyword_match() {
        let chunks = vec![
            chunk(1, "Cukup jelas.", "X.pdf"),
            chunk(2, "Cukup jelas.", "X.pdf"),
            chunk(3, "Pajak parkir", "X.pdf"),
        ];
        let index = DocumentIndex::build(&chunks, &classifier());
        let group = &index.documents()[0];
        assert_eq!(group.dominant_topic, Topic::Lainnya);
        assert!(has_topic_keywords(&group.topic_counts));

        let bare = DocumentIndex::build(&chunks[..2], &classifier());
        assert!(!has_topic_keywords(&bare.documents()[0].topic_counts));
    }

    #[test]
    fn load_chunks_keeps_integer_ids_beyond_i64() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("a.json"),
            r#"[
                {"chunk_id": 18446744073709551615, "text": "pajak", "filename": "A.pdf"},
                {"chunk_id": -3, "text": "izin", "filename": "A.pdf"}
            ]"#,
        )
        .expect("write a");

        let corpus = load_chunks(dir.path()).expect("large ids load");
        assert_eq!(corpus.chunks[0].chunk_id, ChunkId::UInt(u64::MAX));
        assert_eq!(corpus.chunks[1].chunk_id, ChunkId::Int(-3));
        assert_eq!(
            serde_json::to_string(&corpus.chunks[0].chunk_id).expect("serialize"),
            "18446744073709551615"
        );
        assert_eq!(corpus.chunks[0].chunk_id.to_string(), "18446744073709551615");
    }

    #[test]
    fn chunk_owner_index_keeps_first_owner_of_duplicate_ids() {
        let chunks = vec![chunk(1, "a", "A.pdf"), chunk(1, "b", "B.pdf"), chunk(2, "c", "B.pdf")];
        let owners = chunk_owner_index(&chunks);
        assert_eq!(owners.get(&ChunkId::Int(1)).map(String::as_str), Some("A.pdf"));
        assert_eq!(owners.get(&ChunkId::Int(2)).map(String::as_str), Some("B.pdf"));
    }
}
