use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::InventoryArgs;
use crate::corpus::{DocumentIndex, load_chunks};
use crate::model::{CorpusInventoryManifest, DocumentInventoryEntry, TopicCountEntry};
use crate::topic::TopicClassifier;
use crate::util::{now_utc_string, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.chunks_dir)?;

    for document in &manifest.documents {
        info!(
            filename = %document.filename,
            chunks = document.chunk_count,
            dominant_topic = %document.dominant_topic,
            "document"
        );
    }

    if args.dry_run {
        info!(
            documents = manifest.document_count,
            chunks = manifest.chunk_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.chunks_dir.join("manifests").join("corpus_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(
        documents = manifest.document_count,
        chunks = manifest.chunk_count,
        "inventory completed"
    );

    Ok(())
}

pub fn build_manifest(chunks_dir: &Path) -> Result<CorpusInventoryManifest> {
    let corpus = load_chunks(chunks_dir)?;
    let classifier = TopicClassifier::new()?;
    let index = DocumentIndex::build(&corpus.chunks, &classifier);

    let documents = index
        .documents()
        .iter()
        .map(|group| DocumentInventoryEntry {
            filename: group.filename.clone(),
            chunk_count: group.chunks.len(),
            dominant_topic: group.dominant_topic.as_str().to_string(),
            topic_counts: group
                .topic_counts
                .iter()
                .map(|(topic, count)| TopicCountEntry {
                    topic: topic.as_str().to_string(),
                    count: *count,
                })
                .collect(),
        })
        .collect::<Vec<DocumentInventoryEntry>>();

    Ok(CorpusInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: chunks_dir.display().to_string(),
        chunk_file_count: corpus.files.len(),
        chunk_count: corpus.chunks.len(),
        document_count: documents.len(),
        documents,
        source_hashes: corpus.source_hashes()?,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn build_manifest_reports_topics_per_document() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("chunks.json"),
            r#"[
                {"chunk_id": 1, "text": "Objek pajak reklame", "filename": "Perda Pajak.pdf"},
                {"chunk_id": 2, "text": "Sanksi denda", "filename": "Perda Pajak.pdf"},
                {"chunk_id": 3, "text": "Pajak hiburan", "filename": "Perda Pajak.pdf"},
                {"chunk_id": 4, "text": "Cukup jelas.", "filename": "Penjelasan.pdf"}
            ]"#,
        )
        .expect("write chunks");

        let manifest = build_manifest(dir.path()).expect("manifest builds");
        assert_eq!(manifest.chunk_file_count, 1);
        assert_eq!(manifest.chunk_count, 4);
        assert_eq!(manifest.document_count, 2);

        let pajak = &manifest.documents[0];
        assert_eq!(pajak.filename, "Perda Pajak.pdf");
        assert_eq!(pajak.dominant_topic, "pajak");
        assert_eq!(pajak.topic_counts.len(), 2);
        assert_eq!(pajak.topic_counts[0].topic, "pajak");
        assert_eq!(pajak.topic_counts[0].count, 2);

        assert_eq!(manifest.documents[1].dominant_topic, "lainnya");
        assert_eq!(manifest.source_hashes[0].sha256.len(), 64);
    }

    #[test]
    fn run_writes_manifest_to_requested_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join("chunks.json"),
            r#"[{"chunk_id": "x", "text": "Izin usaha", "filename": "Izin.pdf"}]"#,
        )
        .expect("write chunks");
        let manifest_path = dir.path().join("out").join("inventory.json");

        run(InventoryArgs {
            chunks_dir: dir.path().to_path_buf(),
            manifest_path: Some(manifest_path.clone()),
            dry_run: false,
        })
        .expect("inventory runs");

        let raw = fs::read_to_string(&manifest_path).expect("manifest written");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["document_count"], 1);
        assert_eq!(value["documents"][0]["dominant_topic"], "izin");
    }
}
