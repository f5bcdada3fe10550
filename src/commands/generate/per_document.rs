use rand::Rng;
use rand::seq::index;

use crate::corpus::DocumentGroup;
use crate::model::{ChunkRecord, QueryDraft};
use crate::topic::Topic;
use crate::util::{document_label, truncate_chars};

pub(super) const DOCUMENT_REFERENCE_CHARS: usize = 200;

pub(super) fn queries_per_document(
    num_queries: usize,
    cross_doc_queries: usize,
    document_count: usize,
) -> usize {
    if document_count == 0 {
        return 1;
    }
    (num_queries.saturating_sub(cross_doc_queries) / document_count).max(1)
}

pub(super) fn synthesize_document_queries<R: Rng + ?Sized>(
    group: &DocumentGroup,
    queries_per_doc: usize,
    rng: &mut R,
) -> Vec<QueryDraft> {
    let amount = queries_per_doc.min(group.chunks.len());
    if amount == 0 {
        return Vec::new();
    }

    index::sample(rng, group.chunks.len(), amount)
        .into_iter()
        .map(|position| render_document_query(&group.chunks[position], group.dominant_topic))
        .collect()
}

pub(super) fn render_document_query(chunk: &ChunkRecord, topic: Topic) -> QueryDraft {
    QueryDraft {
        text: render_document_question(topic, document_label(&chunk.filename)),
        relevant: vec![chunk.chunk_id.clone()],
        reference: format!("{}...", truncate_chars(&chunk.text, DOCUMENT_REFERENCE_CHARS)),
    }
}

fn render_document_question(topic: Topic, document: &str) -> String {
    match topic {
        Topic::Retribusi => format!("Apa jenis {topic} yang diatur dalam {document}?"),
        Topic::Pajak => format!("Apa ketentuan tentang {topic} daerah dalam {document}?"),
        Topic::Izin => format!("Bagaimana prosedur pengajuan {topic} dalam {document}?"),
        Topic::Sanksi => format!("Apa {topic} untuk pelanggaran peraturan dalam {document}?"),
        Topic::Pelaporan => format!("Apa kewajiban {topic} dalam {document}?"),
        Topic::Pengelolaan => format!("Bagaimana {topic} aset daerah diatur dalam {document}?"),
        Topic::Keuangan => format!("Apa pengaturan {topic} daerah dalam {document}?"),
        Topic::Pemerintahan => format!("Apa tugas {topic} daerah dalam {document}?"),
        Topic::Infrastruktur => format!("Apa ketentuan tentang {topic} daerah dalam {document}?"),
        Topic::Kesejahteraan => format!("Bagaimana {topic} masyarakat diatur dalam {document}?"),
        Topic::Hukum => format!("Apa {topic} yang mendasari {document}?"),
        Topic::Lainnya => format!("Apa ketentuan umum dalam {document}?"),
    }
}
