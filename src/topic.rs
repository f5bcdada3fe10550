use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use regex::{Regex, RegexBuilder};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Topic {
    Retribusi,
    Pajak,
    Izin,
    Sanksi,
    Pelaporan,
    Pengelolaan,
    Keuangan,
    Pemerintahan,
    Infrastruktur,
    Kesejahteraan,
    Hukum,
    Lainnya,
}

impl Topic {
    pub const ALL: [Topic; 12] = [
        Self::Retribusi,
        Self::Pajak,
        Self::Izin,
        Self::Sanksi,
        Self::Pelaporan,
        Self::Pengelolaan,
        Self::Keuangan,
        Self::Pemerintahan,
        Self::Infrastruktur,
        Self::Kesejahteraan,
        Self::Hukum,
        Self::Lainnya,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retribusi => "retribusi",
            Self::Pajak => "pajak",
            Self::Izin => "izin",
            Self::Sanksi => "sanksi",
            Self::Pelaporan => "pelaporan",
            Self::Pengelolaan => "pengelolaan",
            Self::Keuangan => "keuangan",
            Self::Pemerintahan => "pemerintahan",
            Self::Infrastruktur => "infrastruktur",
            Self::Kesejahteraan => "kesejahteraan",
            Self::Hukum => "hukum",
            Self::Lainnya => "lainnya",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_lowercase();
        match Self::ALL
            .iter()
            .find(|topic| topic.as_str() == normalized)
        {
            Some(topic) => Ok(*topic),
            None => bail!("unknown topic label: {value}"),
        }
    }
}

pub const DEFAULT_CROSS_DOC_TOPICS: [Topic; 5] = [
    Topic::Retribusi,
    Topic::Izin,
    Topic::Pengelolaan,
    Topic::Pajak,
    Topic::Hukum,
];

// First topic with a matching keyword wins.
pub const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::Retribusi,
        &["retribusi", "jasa umum", "jasa usaha", "perizinan", "tarif retribusi"],
    ),
    (
        Topic::Pajak,
        &[
            "pajak",
            "PBB-P2",
            "reklame",
            "penanggung pajak",
            "objek pajak",
            "pajak hiburan",
            "pajak parkir",
        ],
    ),
    (
        Topic::Izin,
        &[
            "izin",
            "bangunan gedung",
            "TKA",
            "persetujuan",
            "IMB",
            "SIUP",
            "izin lingkungan",
        ],
    ),
    (
        Topic::Sanksi,
        &["sanksi", "denda", "keterlambatan", "pelanggaran", "penyitaan"],
    ),
    (
        Topic::Pelaporan,
        &["pelaporan", "lapor", "batas waktu", "surat keputusan", "pengajuan"],
    ),
    (
        Topic::Pengelolaan,
        &["pengelolaan", "pasar", "kebersihan", "pasar tradisional", "UMKM"],
    ),
    (
        Topic::Keuangan,
        &[
            "anggaran",
            "APBD",
            "pendapatan daerah",
            "belanja daerah",
            "dana perimbangan",
        ],
    ),
    (
        Topic::Pemerintahan,
        &[
            "kepala daerah",
            "DPRD",
            "otonomi daerah",
            "pelayanan publik",
            "aparatur sipil",
        ],
    ),
    (
        Topic::Infrastruktur,
        &[
            "tata ruang",
            "RTRW",
            "drainase",
            "persampahan",
            "lingkungan hidup",
        ],
    ),
    (
        Topic::Kesejahteraan,
        &[
            "kesehatan masyarakat",
            "pendidikan daerah",
            "bantuan sosial",
            "disabilitas",
        ],
    ),
    (
        Topic::Hukum,
        &[
            "dasar hukum",
            "pasal",
            "ayat",
            "undang-undang",
            "harmonisasi",
            "mengingat",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct TopicClassifier {
    patterns: Vec<(Topic, Regex)>,
}

impl TopicClassifier {
    pub fn new() -> Result<Self> {
        Self::from_keywords(TOPIC_KEYWORDS)
    }

    pub fn from_keywords(table: &[(Topic, &[&str])]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(table.len());
        for (topic, keywords) in table {
            if keywords.is_empty() {
                continue;
            }
            let alternation = keywords
                .iter()
                .map(|keyword| regex::escape(keyword))
                .collect::<Vec<String>>()
                .join("|");
            let pattern = RegexBuilder::new(&alternation)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("failed to compile keyword pattern for topic {topic}"))?;
            patterns.push((*topic, pattern));
        }

        Ok(Self { patterns })
    }

    pub fn classify(&self, text: &str) -> Topic {
        self.patterns
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::Lainnya)
    }
}

pub fn resolve_topic_allowlist(raw_values: &[String]) -> Result<Vec<Topic>> {
    if raw_values.iter().all(|value| value.trim().is_empty()) {
        return Ok(DEFAULT_CROSS_DOC_TOPICS.to_vec());
    }

    let mut out = Vec::<Topic>::new();
    for value in raw_values {
        if value.trim().is_empty() {
            continue;
        }
        let topic = value.parse::<Topic>()?;
        if !out.contains(&topic) {
            out.push(topic);
        }
    }
    Ok(out)
}
