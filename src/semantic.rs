use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MODEL_ID: &str = "local-hash-v1";
pub const DEFAULT_MODEL_NAME: &str = "local feature-hashing (unigram + bigram)";
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_NORMALIZATION: &str = "l2";
pub const DEFAULT_BACKEND: &str = "local-hash-v1";

pub const DEFAULT_SIMILARITY_MIN: f64 = 0.5;
pub const DEFAULT_SIMILARITY_MAX: f64 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticModelConfig {
    pub model_id: String,
    pub model_name: String,
    pub dimensions: usize,
    pub normalization: String,
    pub backend: String,
}

pub fn resolve_model_config(model_id: &str) -> SemanticModelConfig {
    let trimmed = model_id.trim();
    let resolved_id = if trimmed.is_empty() {
        DEFAULT_MODEL_ID
    } else {
        trimmed
    };

    let model_name = if resolved_id == DEFAULT_MODEL_ID {
        DEFAULT_MODEL_NAME
    } else {
        resolved_id
    };

    SemanticModelConfig {
        model_id: resolved_id.to_string(),
        model_name: model_name.to_string(),
        dimensions: DEFAULT_EMBEDDING_DIM,
        normalization: DEFAULT_NORMALIZATION.to_string(),
        backend: DEFAULT_BACKEND.to_string(),
    }
}

pub trait Embedder {
    fn model_id(&self) -> &str;
    fn dimensions(&self) -> usize;
    fn embed(&self, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone)]
pub struct LocalHashEmbedder {
    config: SemanticModelConfig,
}

impl LocalHashEmbedder {
    pub fn new(config: SemanticModelConfig) -> Self {
        Self { config }
    }
}

impl Embedder for LocalHashEmbedder {
    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions.max(8)
    }

    fn embed(&self, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        let batch_size = batch_size.max(1);
        let mut out = Vec::<Vec<f32>>::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
            for text in batch {
                out.push(embed_text_local(text, self.config.dimensions));
            }
            debug!(
                model_id = %self.config.model_id,
                batch = batch_index + 1,
                embedded = out.len(),
                total = texts.len(),
                "embedding batch encoded"
            );
        }

        Ok(out)
    }
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn embed_text_local(payload: &str, dimensions: usize) -> Vec<f32> {
    let dims = dimensions.max(8);
    let mut vector = vec![0_f32; dims];
    let mut tokens = tokenize_payload(payload);

    if tokens.is_empty() {
        return vector;
    }

    for token in tokens.drain(..) {
        let hash = stable_hash(&token);
        let index = (hash as usize) % dims;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
        vector[index] += sign * weight;
    }

    normalize_vector(&mut vector);
    vector
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut left_norm = 0.0_f64;
    let mut right_norm = 0.0_f64;
    for (left_value, right_value) in left.iter().zip(right.iter()) {
        let l = f64::from(*left_value);
        let r = f64::from(*right_value);
        dot += l * r;
        left_norm += l * l;
        right_norm += r * r;
    }

    if left_norm <= 0.0 || right_norm <= 0.0 {
        return 0.0;
    }

    dot / (left_norm.sqrt() * right_norm.sqrt())
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimilarityBand {
    lower: f64,
    upper: f64,
}

impl SimilarityBand {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            bail!("similarity bounds must be finite (got {lower}, {upper})");
        }
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) {
            bail!("similarity bounds must lie in [0, 1] (got {lower}, {upper})");
        }
        if lower >= upper {
            bail!("similarity lower bound {lower} must be below upper bound {upper}");
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn contains(&self, similarity: f64) -> bool {
        self.lower < similarity && similarity < self.upper
    }
}

impl Default for SimilarityBand {
    fn default() -> Self {
        Self {
            lower: DEFAULT_SIMILARITY_MIN,
            upper: DEFAULT_SIMILARITY_MAX,
        }
    }
}

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn tokenize_payload(payload: &str) -> Vec<String> {
    let normalized = normalize_whitespace(payload);
    if normalized.is_empty() {
        return Vec::new();
    }

    let words = normalized
        .split(' ')
        .map(|value| {
            value
                .chars()
                .filter(|character| character.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|value| !value.is_empty())
        .collect::<Vec<String>>();

    if words.is_empty() {
        return Vec::new();
    }

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

fn normalize_vector(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    if norm == 0.0 {
        return;
    }

    for value in values {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_of_orthogonal_and_identical_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[3.0, 4.0], &[3.0, 4.0]), 1.0);
    }

    #[test]
    fn cosine_similarity_is_scale_invariant() {
        // (1,0,0,0) vs (1,1,1,1): 1 / (1 * 2) = 0.5 exactly.
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0, 0.0], &[1.0, 1.0, 1.0, 1.0]), 0.5);
        assert_eq!(cosine_similarity(&[2.0, 0.0, 0.0, 0.0], &[3.0, 3.0, 3.0, 3.0]), 0.5);
    }

    #[test]
    fn cosine_similarity_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn similarity_band_excludes_both_bounds() {
        let band = SimilarityBand::default();
        assert!(!band.contains(0.5));
        assert!(!band.contains(0.8));
        assert!(band.contains(0.65));
        assert!(!band.contains(0.0));
        assert!(!band.contains(1.0));
    }

    #[test]
    fn similarity_band_rejects_invalid_bounds() {
        assert!(SimilarityBand::new(0.8, 0.5).is_err());
        assert!(SimilarityBand::new(0.5, 0.5).is_err());
        assert!(SimilarityBand::new(-0.1, 0.5).is_err());
        assert!(SimilarityBand::new(0.2, f64::NAN).is_err());
        assert!(SimilarityBand::new(0.3, 0.9).is_ok());
    }

    #[test]
    fn local_embedder_is_deterministic_and_normalised() {
        let embedder = LocalHashEmbedder::new(resolve_model_config(DEFAULT_MODEL_ID));
        let texts = vec![
            "Objek pajak reklame".to_string(),
            "Objek pajak reklame".to_string(),
            String::new(),
        ];
        let vectors = embedder.embed(&texts, 1).expect("embedding succeeds");

        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|vector| vector.len() == DEFAULT_EMBEDDING_DIM));
        assert_eq!(vectors[0], vectors[1]);
        assert!((cosine_similarity(&vectors[0], &vectors[1]) - 1.0).abs() < 1e-6);
        assert!(vectors[2].iter().all(|value| *value == 0.0));
    }

    #[test]
    fn local_embedder_output_does_not_depend_on_batch_size() {
        let embedder = LocalHashEmbedder::new(resolve_model_config(""));
        let texts = (0..7)
            .map(|index| format!("pasal {index} tentang retribusi pasar"))
            .collect::<Vec<String>>();
        let small = embedder.embed(&texts, 2).expect("small batches");
        let large = embedder.embed(&texts, 32).expect("one batch");
        assert_eq!(small, large);
    }

    #[test]
    fn resolve_model_config_falls_back_to_default_id() {
        let config = resolve_model_config("   ");
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.dimensions, DEFAULT_EMBEDDING_DIM);

        let custom = resolve_model_config("custom-model");
        assert_eq!(custom.model_id, "custom-model");
        assert_eq!(custom.model_name, "custom-model");
    }
}
