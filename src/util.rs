use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Writes to a `.partial` sibling first, then renames it over `path`.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let staging_path = staging_path_for(path);
    {
        let mut file = File::create(&staging_path).with_context(|| {
            format!("failed to create json file: {}", staging_path.display())
        })?;
        file.write_all(&data)
            .with_context(|| format!("failed to write json file: {}", staging_path.display()))?;
        file.write_all(b"\n").with_context(|| {
            format!("failed to finalize json file: {}", staging_path.display())
        })?;
        file.sync_all()
            .with_context(|| format!("failed to flush json file: {}", staging_path.display()))?;
    }

    fs::rename(&staging_path, path).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            staging_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

fn staging_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Document name as shown in questions: the filename minus a trailing `.pdf`.
pub fn document_label(filename: &str) -> &str {
    let trimmed = filename.trim();
    let len = trimmed.len();
    if len >= 4
        && trimmed.is_char_boundary(len - 4)
        && trimmed[len - 4..].eq_ignore_ascii_case(".pdf")
    {
        &trimmed[..len - 4]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("émbé", 2), "ém");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn document_label_strips_pdf_extension_only() {
        assert_eq!(document_label("Perda No 5 Tahun 2020.pdf"), "Perda No 5 Tahun 2020");
        assert_eq!(document_label("PERDA_2019.PDF"), "PERDA_2019");
        assert_eq!(document_label("catatan.txt"), "catatan.txt");
        assert_eq!(document_label(".pdf"), "");
        assert_eq!(document_label("pdf"), "pdf");
    }

    #[test]
    fn write_json_pretty_preserves_non_ascii_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("out.json");

        write_json_pretty(&path, &serde_json::json!({ "teks": "Pasal 1 — ketentuan umum" }))
            .expect("write succeeds");

        let raw = fs::read_to_string(&path).expect("read back");
        assert!(raw.contains("Pasal 1 — ketentuan umum"));
        assert!(raw.ends_with("}\n"));
        assert!(!staging_path_for(&path).exists());
    }
}
