use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::warn;

/// Extensions read as plain text
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Read a transcript file as text
///
/// Only plain-text files are accepted. Bytes that are not valid UTF-8 are
/// decoded as Latin-1.
pub fn read_transcript_file(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
        bail!(
            "Unsupported transcript format {:?}: convert {:?} to .txt or .md first",
            extension,
            path
        );
    }

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let text = decode_transcript(bytes);

    if text.trim().is_empty() {
        warn!("Transcript {:?} is empty", path);
    }

    Ok(text)
}

/// Decode as UTF-8, falling back to Latin-1
pub fn decode_transcript(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Transcript is not valid UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = decode_transcript("Reunião às 10h".as_bytes().to_vec());
        assert_eq!(text, "Reunião às 10h");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // "Ação" in ISO-8859-1
        let bytes = vec![0x41, 0xE7, 0xE3, 0x6F];
        assert_eq!(decode_transcript(bytes), "Ação");
    }

    #[test]
    fn test_read_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuniao.TXT");
        std::fs::write(&path, "Maria: bom dia").unwrap();
        assert_eq!(read_transcript_file(&path).unwrap(), "Maria: bom dia");
    }

    #[test]
    fn test_rejects_binary_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuniao.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let err = read_transcript_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported transcript format"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_transcript_file(Path::new("/nonexistent/reuniao.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
