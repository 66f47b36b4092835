//! Turns an uploaded file into a transport-ready base64 payload.
//!
//! The encoded form is what the extraction client sends inline and what the
//! record keeps as its `sourceImage` (as a `data:` URL). Decoding either form
//! gives back the original bytes exactly.

use std::path::PathBuf;

use base64::Engine as _;
use serde::Serialize;

use super::format::{detect_format, ensure_supported, sanitize_filename};
use super::EncodeError;

/// Where the bytes of an uploaded file live.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Already in memory (HTTP multipart upload).
    Bytes(Vec<u8>),
    /// On disk; read lazily when the file's turn comes (CLI).
    Path(PathBuf),
}

/// One file submitted as part of a batch.
#[derive(Debug, Clone)]
pub struct BatchFile {
    pub filename: String,
    pub declared_mime: Option<String>,
    pub source: FileSource,
}

impl BatchFile {
    pub fn from_bytes(filename: &str, declared_mime: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            filename: sanitize_filename(filename),
            declared_mime: declared_mime.map(str::to_string),
            source: FileSource::Bytes(bytes),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            filename: sanitize_filename(&path.to_string_lossy()),
            declared_mime: None,
            source: FileSource::Path(path),
        }
    }

    fn read_bytes(&self) -> Result<std::borrow::Cow<'_, [u8]>, EncodeError> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(std::borrow::Cow::Borrowed(bytes.as_slice())),
            FileSource::Path(path) => Ok(std::borrow::Cow::Owned(std::fs::read(path)?)),
        }
    }
}

/// A document payload ready for the extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedDocument {
    pub media_type: String,
    /// Standard base64 (with padding) of the original bytes.
    pub data: String,
}

impl EncodedDocument {
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// `data:<media type>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, EncodeError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| EncodeError::InvalidPayload(e.to_string()))
    }
}

/// Read, classify and encode one batch file.
pub fn encode_file(file: &BatchFile) -> Result<EncodedDocument, EncodeError> {
    let bytes = file.read_bytes()?;
    if bytes.is_empty() {
        return Err(EncodeError::EmptyFile);
    }

    let detection = detect_format(&bytes, file.declared_mime.as_deref(), &file.filename);
    ensure_supported(&detection)?;

    tracing::debug!(
        filename = %file.filename,
        mime_type = %detection.mime_type,
        size_bytes = detection.file_size_bytes,
        "Encoded document payload"
    );

    Ok(EncodedDocument::from_bytes(&detection.mime_type, &bytes))
}

/// Split a `data:` URL into its media type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), EncodeError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| EncodeError::InvalidPayload("missing data: prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| EncodeError::InvalidPayload("missing payload separator".into()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| EncodeError::InvalidPayload("payload is not base64".into()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| EncodeError::InvalidPayload(e.to_string()))?;

    Ok((media_type.to_string(), bytes))
}

/// The bare base64 payload of either a `data:` URL or an already-bare string.
pub fn strip_data_url_prefix(data: &str) -> &str {
    match data.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00];

    #[test]
    fn encode_then_decode_reproduces_bytes() {
        let file = BatchFile::from_bytes("form.jpg", Some("image/jpeg"), JPEG_BYTES.to_vec());
        let encoded = encode_file(&file).unwrap();
        assert_eq!(encoded.media_type, "image/jpeg");
        assert_eq!(encoded.decode().unwrap(), JPEG_BYTES);

        let (mime, bytes) = decode_data_url(&encoded.to_data_url()).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, JPEG_BYTES);
    }

    #[test]
    fn round_trip_preserves_every_byte_value() {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.extend(0u8..=255);
        let file = BatchFile::from_bytes("scan.pdf", None, bytes.clone());
        let encoded = encode_file(&file).unwrap();
        assert_eq!(encoded.media_type, "application/pdf");
        assert_eq!(decode_data_url(&encoded.to_data_url()).unwrap().1, bytes);
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporte.png");
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        std::fs::write(&path, png).unwrap();

        let file = BatchFile::from_path(&path);
        assert_eq!(file.filename, "reporte.png");
        let encoded = encode_file(&file).unwrap();
        assert_eq!(encoded.media_type, "image/png");
        assert_eq!(encoded.decode().unwrap(), png);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = BatchFile::from_path(dir.path().join("gone.jpg"));
        assert!(matches!(encode_file(&file), Err(EncodeError::Io(_))));
    }

    #[test]
    fn empty_file_rejected() {
        let file = BatchFile::from_bytes("blank.jpg", Some("image/jpeg"), vec![]);
        assert!(matches!(encode_file(&file), Err(EncodeError::EmptyFile)));
    }

    #[test]
    fn text_file_rejected() {
        let file = BatchFile::from_bytes("notes.txt", Some("text/plain"), b"hola".to_vec());
        assert!(matches!(
            encode_file(&file),
            Err(EncodeError::UnsupportedFormat(ref m)) if m == "text/plain"
        ));
    }

    #[test]
    fn malformed_data_urls_rejected() {
        assert!(decode_data_url("image/png;base64,AAAA").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("data:image/png,AAAA").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn strip_prefix_handles_both_forms() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url_prefix("QUJD"), "QUJD");
    }

    #[test]
    fn filename_is_sanitized() {
        let file = BatchFile::from_bytes("../../uploads/form.jpg", None, JPEG_BYTES.to_vec());
        assert_eq!(file.filename, "form.jpg");
    }
}
