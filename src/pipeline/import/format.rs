use std::path::Path;

use serde::{Deserialize, Serialize};

use super::EncodeError;

/// What the extraction model is able to read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileCategory {
    Pdf,
    Image,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == "application/pdf" {
            Self::Pdf
        } else if mime.starts_with("image/") {
            Self::Image
        } else {
            Self::Unsupported
        }
    }
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatDetection {
    pub mime_type: String,
    pub category: FileCategory,
    pub file_size_bytes: u64,
}

/// Inline payload ceiling of the extraction API.
pub const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Detect the media type of `bytes`.
///
/// Magic bytes win over everything else. When they are not recognized the
/// declared type (from the upload) is used, then the file-name extension.
pub fn detect_format(bytes: &[u8], declared_mime: Option<&str>, filename: &str) -> FormatDetection {
    let mime_type = sniff_magic(bytes)
        .map(str::to_string)
        .or_else(|| {
            declared_mime
                .map(|m| m.trim().to_ascii_lowercase())
                .filter(|m| !m.is_empty() && m != "application/octet-stream")
        })
        .or_else(|| {
            mime_guess::from_path(Path::new(filename))
                .first()
                .map(|m| m.essence_str().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    FormatDetection {
        category: FileCategory::from_mime(&mime_type),
        mime_type,
        file_size_bytes: bytes.len() as u64,
    }
}

/// Reject formats the extraction model cannot read and oversized payloads.
pub fn ensure_supported(detection: &FormatDetection) -> Result<(), EncodeError> {
    if detection.file_size_bytes > MAX_FILE_SIZE {
        return Err(EncodeError::FileTooLarge {
            size_mb: detection.file_size_bytes as f64 / (1024.0 * 1024.0),
            max_mb: MAX_FILE_SIZE / (1024 * 1024),
        });
    }
    if !detection.category.is_supported() {
        return Err(EncodeError::UnsupportedFormat(detection.mime_type.clone()));
    }
    Ok(())
}

/// Match the leading bytes against known scan/photo signatures.
fn sniff_magic(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => Some("application/pdf"),
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: starts with 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF87a / GIF89a
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        // WEBP: RIFF....WEBP
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        // TIFF: little-endian (49 49 2A 00) or big-endian (4D 4D 00 2A)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Some("image/tiff"),
        // HEIC/HEIF: "ftyp" at offset 4
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] => {
            if brand.starts_with(b"heic") || brand.starts_with(b"heix") {
                Some("image/heic")
            } else if brand.starts_with(b"mif1") || brand.starts_with(b"heif") {
                Some("image/heif")
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Keep only the final path component, without control characters, capped
/// at 255 chars.
pub fn sanitize_filename(original: &str) -> String {
    // Client paths may use either separator, whatever the server OS.
    let name = original
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .filter(|segment| !matches!(*segment, "." | ".."))
        .unwrap_or("document");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0') && !c.is_control())
        .take(255)
        .collect();

    if clean.is_empty() {
        "document".to_string()
    } else {
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_jpeg_from_magic_bytes() {
        let format = detect_format(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], None, "scan");
        assert_eq!(format.category, FileCategory::Image);
        assert_eq!(format.mime_type, "image/jpeg");
    }

    #[test]
    fn detect_png_from_magic_bytes() {
        let format = detect_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], None, "");
        assert_eq!(format.mime_type, "image/png");
    }

    #[test]
    fn detect_tiff_little_endian() {
        let format = detect_format(&[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00], None, "");
        assert_eq!(format.mime_type, "image/tiff");
    }

    #[test]
    fn detect_webp() {
        let format = detect_format(b"RIFF\x10\x00\x00\x00WEBPVP8 ", None, "");
        assert_eq!(format.mime_type, "image/webp");
    }

    #[test]
    fn detect_heic_brand() {
        let format = detect_format(b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00", None, "");
        assert_eq!(format.mime_type, "image/heic");
    }

    #[test]
    fn pdf_magic_bytes_detected() {
        let format = detect_format(b"%PDF-1.4 scanned", Some("image/png"), "form.png");
        assert_eq!(format.category, FileCategory::Pdf);
        assert_eq!(format.mime_type, "application/pdf");
    }

    #[test]
    fn wrong_extension_detected_by_magic_bytes() {
        let format = detect_format(&[0xFF, 0xD8, 0xFF, 0xE0], None, "misleading.pdf");
        assert_eq!(format.mime_type, "image/jpeg");
    }

    #[test]
    fn declared_type_used_when_magic_unknown() {
        let format = detect_format(b"????", Some("image/bmp"), "form.dat");
        assert_eq!(format.mime_type, "image/bmp");
        assert_eq!(format.category, FileCategory::Image);
    }

    #[test]
    fn octet_stream_declaration_falls_through_to_extension() {
        let format = detect_format(b"????", Some("application/octet-stream"), "form.bmp");
        assert_eq!(format.mime_type, "image/bmp");
    }

    #[test]
    fn unknown_binary_is_unsupported() {
        let format = detect_format(&[0x4D, 0x5A, 0x90, 0x00], None, "tool.exe");
        assert_eq!(format.category, FileCategory::Unsupported);
        assert!(matches!(
            ensure_supported(&format),
            Err(EncodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let detection = FormatDetection {
            mime_type: "image/jpeg".into(),
            category: FileCategory::Image,
            file_size_bytes: MAX_FILE_SIZE + 1,
        };
        assert!(matches!(
            ensure_supported(&detection),
            Err(EncodeError::FileTooLarge { max_mb: 20, .. })
        ));
    }

    #[test]
    fn sanitize_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("normal_file.pdf"), "normal_file.pdf");
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename("file\0name.pdf"), "filename.pdf");
    }

    #[test]
    fn sanitize_splits_windows_paths() {
        assert_eq!(sanitize_filename(r"C:\scans\a.jpg"), "a.jpg");
        assert_eq!(sanitize_filename(r"..\..\boot.ini"), "boot.ini");
        assert_eq!(sanitize_filename(r"scans\lote 3/reporte.pdf"), "reporte.pdf");
        assert_eq!(sanitize_filename(r"C:\scans\"), "scans");
        assert_eq!(sanitize_filename(".."), "document");
    }

    #[test]
    fn sanitize_preserves_normal_names() {
        assert_eq!(sanitize_filename("reporte IG-1042 (1).jpg"), "reporte IG-1042 (1).jpg");
    }
}
