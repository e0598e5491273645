//! Picked-file handling and attachment classification.
//!
//! Classification is advisory: it picks the icon a file renders with and
//! never blocks sending. Unknown extensions fall through to
//! [`FileKind::Generic`].

use std::path::Path;

use crate::error::Result;

/// A file chosen through the platform picker (or a finished voice capture),
/// ready for upload: name, sniffed-or-declared MIME type, and the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: &str, mime_type: Option<&str>, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.map(String::from),
            data,
        }
    }

    /// Reads a file from disk, sniffing the MIME type from its magic bytes
    /// when the picker did not provide one.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let mime_type = infer::get(&data).map(|kind| kind.mime_type().to_string());
        Ok(Self {
            name,
            mime_type,
            data,
        })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether this file should be sent as an image message rather than a
    /// file message.
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
    }
}

/// Icon bucket for a file attachment, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Document,
    Image,
    Audio,
    Video,
    Archive,
    Generic,
}

/// Classifies a file name by extension into an icon bucket.
pub fn classify_file_name(file_name: &str) -> FileKind {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => FileKind::Document,
        "jpg" | "jpeg" | "png" | "gif" => FileKind::Image,
        "mp3" | "wav" | "m4a" => FileKind::Audio,
        "mp4" | "mov" | "avi" => FileKind::Video,
        "zip" | "rar" | "7z" => FileKind::Archive,
        _ => FileKind::Generic,
    }
}

/// Formats a byte count for display: `0 B`, `1.5 KB`, `2.0 MB`, ...
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let exponent = (bytes as f64).log(1024.0).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    // Trailing ".0" is dropped, matching how sizes render in the app
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[exponent])
    } else {
        format!("{:.1} {}", rounded, UNITS[exponent])
    }
}
