//! Attachment classification and the upload allow-list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Per-file upload ceiling (100 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 100 * 1024 * 1024;

/// Maximum number of files accepted on a single update.
pub const MAX_FILES_PER_UPDATE: usize = 10;

/// Accepted extensions and the MIME types each may be declared with.
const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("jpeg", &["image/jpeg"]),
    ("jpg", &["image/jpeg"]),
    ("png", &["image/png"]),
    ("gif", &["image/gif"]),
    ("pdf", &["application/pdf"]),
    ("doc", &["application/msword"]),
    (
        "docx",
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
    ),
    ("mp4", &["video/mp4"]),
    ("webm", &["video/webm"]),
    ("mov", &["video/quicktime"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Document,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Video => "video",
            AttachmentKind::Document => "document",
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(AttachmentKind::Image),
            "video" => Ok(AttachmentKind::Video),
            "document" => Ok(AttachmentKind::Document),
            other => Err(CoreError::Validation(format!(
                "Unknown attachment kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `image/*` is an image, `video/*` a video, anything else a document.
pub fn classify(mime_type: &str) -> AttachmentKind {
    let mime = essence(mime_type);
    if mime.starts_with("image/") {
        AttachmentKind::Image
    } else if mime.starts_with("video/") {
        AttachmentKind::Video
    } else {
        AttachmentKind::Document
    }
}

/// Strip any path components a client put in the declared file name.
pub fn original_file_name(declared_name: &str) -> &str {
    declared_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(declared_name)
        .trim()
}

/// Check a declared file name and MIME type against the allow-list.
///
/// Both must agree: the extension must be allowed and the MIME type must be
/// one registered for that extension. Returns the lowercased extension.
pub fn validate_upload(declared_name: &str, mime_type: &str) -> Result<String, CoreError> {
    let name = original_file_name(declared_name);
    let ext = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => {
            return Err(CoreError::UnsupportedFileType(format!(
                "'{name}' has no file extension"
            )))
        }
    };

    let Some((_, mimes)) = ALLOWED_TYPES.iter().find(|(allowed, _)| *allowed == ext) else {
        return Err(CoreError::UnsupportedFileType(format!(
            "'.{ext}' files are not accepted. Allowed: {}",
            allowed_extensions().join(", ")
        )));
    };

    let mime = essence(mime_type);
    if !mimes.contains(&mime.as_str()) {
        return Err(CoreError::UnsupportedFileType(format!(
            "MIME type '{mime}' does not match a '.{ext}' file"
        )));
    }

    Ok(ext)
}

pub fn allowed_extensions() -> Vec<&'static str> {
    ALLOWED_TYPES.iter().map(|(ext, _)| *ext).collect()
}

/// Lowercased MIME type without parameters (`image/PNG; q=1` -> `image/png`).
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn classifies_by_top_level_type() {
        assert_eq!(classify("image/png"), AttachmentKind::Image);
        assert_eq!(classify("video/quicktime"), AttachmentKind::Video);
        assert_eq!(classify("application/pdf"), AttachmentKind::Document);
        assert_eq!(classify("IMAGE/JPEG"), AttachmentKind::Image);
        assert_eq!(classify(""), AttachmentKind::Document);
    }

    #[test]
    fn accepts_every_allowed_pair() {
        assert_eq!(validate_upload("site.JPG", "image/jpeg").unwrap(), "jpg");
        assert_eq!(validate_upload("walkthrough.mov", "video/quicktime").unwrap(), "mov");
        assert_eq!(validate_upload("plan.pdf", "application/pdf; charset=binary").unwrap(), "pdf");
        assert_eq!(
            validate_upload(
                "contract.docx",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            )
            .unwrap(),
            "docx"
        );
    }

    #[test]
    fn rejects_executables() {
        assert_matches!(
            validate_upload("setup.exe", "application/x-msdownload"),
            Err(CoreError::UnsupportedFileType(_))
        );
    }

    #[test]
    fn rejects_mismatched_mime() {
        // Allowed extension but a MIME type from another family.
        assert_matches!(
            validate_upload("photo.png", "application/x-msdownload"),
            Err(CoreError::UnsupportedFileType(_))
        );
        assert_matches!(
            validate_upload("photo.png", "image/jpeg"),
            Err(CoreError::UnsupportedFileType(_))
        );
    }

    #[test]
    fn rejects_names_without_extension() {
        assert_matches!(
            validate_upload("README", "application/pdf"),
            Err(CoreError::UnsupportedFileType(_))
        );
        assert_matches!(
            validate_upload(".pdf", "application/pdf"),
            Err(CoreError::UnsupportedFileType(_))
        );
    }

    #[test]
    fn strips_client_paths() {
        assert_eq!(original_file_name("C:\\Users\\me\\deck.png"), "deck.png");
        assert_eq!(original_file_name("../../etc/deck.png"), "deck.png");
        assert_eq!(original_file_name("deck.png"), "deck.png");
    }
}
