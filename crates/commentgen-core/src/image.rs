//! Image attachments: size ceiling, MIME detection and base64/data-URI encoding.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Largest image accepted for upload (5 MB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image size should be less than 5MB")]
    TooLarge { size: u64 },
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("Invalid image data URI")]
    InvalidDataUri,
    #[error("Could not read image: {0}")]
    Io(#[from] std::io::Error),
}

/// A base64-encoded image, without any `data:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: String,
}

impl ImageAttachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw image bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri.strip_prefix("data:").ok_or(ImageError::InvalidDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::InvalidDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(ImageError::InvalidDataUri)?;

        if !mime_type.starts_with("image/") {
            return Err(ImageError::UnsupportedType(mime_type.to_string()));
        }
        if payload.is_empty() {
            return Err(ImageError::InvalidDataUri);
        }

        let attachment = Self::new(mime_type, payload.trim());
        let size = attachment.decoded_len() as u64;
        if size > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge { size });
        }
        Ok(attachment)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Approximate decoded size in bytes
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

/// Guess an image MIME type from the file extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

/// Load an image file for attaching to a draft.
///
/// The size check runs on file metadata, before anything is read or encoded.
pub fn load_image(path: &Path) -> Result<ImageAttachment, ImageError> {
    let size = fs::metadata(path)?.len();
    if size > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge { size });
    }

    let mime_type = mime_type_for(path).ok_or_else(|| {
        ImageError::UnsupportedType(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        )
    })?;

    let bytes = fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), mime_type, "loaded image");
    Ok(ImageAttachment::from_bytes(mime_type, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_data_uri_round_trip() {
        let image = ImageAttachment::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
        assert_eq!(image.to_data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_data_uri_over_the_ceiling_is_rejected() {
        let payload = "A".repeat((MAX_IMAGE_BYTES as usize / 3 + 1) * 4);
        let uri = format!("data:image/png;base64,{}", payload);
        assert!(matches!(
            ImageAttachment::from_data_uri(&uri),
            Err(ImageError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_data_uri_rejects_non_images_and_garbage() {
        assert!(matches!(
            ImageAttachment::from_data_uri("data:text/plain;base64,aGk="),
            Err(ImageError::UnsupportedType(_))
        ));
        assert!(matches!(
            ImageAttachment::from_data_uri("image/png;base64,aGk="),
            Err(ImageError::InvalidDataUri)
        ));
        assert!(matches!(
            ImageAttachment::from_data_uri("data:image/png,aGk="),
            Err(ImageError::InvalidDataUri)
        ));
    }

    #[test]
    fn test_mime_type_for_extensions() {
        assert_eq!(mime_type_for(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(mime_type_for(Path::new("b.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("c.txt")), None);
        assert_eq!(mime_type_for(Path::new("noext")), None);
    }

    #[test]
    fn test_load_image_encodes_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pic.png");
        File::create(&path).unwrap().write_all(b"hello").unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "aGVsbG8=");
        assert_eq!(image.decoded_len(), 5);
    }

    #[test]
    fn test_load_image_rejects_oversized_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.jpg");
        let file = File::create(&path).unwrap();
        file.set_len(MAX_IMAGE_BYTES + 1).unwrap();

        match load_image(&path) {
            Err(ImageError::TooLarge { size }) => assert_eq!(size, MAX_IMAGE_BYTES + 1),
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_load_image_accepts_exactly_five_megabytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edge.gif");
        File::create(&path).unwrap().set_len(MAX_IMAGE_BYTES).unwrap();

        assert!(load_image(&path).is_ok());
    }

    #[test]
    fn test_load_image_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        File::create(&path).unwrap().write_all(b"text").unwrap();

        assert!(matches!(load_image(&path), Err(ImageError::UnsupportedType(_))));
    }
}
