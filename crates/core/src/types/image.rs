//! Uploaded images stored inline with their owning record.

use serde::{Deserialize, Serialize};

/// An image uploaded through a catalog form.
///
/// The bytes live in the same row as the brand, category or item that owns
/// them, so an image is never written without its record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    /// Original file name as sent by the browser.
    pub file_name: String,
    /// MIME type (e.g., `image/png`).
    pub content_type: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

impl StoredImage {
    /// Create a new stored image.
    #[must_use]
    pub const fn new(file_name: String, content_type: String, data: Vec<u8>) -> Self {
        Self {
            file_name,
            content_type,
            data,
        }
    }

    /// Size of the image in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.data.len()
    }

    /// Whether the upload declared an image MIME type.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Human-readable size (e.g., "12.3 KB").
    #[must_use]
    pub fn size_label(&self) -> String {
        #[allow(clippy::cast_precision_loss)] // Upload sizes are bounded far below f64 precision
        let bytes = self.size() as f64;
        if bytes < 1024.0 {
            format!("{} B", self.size())
        } else if bytes < 1024.0 * 1024.0 {
            format!("{:.1} KB", bytes / 1024.0)
        } else {
            format!("{:.1} MB", bytes / (1024.0 * 1024.0))
        }
    }
}

// Skip the bytes; images can be megabytes long.
impl std::fmt::Debug for StoredImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(len: usize) -> StoredImage {
        StoredImage::new("logo.png".to_string(), "image/png".to_string(), vec![0; len])
    }

    #[test]
    fn test_size_label() {
        assert_eq!(image(512).size_label(), "512 B");
        assert_eq!(image(2048).size_label(), "2.0 KB");
        assert_eq!(image(3 * 1024 * 1024).size_label(), "3.0 MB");
    }

    #[test]
    fn test_debug_omits_bytes() {
        let debug = format!("{:?}", image(4));
        assert!(debug.contains("logo.png"));
        assert!(debug.contains("size: 4"));
        assert!(!debug.contains("data"));
    }

    #[test]
    fn test_is_image() {
        assert!(image(1).is_image());
        let pdf = StoredImage::new("a.pdf".to_string(), "application/pdf".to_string(), vec![]);
        assert!(!pdf.is_image());
    }
}
