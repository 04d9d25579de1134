//! Multipart form bodies.
//!
//! Brand, category and item forms are posted as `multipart/form-data` so
//! they can carry an optional image. Text fields are collected by name
//! (repeated names keep every value); the `image` file part is buffered in
//! memory, bounded by the router's body limit.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use catalog_core::StoredImage;

use crate::error::AppError;

/// Name of the file input on every image-bearing form.
pub const IMAGE_FIELD: &str = "image";

/// A decoded form submission.
#[derive(Debug, Default)]
pub struct Submission {
    fields: HashMap<String, Vec<String>>,
    image: Option<StoredImage>,
}

impl Submission {
    /// Drain a multipart body.
    ///
    /// An empty file input (no file chosen) yields no image.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PayloadTooLarge` when the body limit is exceeded
    /// and `AppError::BadRequest` for any other malformed body.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if !file_name.is_empty() && !data.is_empty() {
                    tracing::debug!(%file_name, %content_type, size = data.len(), "Image received");
                    submission.image = Some(StoredImage::new(file_name, content_type, data.to_vec()));
                }
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            submission.fields.entry(name).or_default().push(value);
        }

        Ok(submission)
    }

    /// First value of a text field, or empty.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Every value of a repeated field, in submission order.
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<String> {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Take the uploaded image, if any.
    pub fn take_image(&mut self) -> Option<StoredImage> {
        self.image.take()
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
