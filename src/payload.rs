//! Outbound form payloads and image attachments.
//!
//! Every ask operation sends `multipart/form-data`. A [`Payload`] is the
//! transport-independent description of that form: an ordered list of named
//! text or file fields. The gateway turns it into a `reqwest` multipart form
//! only at send time, so request stages and tests can inspect it first.

use crate::errors::{ApiError, TransportError};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// MIME type used when a file name has no recognized image extension.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Detects an image MIME type from a file extension.
///
/// - `jpg`, `jpeg` → `image/jpeg`
/// - `png` → `image/png`
/// - `gif` → `image/gif`
/// - `webp` → `image/webp`
/// - `heic`, `heif` → `image/heic`
///
/// ```
/// use std::path::Path;
/// use agrigpt_client::detect_mime_type;
///
/// assert_eq!(detect_mime_type(Path::new("leaf.JPG")), Some("image/jpeg"));
/// assert_eq!(detect_mime_type(Path::new("notes.txt")), None);
/// ```
#[must_use]
pub fn detect_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" | "heif" => Some("image/heic"),
        _ => None,
    }
}

/// A binary image to attach to an ask request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    file_name: String,
    mime_type: String,
    data: Bytes,
}

impl ImageFile {
    /// Creates an attachment with an explicit MIME type.
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Creates an attachment, detecting the MIME type from `file_name`.
    pub fn from_bytes(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime_type = detect_mime_type(Path::new(&file_name)).unwrap_or(FALLBACK_MIME_TYPE);
        Self::new(file_name, mime_type, data)
    }

    /// Reads an image from disk, detecting the MIME type from its extension.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] with status 500 if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            let suggestion = match e.kind() {
                std::io::ErrorKind::NotFound => " Check that the file path is correct.",
                std::io::ErrorKind::PermissionDenied => " Check file permissions.",
                _ => "",
            };
            TransportError::Io(format!(
                "Failed to read file '{}': {}.{}",
                path.display(),
                e,
                suggestion
            ))
            .normalize()
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime_type = detect_mime_type(path).unwrap_or(FALLBACK_MIME_TYPE);

        tracing::debug!(
            "Loaded image {}: {} bytes, mime_type={}",
            path.display(),
            data.len(),
            mime_type
        );

        Ok(Self::new(file_name, mime_type, data))
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn into_part(self) -> Result<Part, TransportError> {
        let length = self.data.len() as u64;
        let part = Part::stream_with_length(self.data, length)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)?;
        Ok(part)
    }
}

/// The value of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File(ImageFile),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }

    #[must_use]
    pub fn as_file(&self) -> Option<&ImageFile> {
        match self {
            Self::File(file) => Some(file),
            Self::Text(_) => None,
        }
    }
}

/// An ordered multipart form description.
///
/// ```
/// use agrigpt_client::{ImageFile, Payload};
///
/// let payload = Payload::new()
///     .text("query", "Why are my tomato leaves curling?")
///     .optional_file("file", None::<ImageFile>);
/// assert_eq!(payload.field_names(), vec!["query"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(String, FieldValue)>,
}

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .push((name.into(), FieldValue::Text(value.into())));
        self
    }

    #[must_use]
    pub fn file(mut self, name: impl Into<String>, file: ImageFile) -> Self {
        self.fields.push((name.into(), FieldValue::File(file)));
        self
    }

    /// Adds a text field only when `value` is present.
    #[must_use]
    pub fn optional_text<S: Into<String>>(self, name: impl Into<String>, value: Option<S>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Adds a file field only when `file` is present.
    #[must_use]
    pub fn optional_file(self, name: impl Into<String>, file: Option<ImageFile>) -> Self {
        match file {
            Some(file) => self.file(name, file),
            None => self,
        }
    }

    /// Returns the first field named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_form(self) -> Result<Form, TransportError> {
        self.fields
            .into_iter()
            .try_fold(Form::new(), |form, (name, value)| match value {
                FieldValue::Text(text) => Ok(form.text(name, text)),
                FieldValue::File(file) => Ok(form.part(name, file.into_part()?)),
            })
    }
}
