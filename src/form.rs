//! `multipart/form-data` bodies built from optional fields

use bytes::Bytes;
use rentdesk_session::FormField;
use std::path::Path;

use crate::error::Error;

/// A file to upload, e.g. a room photo or a profile picture
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| Error::general(format!("Failed to read {}: {}", path.display(), err)))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| Error::general(format!("{} has no file name", path.display())))?;
        Ok(Self::new(file_name, data))
    }
}

/// Accumulates form fields; `None` values are skipped so that only
/// supplied fields reach the server
#[derive(Debug, Default)]
pub struct FormData {
    fields: Vec<FormField>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: &str, value: impl ToString) -> Self {
        self.fields.push(FormField::Text {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Append a text field if a value is present
    pub fn opt_text<T: ToString>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Append a file field if an upload is present
    pub fn opt_file(mut self, name: &str, upload: Option<&Upload>) -> Self {
        if let Some(upload) = upload {
            self.fields.push(FormField::File {
                name: name.to_string(),
                file_name: upload.file_name.clone(),
                content_type: upload.content_type.clone(),
                data: upload.data.clone(),
            });
        }
        self
    }

    pub fn into_fields(self) -> Vec<FormField> {
        self.fields
    }
}
