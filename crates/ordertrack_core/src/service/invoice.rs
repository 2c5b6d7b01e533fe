//! Invoice upload collaborator contract.
//!
//! The core never opens, inspects or streams invoice files. An uploader turns
//! a file descriptor into an opaque `InvoiceRef` that is stored on the order.

use crate::model::order::InvoiceRef;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Uploaded file as handed over by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError {
    pub file_name: String,
    pub message: String,
}

impl UploadError {
    pub fn new(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            message: message.into(),
        }
    }
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invoice upload failed for `{}`: {}",
            self.file_name, self.message
        )
    }
}

impl Error for UploadError {}

/// External file storage used when creating orders with an invoice.
pub trait InvoiceUploader: Send + Sync {
    fn upload(&self, file: &InvoiceFile) -> Result<InvoiceRef, UploadError>;
}
