//! # File Storage
//!
//! Series pictures, user pictures and lesson files live in object
//! storage; the catalog only keeps `(id, ext)`. [`MemoryStorage`] keeps
//! the objects in process and serves URLs under the configured object
//! storage host.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, Result},
};

use super::Service;

const PNG_MIME: &str = "image/png";
const JPEG_MIME: &str = "image/jpeg";
const PDF_MIME: &str = "application/pdf";
const DOC_MIME: &str = "application/msword";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const ODT_MIME: &str = "application/vnd.oasis.opendocument.text";
const ZIP_MIME: &str = "application/zip";

/// What an upload is accepted as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// png or jpeg
    Image,
    /// pdf, doc, docx, odt or zip
    Document,
}

impl ObjectKind {
    /// Extension stored for a mime type, `None` when this kind rejects it
    #[must_use]
    pub fn extension(self, mime: &str) -> Option<&'static str> {
        match (self, mime) {
            (Self::Image, PNG_MIME) => Some("png"),
            (Self::Image, JPEG_MIME) => Some("jpeg"),
            (Self::Document, PDF_MIME) => Some("pdf"),
            (Self::Document, DOC_MIME) => Some("doc"),
            (Self::Document, DOCX_MIME) => Some("docx"),
            (Self::Document, ODT_MIME) => Some("odt"),
            (Self::Document, ZIP_MIME) => Some("zip"),
            _ => None,
        }
    }
}

/// Mime type read from the leading bytes.
///
/// docx and odt are zip containers, so for a zip the declared content type
/// decides between the three.
#[must_use]
pub fn detect_mime<'a>(bytes: &[u8], declared: Option<&'a str>) -> Option<&'a str> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = b"\xff\xd8\xff";
    const PDF: &[u8] = b"%PDF-";
    const OLE: &[u8] = b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1";
    const ZIP: &[u8] = b"PK\x03\x04";

    if bytes.starts_with(PNG) {
        Some(PNG_MIME)
    } else if bytes.starts_with(JPEG) {
        Some(JPEG_MIME)
    } else if bytes.starts_with(PDF) {
        Some(PDF_MIME)
    } else if bytes.starts_with(OLE) {
        Some(DOC_MIME)
    } else if bytes.starts_with(ZIP) {
        match declared {
            Some(mime @ (DOCX_MIME | ODT_MIME)) => Some(mime),
            _ => Some(ZIP_MIME),
        }
    } else {
        None
    }
}

/// Object store for lesson files and pictures, keyed by `(id, ext)`
#[async_trait]
pub trait FileStorage: Service {
    /// Stores the object and returns its id and extension
    async fn upload(&self, kind: ObjectKind, bytes: &[u8], declared: Option<&str>) -> Result<(Uuid, String)>;

    /// Public URL, `None` when the object does not exist
    async fn url(&self, id: Uuid, ext: &str) -> Option<String>;

    async fn delete(&self, id: Uuid, ext: &str) -> Result<()>;
}

// =====================================
// MemoryStorage
// =====================================
#[derive(Debug)]
pub struct MemoryStorage {
    config: Arc<Config>,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl Service for MemoryStorage {}

impl MemoryStorage {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            objects: RwLock::new(HashMap::new()),
        }
    }

    fn key(id: Uuid, ext: &str) -> String {
        format!("{}.{}", id, ext)
    }
}

#[async_trait]
impl FileStorage for MemoryStorage {
    async fn upload(&self, kind: ObjectKind, bytes: &[u8], declared: Option<&str>) -> Result<(Uuid, String)> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }

        let ext = detect_mime(bytes, declared)
            .and_then(|mime| kind.extension(mime))
            .ok_or_else(|| AppError::Validation("Mime type not supported".to_string()))?;

        let id = Uuid::new_v4();
        self.objects
            .write()
            .await
            .insert(Self::key(id, ext), bytes.to_vec());

        info!(object_id = %id, ext, size = bytes.len(), "Object stored");
        Ok((id, ext.to_string()))
    }

    async fn url(&self, id: Uuid, ext: &str) -> Option<String> {
        let key = Self::key(id, ext);
        if !self.objects.read().await.contains_key(&key) {
            debug!(key = %key, "Object missing");
            return None;
        }

        Some(format!("{}/{}", self.config.object_storage_host.trim_end_matches('/'), key))
    }

    async fn delete(&self, id: Uuid, ext: &str) -> Result<()> {
        self.objects.write().await.remove(&Self::key(id, ext));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn storage() -> MemoryStorage {
        MemoryStorage::new(Arc::new(Config::default()))
    }

    #[test]
    fn test_zip_containers_follow_declared_type() {
        let zip = b"PK\x03\x04rest";
        assert_eq!(detect_mime(zip, Some(DOCX_MIME)), Some(DOCX_MIME));
        assert_eq!(detect_mime(zip, Some("image/png")), Some(ZIP_MIME));
        assert_eq!(detect_mime(zip, None), Some(ZIP_MIME));
    }

    #[test]
    fn test_declared_type_cannot_fake_an_image() {
        assert_eq!(detect_mime(b"plain text", Some(PNG_MIME)), None);
    }

    #[test]
    fn test_kind_filters_extensions() {
        assert_eq!(ObjectKind::Image.extension(JPEG_MIME), Some("jpeg"));
        assert_eq!(ObjectKind::Image.extension(PDF_MIME), None);
        assert_eq!(ObjectKind::Document.extension(ODT_MIME), Some("odt"));
    }

    #[tokio::test]
    async fn test_upload_then_resolve_and_delete() {
        let storage = storage();
        let (id, ext) = storage.upload(ObjectKind::Image, PNG_BYTES, None).await.unwrap();
        assert_eq!(ext, "png");

        let url = storage.url(id, &ext).await.expect("url");
        assert!(url.ends_with(&format!("/{id}.png")));

        storage.delete(id, &ext).await.unwrap();
        assert_eq!(storage.url(id, &ext).await, None);
    }

    #[tokio::test]
    async fn test_image_slot_rejects_documents() {
        let err = storage()
            .upload(ObjectKind::Image, b"%PDF-1.7", Some(PDF_MIME))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
