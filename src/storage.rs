use std::path::PathBuf;

use color_eyre::{eyre::WrapErr, Result};
use ulid::Ulid;

use crate::names;
use crate::services::upload::{ObjectStore, UploadFile};

/// Object storage on the local filesystem. Objects are served back through
/// `GET /files/{id}` under `public_url`.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStore {
    pub async fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .wrap_err_with(|| format!("could not create storage dir {}", root.display()))?;
        tracing::info!("object storage at {}", root.display());
        Ok(Self {
            root,
            public_url: public_url.into(),
        })
    }

    /// Reads an object back. Returns `None` for unknown or malformed ids.
    pub async fn read(&self, object_id: &str) -> Result<Option<(Vec<u8>, &'static str)>> {
        if !is_object_id(object_id) {
            return Ok(None);
        }

        match tokio::fs::read(self.root.join(object_id)).await {
            Ok(bytes) => Ok(Some((bytes, content_type(object_id)))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ObjectStore for LocalObjectStore {
    async fn put(&self, file: &UploadFile) -> Result<String> {
        let object_id = match extension(&file.file_name) {
            Some(ext) => format!("{}.{ext}", Ulid::new()),
            None => Ulid::new().to_string(),
        };

        tokio::fs::write(self.root.join(&object_id), &file.bytes)
            .await
            .wrap_err_with(|| format!("could not store {}", file.file_name))?;

        tracing::debug!("stored {} ({} bytes) as {object_id}", file.file_name, file.bytes.len());
        Ok(names::file_url(&self.public_url, &object_id))
    }
}

/// Lowercased extension of an uploaded name, if it is short and alphanumeric.
fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

fn is_object_id(object_id: &str) -> bool {
    let (stem, ext) = match object_id.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (object_id, None),
    };
    Ulid::from_string(stem).is_ok()
        && ext.map_or(true, |e| extension(&format!("x.{e}")).as_deref() == Some(e))
}

fn content_type(object_id: &str) -> &'static str {
    match object_id.rsplit_once('.').map(|(_, ext)| ext) {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
