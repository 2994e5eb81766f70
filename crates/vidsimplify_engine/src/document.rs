use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is empty")]
    Empty(PathBuf),
}

/// A document read from disk, not yet encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub async fn read_document(path: &Path) -> Result<LoadedDocument, DocumentError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if bytes.is_empty() {
        return Err(DocumentError::Empty(path.to_path_buf()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        // The service decides; this is only a hint in the log.
        engine_warn!("{:?} does not look like a PDF", path);
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    engine_info!("Loaded document {} ({} bytes)", name, bytes.len());
    Ok(LoadedDocument { name, bytes })
}
