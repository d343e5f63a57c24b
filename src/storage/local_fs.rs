use super::*;
use crate::errors::StartupError;
use futures::StreamExt;
use std::io;
use std::path::Component;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{error, warn};

/// Name prefix of uploads still being received. Such entries are not listed.
const PARTIAL_PREFIX: &str = ".upload-";

/// Flat directory of uploaded files. The directory listing is the only index.
pub struct LocalFileStorage {
    storage_path: PathBuf,
    canonical_root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(storage_path: PathBuf) -> Result<Self, StartupError> {
        let dir_error = |source| StartupError::StorageDir {
            path: storage_path.clone(),
            source,
        };

        if !storage_path.exists() {
            std::fs::create_dir_all(&storage_path).map_err(dir_error)?;
        }
        let canonical_root = std::fs::canonicalize(&storage_path).map_err(dir_error)?;

        Ok(Self {
            storage_path,
            canonical_root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    async fn write_body(file: &mut File, mut body: ByteStream<'_>) -> Result<u64, ApiError> {
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(|e| {
                error!("Failed to write upload: {e}");
                ApiError::internal("Failed to save file")
            })?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| {
            error!("Failed to flush upload: {e}");
            ApiError::internal("Failed to save file")
        })?;
        Ok(written)
    }
}

/// Collapses `.` and `..` and requires the result to be a single entry of the
/// storage directory. A leading `/` is treated as relative to the directory.
fn clean_name(name: &str) -> Result<PathBuf, ApiError> {
    let invalid = || ApiError::bad_request("Invalid filename");

    let mut clean = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir => {
                if !clean.pop() {
                    return Err(invalid());
                }
            }
            Component::Prefix(_) => return Err(invalid()),
        }
    }

    match clean.components().count() {
        0 => Err(ApiError::bad_request("Filename not provided")),
        1 => Ok(clean),
        _ => Err(invalid()),
    }
}

#[async_trait]
impl Storage for LocalFileStorage {
    async fn save(&self, name: &str, body: ByteStream<'_>) -> Result<u64, ApiError> {
        let file_path = self.storage_path.join(clean_name(name)?);

        // The body is staged next to the target so a rejected upload never
        // touches an existing file of the same name.
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&self.storage_path)
            .map_err(|e| {
                error!("Failed to stage upload for {}: {e}", file_path.display());
                ApiError::internal("Failed to create file")
            })?
            .into_parts();
        let mut file = File::from_std(file);

        let written = Self::write_body(&mut file, body).await?;
        drop(file);

        fs::rename(&temp_path, &file_path).await.map_err(|e| {
            error!("Failed to move upload into {}: {e}", file_path.display());
            ApiError::internal("Failed to save file")
        })?;
        // Nothing is left at the staging path; dropping it only forgets the name.
        drop(temp_path);

        Ok(written)
    }

    async fn list(&self) -> Result<Vec<StoredFile>, ApiError> {
        let read_error = |e: io::Error| {
            error!("Failed to read {}: {e}", self.storage_path.display());
            ApiError::internal("Failed to read files directory")
        };

        let mut entries = fs::read_dir(&self.storage_path).await.map_err(read_error)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            // Entries whose metadata can't be read are left out of the listing.
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if meta.is_dir() || name.starts_with(PARTIAL_PREFIX) {
                continue;
            }
            let Ok(modified) = meta.modified() else {
                continue;
            };

            files.push(StoredFile {
                name,
                size: meta.len(),
                upload_date: modified.into(),
            });
        }

        Ok(files)
    }

    async fn locate(&self, name: &str) -> Result<PathBuf, ApiError> {
        let file_path = self.storage_path.join(clean_name(name)?);

        let meta = match fs::metadata(&file_path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ApiError::NotFound),
            Err(e) => {
                error!("Failed to stat {}: {e}", file_path.display());
                return Err(ApiError::internal("Failed to read file"));
            }
        };
        if !meta.is_file() {
            return Err(ApiError::NotFound);
        }

        let canonical = fs::canonicalize(&file_path).await.map_err(|e| {
            error!("Failed to resolve {}: {e}", file_path.display());
            ApiError::internal("Failed to read file")
        })?;
        if !canonical.starts_with(&self.canonical_root) {
            warn!(
                "Refusing {} which resolves outside the storage directory",
                file_path.display()
            );
            return Err(ApiError::NotFound);
        }

        Ok(file_path)
    }

    async fn delete(&self, name: &str) -> Result<(), ApiError> {
        let file_path = self.locate(name).await?;

        fs::remove_file(&file_path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ApiError::NotFound
            } else {
                error!("Failed to delete {}: {e}", file_path.display());
                ApiError::internal("Failed to delete file")
            }
        })
    }
}
