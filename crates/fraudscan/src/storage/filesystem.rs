use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::StorageError;
use crate::sanitize;

/// Rename, falling back to copy + remove for cross-device moves.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    let move_error = |source| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    };
    std::fs::copy(src, dst).map_err(move_error)?;
    std::fs::remove_file(src).map_err(move_error)?;
    Ok(())
}

fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], Some(&filename[dot..])),
        _ => (filename, None),
    }
}

/// Writes uploaded files into per-kind storage directories.
///
/// Uploads from concurrent requests share directories, so every stored name
/// is made unique with a random prefix and created with `create_new`.
#[derive(Debug, Clone, Default)]
pub struct FileStorage;

impl FileStorage {
    pub fn new() -> Self {
        Self
    }

    /// Stores `content` as `<uuid>_<sanitized suggested name>` and returns its
    /// absolute path. Creates `directory` if needed.
    pub fn save_file(
        &self,
        content: &[u8],
        directory: &Path,
        suggested_name: &str,
    ) -> Result<PathBuf, StorageError> {
        let safe_name = sanitize::sanitize_file_name(suggested_name)
            .ok_or_else(|| StorageError::InvalidFileName(suggested_name.to_string()))?;
        self.ensure_directory(directory)?;

        let path = directory.join(format!("{}_{}", Uuid::new_v4(), safe_name));
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::FileExists(path));
            }
            Err(source) => return Err(StorageError::WriteFile { path, source }),
        };

        file.write_all(content)
            .map_err(|source| StorageError::WriteFile {
                path: path.clone(),
                source,
            })?;

        absolute(path)
    }

    /// Stores `content` under exactly `file_name`, replacing an earlier file
    /// of the same name.
    pub fn save_as(
        &self,
        content: &[u8],
        directory: &Path,
        file_name: &str,
    ) -> Result<PathBuf, StorageError> {
        let safe_name = sanitize::sanitize_file_name(file_name)
            .ok_or_else(|| StorageError::InvalidFileName(file_name.to_string()))?;
        self.ensure_directory(directory)?;

        let path = directory.join(safe_name);
        std::fs::write(&path, content).map_err(|source| StorageError::WriteFile {
            path: path.clone(),
            source,
        })?;

        absolute(path)
    }

    /// Moves a processed file into `archive_directory` as
    /// `<YYYY-MM-DD>_<name>`, numbering on conflict.
    pub fn archive(
        &self,
        source_path: &Path,
        archive_directory: &Path,
    ) -> Result<PathBuf, StorageError> {
        self.ensure_directory(archive_directory)?;

        let original_name = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let archive_name = format!("{}_{}", Utc::now().format("%Y-%m-%d"), original_name);
        let archive_path = self.resolve_conflict(archive_directory, &archive_name)?;

        move_file(source_path, &archive_path)?;
        absolute(archive_path)
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.is_dir() {
            std::fs::create_dir_all(path).map_err(|source| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn resolve_conflict(&self, directory: &Path, filename: &str) -> Result<PathBuf, StorageError> {
        let path = directory.join(filename);
        if std::fs::symlink_metadata(&path).is_err() {
            return Ok(path);
        }

        let (base, ext) = split_extension(filename);
        for counter in 2..=1000 {
            let candidate = directory.join(format!("{}_{}{}", base, counter, ext.unwrap_or("")));
            if std::fs::symlink_metadata(&candidate).is_err() {
                return Ok(candidate);
            }
        }

        Err(StorageError::FileExists(path))
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf, StorageError> {
    std::path::absolute(&path).map_err(|source| StorageError::WriteFile { path, source })
}
