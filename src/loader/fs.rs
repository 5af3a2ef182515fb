/// File access seam for the gallery core
///
/// The gallery never touches the filesystem directly. Everything goes through
/// `FileAccessor` so the core can run against an in-memory tree in tests.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::task;
use walkdir::WalkDir;

use crate::error::AccessError;

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry returned by `FileAccessor::list_entries`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    pub path: PathBuf,
}

/// Raw file contents plus what the platform knows about them
#[derive(Debug, Clone)]
pub struct FileBytes {
    pub bytes: Vec<u8>,
    pub size: u64,
    pub mime: Option<String>,
}

impl FileBytes {
    pub fn new(bytes: Vec<u8>, path: &Path) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            size,
            mime: mime_for(path),
        }
    }
}

/// Directory/file operations consumed by the gallery core
#[async_trait]
pub trait FileAccessor: Send + Sync {
    /// List the direct children of `dir`
    async fn list_entries(&self, dir: &Path) -> Result<Vec<DirEntry>, AccessError>;

    /// Read the whole file
    async fn read_bytes(&self, file: &Path) -> Result<FileBytes, AccessError>;

    /// Replace the file's contents
    async fn write(&self, file: &Path, bytes: Vec<u8>) -> Result<(), AccessError>;

    /// Delete `name` inside `parent`
    async fn remove(&self, parent: &Path, name: &str) -> Result<(), AccessError>;
}

/// MIME type implied by the file extension
pub fn mime_for(path: &Path) -> Option<String> {
    image::ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

/// `FileAccessor` backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

#[async_trait]
impl FileAccessor for LocalFs {
    async fn list_entries(&self, dir: &Path) -> Result<Vec<DirEntry>, AccessError> {
        let dir = dir.to_path_buf();

        // walkdir is blocking, keep it off the UI executor
        task::spawn_blocking(move || list_entries_blocking(&dir))
            .await
            .map_err(|e| AccessError::Io(format!("Task join error: {}", e)))?
    }

    async fn read_bytes(&self, file: &Path) -> Result<FileBytes, AccessError> {
        let what = file.display().to_string();
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| AccessError::from_io(e, &what))?;
        Ok(FileBytes::new(bytes, file))
    }

    async fn write(&self, file: &Path, bytes: Vec<u8>) -> Result<(), AccessError> {
        let what = file.display().to_string();
        tokio::fs::write(file, bytes)
            .await
            .map_err(|e| AccessError::from_io(e, &what))
    }

    async fn remove(&self, parent: &Path, name: &str) -> Result<(), AccessError> {
        let path = parent.join(name);
        let what = path.display().to_string();
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| AccessError::from_io(e, &what))
    }
}

fn list_entries_blocking(dir: &Path) -> Result<Vec<DirEntry>, AccessError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            let what = e
                .path()
                .unwrap_or(dir)
                .display()
                .to_string();
            match e.into_io_error() {
                Some(io) => AccessError::from_io(io, &what),
                None => AccessError::Io(format!("filesystem loop at {}", what)),
            }
        })?;

        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            continue;
        };

        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
            path: entry.path().to_path_buf(),
        });
    }

    Ok(entries)
}
