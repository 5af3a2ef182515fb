//! Test fixtures shared by the gallery tests
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::channel::oneshot;
use parking_lot::Mutex;

use super::item::{DiscoveredImage, SourceRef};
use super::layout::Rect;
use super::visibility::{LoadJob, VisibilityMode};
use super::Gallery;
use crate::error::AccessError;
use crate::loader::{DirEntry, EntryKind, FileAccessor, FileBytes};

pub const ROOT: &str = "/gallery";

/// Encode a solid PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A discovered image at `ROOT/<relative>`
pub fn discovered(relative: &str) -> DiscoveredImage {
    let path = Path::new(ROOT).join(relative);
    let parent = path.parent().unwrap().to_path_buf();
    DiscoveredImage {
        name: path.file_name().unwrap().to_string_lossy().into_owned(),
        display_path: relative.to_string(),
        source: SourceRef { path, parent },
    }
}

/// A gallery over `names` (4x2 PNGs each), sized 1000x800 with no layout run yet
pub fn gallery_with(names: &[&str], mode: VisibilityMode) -> (Arc<MemoryFs>, Gallery) {
    let files: Vec<(&str, Vec<u8>)> = names.iter().map(|n| (*n, png_bytes(4, 2))).collect();
    let fs = MemoryFs::with_files(&files);
    let mut gallery = Gallery::new(fs.clone(), mode);
    gallery.replace_all(PathBuf::from(ROOT), names.iter().map(|n| discovered(n)).collect());
    gallery.set_container_width(1000.0);
    gallery.set_viewport(Rect::new(0.0, 0.0, 1000.0, 800.0));
    (fs, gallery)
}

/// Run jobs through metadata and resource loading like the UI does
pub async fn drive(gallery: &mut Gallery, jobs: Vec<LoadJob>) {
    for job in jobs {
        let meta = gallery.resources().ensure_metadata(job.item).await;
        if let Some(job) = gallery.on_metadata(job, &meta) {
            let resource = gallery.resources().ensure_resource(job.item).await;
            gallery.on_resource(job, &resource);
        }
    }
}

/// A gallery with every tile loaded
pub async fn loaded(names: &[&str]) -> (Arc<MemoryFs>, Gallery) {
    let (fs, mut gallery) = gallery_with(names, VisibilityMode::default());
    let jobs = gallery.on_frame();
    assert_eq!(jobs.len(), names.len());
    drive(&mut gallery, jobs).await;
    (fs, gallery)
}

/// In-memory `FileAccessor` that counts reads and can hold a read open
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    reads: AtomicUsize,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    deny_writes: AtomicBool,
}

impl MemoryFs {
    pub fn with_files(files: &[(&str, Vec<u8>)]) -> Arc<Self> {
        let fs = Self::default();
        for (relative, bytes) in files {
            fs.insert(relative, bytes.clone());
        }
        Arc::new(fs)
    }

    pub fn insert(&self, relative: &str, bytes: Vec<u8>) {
        self.files.lock().insert(Path::new(ROOT).join(relative), bytes);
    }

    pub fn delete(&self, relative: &str) {
        self.files.lock().remove(&Path::new(ROOT).join(relative));
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.files.lock().contains_key(&Path::new(ROOT).join(relative))
    }

    pub fn contents(&self, relative: &str) -> Option<Vec<u8>> {
        self.files.lock().get(&Path::new(ROOT).join(relative)).cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// The next read blocks until the returned sender fires
    pub fn hold_next_read(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }

    pub fn deny_writes(&self) {
        self.deny_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileAccessor for MemoryFs {
    async fn list_entries(&self, dir: &Path) -> Result<Vec<DirEntry>, AccessError> {
        let files = self.files.lock();
        let mut seen_dirs = BTreeSet::new();
        let mut entries = Vec::new();

        for path in files.keys() {
            let Ok(rest) = path.strip_prefix(dir) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            if components.next().is_none() {
                entries.push(DirEntry {
                    name,
                    kind: EntryKind::File,
                    path: path.clone(),
                });
            } else if seen_dirs.insert(name.clone()) {
                entries.push(DirEntry {
                    path: dir.join(&name),
                    name,
                    kind: EntryKind::Directory,
                });
            }
        }

        if entries.is_empty() && dir != Path::new(ROOT) {
            return Err(AccessError::NotFound(dir.display().to_string()));
        }
        // Enumeration order is deliberately not sorted
        entries.reverse();
        Ok(entries)
    }

    async fn read_bytes(&self, file: &Path) -> Result<FileBytes, AccessError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        tokio::task::yield_now().await;

        let bytes = self
            .files
            .lock()
            .get(file)
            .cloned()
            .ok_or_else(|| AccessError::NotFound(file.display().to_string()))?;
        Ok(FileBytes::new(bytes, file))
    }

    async fn write(&self, file: &Path, bytes: Vec<u8>) -> Result<(), AccessError> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(AccessError::PermissionDenied(file.display().to_string()));
        }
        self.files.lock().insert(file.to_path_buf(), bytes);
        Ok(())
    }

    async fn remove(&self, parent: &Path, name: &str) -> Result<(), AccessError> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(AccessError::PermissionDenied(name.to_string()));
        }
        let path = parent.join(name);
        match self.files.lock().remove(&path) {
            Some(_) => Ok(()),
            None => Err(AccessError::NotFound(path.display().to_string())),
        }
    }
}
