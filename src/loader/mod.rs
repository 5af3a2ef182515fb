/// Image source access
///
/// This module handles:
/// - Listing, reading, writing and deleting files through the `FileAccessor` seam
/// - Probing image dimensions without a full decode where possible

pub mod fs;
pub mod probe;

pub use fs::{DirEntry, EntryKind, FileAccessor, FileBytes, LocalFs};
pub use probe::probe_dimensions;
