/// State management module
///
/// This module handles application state that lives outside the gallery core:
/// - Persisted layout preferences (preferences.rs)
/// - Raster edits and their encoding (edit.rs)
/// - Deleting, saving and exporting files (writeback.rs)

pub mod edit;
pub mod preferences;
pub mod writeback;
