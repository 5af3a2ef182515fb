/// UI components
///
/// - grid.rs: the placed tiles of the gallery
/// - viewer.rs: full-window viewer and its info text
/// - editor.rs: edit toolbar and preview

pub mod editor;
pub mod grid;
pub mod viewer;
