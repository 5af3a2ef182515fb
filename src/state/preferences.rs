use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PreferencesError;
use crate::gallery::layout::{LayoutMode, LayoutParams, GUTTER};

/// Allowed range for the minimum column width slider
pub const MIN_COL_WIDTH_RANGE: std::ops::RangeInclusive<u32> = 120..=480;
/// Allowed range for the target row height slider
pub const ROW_HEIGHT_RANGE: std::ops::RangeInclusive<u32> = 120..=640;

/// Layout preferences persisted between sessions
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/image-gallery/preferences.json
/// - macOS: ~/Library/Application Support/image-gallery/preferences.json
/// - Windows: %APPDATA%\image-gallery\preferences.json
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Preferences {
    #[serde(rename = "minColWidth")]
    pub min_col_width: u32,
    #[serde(rename = "rowHeight")]
    pub row_height: u32,
    /// Unknown values fall back to vertical
    #[serde(rename = "layoutMode", deserialize_with = "lenient_mode")]
    pub layout_mode: LayoutMode,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            min_col_width: 200,
            row_height: 320,
            layout_mode: LayoutMode::Vertical,
        }
    }
}

fn lenient_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LayoutMode, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

impl Preferences {
    /// Get the path where preferences are stored
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("image-gallery");
        path.push("preferences.json");
        Some(path)
    }

    /// Read preferences, falling back to defaults if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };

        match Self::from_json(&json) {
            Ok(prefs) => prefs.clamped(),
            Err(e) => {
                log::warn!("⚠️  Ignoring corrupt preferences at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write preferences, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PreferencesError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| PreferencesError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Pull hand-edited values back into the slider ranges
    pub fn clamped(self) -> Self {
        Self {
            min_col_width: self
                .min_col_width
                .clamp(*MIN_COL_WIDTH_RANGE.start(), *MIN_COL_WIDTH_RANGE.end()),
            row_height: self
                .row_height
                .clamp(*ROW_HEIGHT_RANGE.start(), *ROW_HEIGHT_RANGE.end()),
            layout_mode: self.layout_mode,
        }
    }

    /// Layout engine parameters for these preferences
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            gutter: GUTTER,
            min_col_width: self.min_col_width as f32,
            target_row_height: self.row_height as f32,
        }
    }
}
