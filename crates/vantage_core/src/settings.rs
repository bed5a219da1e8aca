//! Render Settings
//!
//! Process-wide toggles that feed variant-key construction. They are read
//! once, when a key is built; changing them afterwards does not affect
//! programs that were already compiled.
//!
//! ```rust,ignore
//! let settings = RenderSettings::from_json_str(r#"{ "quantizeVertices": true }"#)?;
//! assert!(settings.quantize_vertices);
//! assert!(!settings.use_object_colors);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Rendering toggles shared by every program variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Colour objects with a per-object uniform instead of vertex colours.
    pub use_object_colors: bool,
    /// Vertex positions are uploaded quantized.
    pub quantize_vertices: bool,
    /// Normals are uploaded quantized.
    pub quantize_normals: bool,
    /// Vertex colours are uploaded quantized.
    pub quantize_colors: bool,
}

impl RenderSettings {
    /// Parses settings from JSON. Missing fields default to `false`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&text)?;
        log::debug!("Loaded render settings from {}: {settings:?}", path.as_ref().display());
        Ok(settings)
    }
}
