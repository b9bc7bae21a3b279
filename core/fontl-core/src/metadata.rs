//! Per-font metadata and its JSON sidecar (made by FontLab https://www.fontlab.com/)
//!
//! Every font file in a catalog owns a sidecar at `<font-path>.fontl.json`.
//! The sidecar is the durable copy of [`FontMetadata`]; whatever sits in
//! memory is only a cache of these files, so writes always replace the whole
//! document rather than patching it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::discovery::file_extension;
use crate::error::{CatalogError, Result};

/// Suffix appended to a font's full file name to locate its sidecar.
pub const SIDECAR_SUFFIX: &str = ".fontl.json";

/// Everything we remember about a single font besides its bytes.
///
/// All fields are optional on disk: missing (or `null`) values fall back to
/// empty strings, `false` and empty lists. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontMetadata {
    /// Display name; empty means "derive from the filename".
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Free-text provenance, usually a license or download URL.
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub commercial_use: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub projects: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl FontMetadata {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_commercial_use(mut self, allowed: bool) -> Self {
        self.commercial_use = allowed;
        self
    }

    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects = projects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Name shown for a font: the stored display name, or the filename without
/// its extension when none was recorded.
///
/// Computed on every call so renaming the file renames the font too.
pub fn effective_name(filename: &str, metadata: &FontMetadata) -> String {
    if !metadata.name.is_empty() {
        return metadata.name.clone();
    }
    match file_extension(filename) {
        Some(ext) => filename[..filename.len() - ext.len() - 1].to_string(),
        None => filename.to_string(),
    }
}

/// Reject display names that could smuggle control characters into
/// generated CSS or HTML.
pub fn validate_display_name(name: &str) -> Result<()> {
    if name.chars().any(char::is_control) {
        return Err(CatalogError::Validation(
            "font name must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Location of the sidecar belonging to `font_path`.
pub fn sidecar_path(font_path: &Path) -> PathBuf {
    let mut raw = font_path.as_os_str().to_os_string();
    raw.push(SIDECAR_SUFFIX);
    PathBuf::from(raw)
}

/// Parse a sidecar document.
pub fn read_sidecar(path: &Path) -> Result<FontMetadata> {
    let data = fs::read(path).map_err(|e| CatalogError::io(path, e))?;
    serde_json::from_slice(&data).map_err(|e| CatalogError::json(path, e))
}

/// Replace a sidecar document in full (2-space indented JSON).
pub fn write_sidecar(path: &Path, metadata: &FontMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata).map_err(|e| CatalogError::json(path, e))?;
    fs::write(path, json).map_err(|e| CatalogError::io(path, e))
}
