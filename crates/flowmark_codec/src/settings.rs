// SPDX-License-Identifier: MIT OR Apache-2.0
//! Codec settings, stored as RON.

use crate::error::Result;
use crate::reader::ReaderOptions;
use crate::writer::WriterOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User-tunable codec settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Root element name used when the root has no transformer of its own
    pub root_element: String,
    /// Attribute carrying object identity tokens
    pub identity_attribute: String,
    /// Emit node objects before everything else
    pub nodes_first: bool,
    /// Write well-known colours by name instead of as ARGB integers
    pub named_colors: bool,
    /// Log path resolution diagnostics for every transformer
    pub trace: bool,
    /// Spaces per indentation level in written documents (0 = compact)
    pub indent: usize,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            root_element: "flow".to_string(),
            identity_attribute: "id".to_string(),
            nodes_first: true,
            named_colors: false,
            trace: false,
            indent: 2,
        }
    }
}

impl CodecSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Render settings as pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content)?;
        tracing::debug!(path = %path.display(), "loaded codec settings");
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Options for a [`crate::Writer`]
    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            root_element: self.root_element.clone(),
            nodes_first: self.nodes_first,
            named_colors: self.named_colors,
            trace: self.trace,
            indent: self.indent,
        }
    }

    /// Options for a [`crate::Reader`]
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions { trace: self.trace }
    }
}
