//! Listing model and streaming output helpers (made by FontLab https://www.fontlab.com/)

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::content::generate_css;
use crate::metadata::{effective_name, FontMetadata};

/// One row of the public listing: effective name, key, metadata and CSS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontData {
    pub name: String,
    pub filename: String,
    pub metadata: FontMetadata,
    pub css: String,
}

impl FontData {
    pub fn new(filename: &str, metadata: &FontMetadata) -> Self {
        Self {
            name: effective_name(filename, metadata),
            filename: filename.to_string(),
            metadata: metadata.clone(),
            css: generate_css(filename, metadata),
        }
    }
}

/// Write the listing as a prettified JSON array.
pub fn write_json_pretty(fonts: &[FontData], mut w: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut w, fonts)?;
    w.write_all(b"\n")
}

/// Write the listing as newline-delimited JSON (NDJSON).
pub fn write_ndjson(fonts: &[FontData], mut w: impl Write) -> io::Result<()> {
    for item in fonts {
        serde_json::to_writer(&mut w, item)?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// Write `name<TAB>filename` lines.
pub fn write_plain(fonts: &[FontData], mut w: impl Write) -> io::Result<()> {
    for item in fonts {
        writeln!(w, "{}\t{}", item.name, item.filename)?;
    }
    Ok(())
}
