/// fontl-core: the card catalog behind a small font library
///
/// Point it at a folder full of font files and it will remember who each of
/// them is. Every font gets a little JSON note pinned next to it (the
/// sidecar) with its display name, where it came from, whether it may be used
/// commercially, and which projects and tags it belongs to.
///
/// ## What lives here
///
/// **Discovery**: walking the folder tree for `.ttf`, `.otf`, `.woff`,
/// `.woff2` and `.eot` files, in any letter case.
///
/// **Catalog**: the filename → (path, metadata) index, backed by sidecars
/// that are created on first sight and rewritten whole on every edit.
///
/// **Content**: MIME types and ready-to-paste `@font-face` rules for each
/// font, plus the sorted listing the web UI and CLI print.
///
/// ## A Sample Conversation
///
/// ```rust,no_run
/// use fontl_core::catalog::Catalog;
/// use fontl_core::metadata::FontMetadata;
///
/// let catalog = Catalog::new("/srv/fonts");
/// catalog.load()?;
///
/// catalog.update_metadata(
///     "Inter.woff2",
///     FontMetadata::default().with_name("Inter").with_tags(["ui", "body"]),
/// )?;
///
/// for font in catalog.listing() {
///     println!("{}\n  {}", font.name, font.css);
/// }
/// #
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// ---
///
/// Crafted with care at FontLab https://www.fontlab.com/

pub mod catalog;
pub mod content;
pub mod discovery;
pub mod error;
pub mod metadata;
pub mod output;

pub use catalog::{Catalog, CatalogEntry, CatalogOptions, DuplicatePolicy};
pub use error::{CatalogError, ErrorKind, Result};
pub use metadata::FontMetadata;
pub use output::FontData;
