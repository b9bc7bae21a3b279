//! The font catalog: directory scan, sidecar persistence and lookup
//! (made by FontLab https://www.fontlab.com/)
//!
//! A [`Catalog`] owns one root directory. [`Catalog::load`] walks it, pairs
//! every font with its sidecar (creating missing ones) and swaps the result in
//! as the new index. After that the index is only touched through
//! [`Catalog::add_font`] and [`Catalog::update_metadata`], which rewrite the
//! affected sidecar before the in-memory copy changes.
//!
//! The catalog is safe to share between request handlers: mutations are
//! serialized by a single lock and readers always see whole entries.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use log::{debug, info, warn};

use crate::discovery::{is_font_file, FontDiscovery, PathDiscovery};
use crate::error::{CatalogError, Result};
use crate::metadata::{read_sidecar, sidecar_path, write_sidecar, FontMetadata};
use crate::output::FontData;

/// What to do when two files in different folders share a base name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail the load and name both paths.
    #[default]
    Reject,
    /// Keep whichever file the walk reaches last.
    LastWins,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub follow_symlinks: bool,
    pub duplicates: DuplicatePolicy,
}

impl CatalogOptions {
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }
}

/// Read-only view of one indexed font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub filename: String,
    pub path: PathBuf,
    pub metadata: FontMetadata,
}

#[derive(Debug, Clone)]
struct IndexedFont {
    path: PathBuf,
    metadata: FontMetadata,
}

type Index = HashMap<String, IndexedFont>;

#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    options: CatalogOptions,
    index: RwLock<Index>,
    write_lock: Mutex<()>,
}

impl Catalog {
    /// Empty catalog over `root`; call [`Catalog::load`] to populate it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, CatalogOptions::default())
    }

    pub fn with_options(root: impl Into<PathBuf>, options: CatalogOptions) -> Self {
        Self {
            root: root.into(),
            options,
            index: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild the index from disk, returning the number of fonts found.
    ///
    /// Missing sidecars are created with default metadata. Any failure aborts
    /// the whole load and leaves the previous index in place.
    pub fn load(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let discovery =
            PathDiscovery::new(&self.root).follow_symlinks(self.options.follow_symlinks);
        let mut fresh = Index::new();

        for source in discovery.discover()? {
            let Some(filename) = source.filename().map(str::to_string) else {
                warn!("skipping font with non UTF-8 name: {}", source.path.display());
                continue;
            };
            let metadata = load_or_create_sidecar(&source.path)?;

            match fresh.entry(filename) {
                MapEntry::Vacant(slot) => {
                    slot.insert(IndexedFont {
                        path: source.path,
                        metadata,
                    });
                }
                MapEntry::Occupied(mut slot) => match self.options.duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(CatalogError::DuplicateName {
                            filename: slot.key().clone(),
                            first: slot.get().path.clone(),
                            second: source.path,
                        });
                    }
                    DuplicatePolicy::LastWins => {
                        warn!(
                            "{} shadows {}",
                            source.path.display(),
                            slot.get().path.display()
                        );
                        slot.insert(IndexedFont {
                            path: source.path,
                            metadata,
                        });
                    }
                },
            }
        }

        let count = fresh.len();
        *self.write_index() = fresh;
        info!("loaded {count} fonts from {}", self.root.display());
        Ok(count)
    }

    /// Register a font that already sits at `path` and write its sidecar.
    ///
    /// The file is neither moved nor copied. Re-adding a path replaces its
    /// metadata; adding a different file with an indexed base name conflicts.
    pub fn add_font(&self, path: &Path, metadata: FontMetadata) -> Result<()> {
        if !is_font_file(path) {
            return Err(CatalogError::Validation(format!(
                "file is not a supported font type: {}",
                display_name(path)
            )));
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CatalogError::Validation("font filename must be UTF-8".to_string()))?
            .to_string();

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if !path.is_file() {
            return Err(CatalogError::NotFound(format!(
                "font file does not exist: {filename}"
            )));
        }
        if let Some(existing) = self.read_index().get(&filename) {
            if existing.path != path {
                return Err(CatalogError::Conflict(format!(
                    "a font named {filename} is already cataloged"
                )));
            }
        }

        write_sidecar(&sidecar_path(path), &metadata)?;
        self.write_index().insert(
            filename,
            IndexedFont {
                path: path.to_path_buf(),
                metadata,
            },
        );
        Ok(())
    }

    /// Replace the metadata of an indexed font and rewrite its sidecar in full.
    pub fn update_metadata(&self, filename: &str, metadata: FontMetadata) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self
            .read_index()
            .get(filename)
            .map(|font| font.path.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("font not in catalog: {filename}")))?;

        write_sidecar(&sidecar_path(&path), &metadata)?;
        if let Some(font) = self.write_index().get_mut(filename) {
            font.metadata = metadata;
        }
        Ok(())
    }

    /// Snapshot of filename → metadata. Order is unspecified.
    pub fn fonts(&self) -> HashMap<String, FontMetadata> {
        self.read_index()
            .iter()
            .map(|(name, font)| (name.clone(), font.metadata.clone()))
            .collect()
    }

    /// Snapshot of every entry, sorted by filename.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = self
            .read_index()
            .iter()
            .map(|(name, font)| CatalogEntry {
                filename: name.clone(),
                path: font.path.clone(),
                metadata: font.metadata.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        entries
    }

    /// Display listing sorted by effective name, ties broken by filename.
    pub fn listing(&self) -> Vec<FontData> {
        let mut list: Vec<FontData> = self
            .read_index()
            .iter()
            .map(|(name, font)| FontData::new(name, &font.metadata))
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.filename.cmp(&b.filename)));
        list
    }

    pub fn get(&self, filename: &str) -> Option<FontMetadata> {
        self.read_index().get(filename).map(|f| f.metadata.clone())
    }

    pub fn font_path(&self, filename: &str) -> Option<PathBuf> {
        self.read_index().get(filename).map(|f| f.path.clone())
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.read_index().contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.read_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_index().is_empty()
    }

    /// Open a font for reading.
    ///
    /// `name` is looked up in the index first; failing that it is treated as
    /// a path relative to the root, which lets not-yet-indexed files be
    /// served. Relative paths may only descend, never climb out of the root.
    pub fn open_font(&self, name: &str) -> Result<File> {
        let not_found = || CatalogError::NotFound(format!("font not found: {name}"));
        let path = match self.font_path(name) {
            Some(path) => path,
            None => relative_to(&self.root, name).ok_or_else(not_found)?,
        };

        // Directories open fine on unix and FIFOs block in open(2).
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                debug!("{} is not a regular file", path.display());
                return Err(not_found());
            }
            Err(err) => {
                debug!("stat {} failed: {err}", path.display());
                return Err(not_found());
            }
        }

        File::open(&path).map_err(|err| {
            debug!("open {} failed: {err}", path.display());
            not_found()
        })
    }

    /// Root-level destination for an uploaded file called `filename`.
    pub fn upload_path(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    fn read_index(&self) -> std::sync::RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> std::sync::RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_or_create_sidecar(font_path: &Path) -> Result<FontMetadata> {
    let sidecar = sidecar_path(font_path);
    if sidecar.exists() {
        return read_sidecar(&sidecar);
    }

    let metadata = FontMetadata::default();
    write_sidecar(&sidecar, &metadata)?;
    debug!("created {}", sidecar.display());
    Ok(metadata)
}

/// Accept only a bare font filename: no separators, no `.`/`..`, no control
/// characters, and a recognised font extension.
pub fn validate_filename(filename: &str) -> Result<()> {
    let bare = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\'])
        && !filename.chars().any(char::is_control);
    if !bare {
        return Err(CatalogError::Validation(
            "font filename must be a plain file name".to_string(),
        ));
    }
    if !is_font_file(Path::new(filename)) {
        return Err(CatalogError::Validation(
            "invalid font file type".to_string(),
        ));
    }
    Ok(())
}

fn relative_to(root: &Path, name: &str) -> Option<PathBuf> {
    let rel = Path::new(name);
    let mut components = rel.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(root.join(rel))
    } else {
        None
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn relative_paths_cannot_escape_root() {
        let root = Path::new("/srv/fonts");
        assert_eq!(
            relative_to(root, "sub/A.ttf"),
            Some(PathBuf::from("/srv/fonts/sub/A.ttf"))
        );
        assert_eq!(relative_to(root, "../etc/passwd"), None);
        assert_eq!(relative_to(root, "sub/../../x.ttf"), None);
        assert_eq!(relative_to(root, "/etc/passwd"), None);
        assert_eq!(relative_to(root, ""), None);
    }

    #[test]
    fn filename_validation() {
        assert!(validate_filename("Arial.ttf").is_ok());
        assert!(validate_filename("Inter Var.WOFF2").is_ok());
        assert!(validate_filename("notes.txt").is_err());
        assert!(validate_filename("../Arial.ttf").is_err());
        assert!(validate_filename("dir\\Arial.ttf").is_err());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("..").is_err());
    }

    #[test]
    fn open_font_falls_back_to_root_relative_path() {
        let tmp = tempdir().expect("tempdir");
        let catalog = Catalog::new(tmp.path());
        fs::create_dir_all(tmp.path().join("late")).expect("mkdir");
        fs::write(tmp.path().join("late/New.otf"), b"OTTO").expect("write");

        let mut file = catalog.open_font("late/New.otf").expect("open");
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).expect("read");
        assert_eq!(buf, b"OTTO");

        let err = catalog.open_font("missing.ttf").expect_err("missing");
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert!(!err.to_string().contains(&*tmp.path().to_string_lossy()));
    }

    #[test]
    fn open_font_refuses_directories() {
        let tmp = tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join("sub")).expect("mkdir");
        fs::create_dir_all(tmp.path().join("Folder.ttf")).expect("mkdir");
        let catalog = Catalog::new(tmp.path());
        catalog.load().expect("load");

        for name in ["sub", "Folder.ttf"] {
            let err = catalog.open_font(name).expect_err("directory");
            assert_eq!(err.kind(), crate::error::ErrorKind::NotFound, "{name}");
        }
    }

    #[test]
    fn open_font_prefers_the_indexed_path() {
        let tmp = tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join("nested")).expect("mkdir");
        fs::write(tmp.path().join("nested/Deep.woff2"), b"wOF2-deep").expect("write");
        let catalog = Catalog::new(tmp.path());
        catalog.load().expect("load");

        let mut file = catalog.open_font("Deep.woff2").expect("open");
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).expect("read");
        assert_eq!(buf, b"wOF2-deep");
    }

    #[test]
    fn failed_load_keeps_previous_index() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join("A.ttf"), b"a").expect("write");
        let catalog = Catalog::new(tmp.path());
        assert_eq!(catalog.load().expect("first load"), 1);

        fs::write(tmp.path().join("B.ttf"), b"b").expect("write");
        fs::write(tmp.path().join("B.ttf.fontl.json"), b"nope").expect("write");
        assert!(catalog.load().is_err());

        assert!(catalog.contains("A.ttf"));
        assert!(!catalog.contains("B.ttf"));
    }
}
