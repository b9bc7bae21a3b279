//! Font discovery helpers for fontl-core (made by FontLab https://www.fontlab.com/)

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CatalogError, Result};

/// Extensions (lowercase, without the dot) the catalog treats as fonts.
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "woff", "woff2", "eot"];

/// Path to a candidate font file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSourceRef {
    pub path: PathBuf,
}

impl FontSourceRef {
    /// Base name of the file, the catalog's primary key.
    pub fn filename(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Trait for enumerating fonts from some backing store.
pub trait FontDiscovery {
    fn discover(&self) -> Result<Vec<FontSourceRef>>;
}

/// Recursive filesystem walker that collects web and desktop font formats.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    root: PathBuf,
    follow_symlinks: bool,
}

impl PathDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

impl FontDiscovery for PathDiscovery {
    fn discover(&self) -> Result<Vec<FontSourceRef>> {
        let root = &self.root;
        if !root.is_dir() {
            return Err(CatalogError::io(
                root,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "root directory does not exist",
                ),
            ));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root).follow_links(self.follow_symlinks) {
            let entry = entry.map_err(|source| CatalogError::Walk {
                path: source.path().unwrap_or(root).to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && is_font_file(entry.path()) {
                found.push(FontSourceRef {
                    path: entry.into_path(),
                });
            }
        }

        Ok(found)
    }
}

/// Extension test deciding whether a file is treated as a font.
pub fn is_font_file(path: &Path) -> bool {
    let ext = match path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(file_extension)
    {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return false,
    };

    FONT_EXTENSIONS.contains(&ext.as_str())
}

/// Text after the last `.` of the final path segment, without the dot.
///
/// Unlike [`Path::extension`], a leading dot counts: `.ttf` has extension
/// `ttf`, so a file named just `.ttf` is still a font.
pub fn file_extension(name: &str) -> Option<&str> {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rsplit_once('.').map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::is_font_file;
    use super::FontDiscovery;
    use super::PathDiscovery;
    use proptest::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn recognises_font_extensions() {
        assert!(is_font_file("/A/B/font.ttf".as_ref()));
        assert!(is_font_file("/A/B/font.OTF".as_ref()));
        assert!(is_font_file("/A/B/font.Woff2".as_ref()));
        assert!(is_font_file("/A/B/font.eot".as_ref()));
        assert!(!is_font_file("/A/B/font.ttc".as_ref()));
        assert!(!is_font_file("/A/B/font.ttf.fontl.json".as_ref()));
        assert!(!is_font_file("/A/B/font".as_ref()));
        assert!(is_font_file("/A/B/.ttf".as_ref()));
        assert!(!is_font_file("/A/B/.hidden".as_ref()));
    }

    #[test]
    fn extension_follows_last_dot_of_last_segment() {
        use super::file_extension;
        assert_eq!(file_extension("Foo.Regular.woff2"), Some("woff2"));
        assert_eq!(file_extension(".ttf"), Some("ttf"));
        assert_eq!(file_extension("dir.v2/font"), None);
        assert_eq!(file_extension("noext"), None);
    }

    proptest! {
        #[test]
        fn accepts_supported_extensions_in_any_case(
            stem in "[A-Za-z0-9_-]{1,12}",
            idx in 0usize..5,
            mask in any::<u8>(),
        ) {
            let ext: String = super::FONT_EXTENSIONS[idx]
                .chars()
                .enumerate()
                .map(|(i, c)| if mask & (1 << (i % 8)) != 0 { c.to_ascii_uppercase() } else { c })
                .collect();
            let name = format!("{stem}.{ext}");
            prop_assert!(is_font_file(Path::new(&name)));
        }

        #[test]
        fn rejects_other_extensions(stem in "[A-Za-z0-9_-]{1,12}", ext in "[a-z0-9]{1,6}") {
            let known = super::FONT_EXTENSIONS.contains(&ext.as_str());
            let name = format!("{stem}.{ext}");
            prop_assert_eq!(is_font_file(Path::new(&name)), known);
        }
    }

    #[test]
    fn discovers_nested_fonts() {
        let tmp = tempdir().expect("tempdir");
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).expect("mkdir");
        let font_path = nested.join("sample.woff");
        fs::write(&font_path, b"").expect("touch font");

        let fonts = PathDiscovery::new(tmp.path()).discover().expect("discover");

        assert!(fonts.iter().any(|f| f.path == font_path));
        assert_eq!(fonts[0].filename(), Some("sample.woff"));
    }

    #[test]
    fn skips_directories_named_like_fonts() {
        let tmp = tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join("folder.ttf")).expect("mkdir");

        let fonts = PathDiscovery::new(tmp.path()).discover().expect("discover");
        assert!(fonts.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinks_when_enabled() {
        use std::os::unix::fs::symlink;

        let tmp = tempdir().expect("tempdir");
        let real_dir = tmp.path().join("real");
        let root = tmp.path().join("root");
        fs::create_dir_all(&real_dir).expect("mkdir real");
        fs::create_dir_all(&root).expect("mkdir root");
        fs::write(real_dir.join("linked.otf"), b"").expect("touch font");
        symlink(&real_dir, root.join("link")).expect("symlink");

        let fonts = PathDiscovery::new(&root).discover().expect("discover");
        assert!(fonts.is_empty());

        let fonts = PathDiscovery::new(&root)
            .follow_symlinks(true)
            .discover()
            .expect("discover");
        assert!(fonts.iter().any(|f| f.path.ends_with("linked.otf")));
    }
}
