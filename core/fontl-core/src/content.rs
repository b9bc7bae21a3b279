//! MIME types and `@font-face` rules derived from catalog entries
//! (made by FontLab https://www.fontlab.com/)

use crate::discovery::file_extension;
use crate::metadata::{effective_name, FontMetadata};

/// URL prefix under which font bytes are served.
pub const FONT_URL_PREFIX: &str = "/fonts/";

/// Fallback for anything we do not recognise.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type for a font filename, matched case-insensitively on extension.
pub fn content_type(filename: &str) -> &'static str {
    let ext = file_extension(filename).map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("eot") => "application/vnd.ms-fontobject",
        _ => OCTET_STREAM,
    }
}

/// Minimal `@font-face` rule pointing at the served font.
pub fn generate_css(filename: &str, metadata: &FontMetadata) -> String {
    let family = effective_name(filename, metadata);
    format!(
        "@font-face {{ font-family: '{}'; src: url('{}{}'); }}",
        escape_css_string(&family),
        FONT_URL_PREFIX,
        escape_css_string(filename)
    )
}

/// Make `raw` safe inside a single-quoted CSS string.
///
/// Backslashes and quotes become CSS escapes; control characters are dropped.
pub fn escape_css_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn maps_known_extensions() {
        assert_eq!(content_type("A.ttf"), "font/ttf");
        assert_eq!(content_type("A.OTF"), "font/otf");
        assert_eq!(content_type("A.woff"), "font/woff");
        assert_eq!(content_type("A.WOFF2"), "font/woff2");
        assert_eq!(content_type("A.eot"), "application/vnd.ms-fontobject");
        assert_eq!(content_type(".ttf"), "font/ttf");
    }

    #[test]
    fn unknown_extensions_are_binary() {
        assert_eq!(content_type("notes.txt"), OCTET_STREAM);
        assert_eq!(content_type("no-extension"), OCTET_STREAM);
    }

    #[test]
    fn css_uses_derived_family() {
        let css = generate_css("Arial.ttf", &FontMetadata::default());
        assert_eq!(
            css,
            "@font-face { font-family: 'Arial'; src: url('/fonts/Arial.ttf'); }"
        );
    }

    #[test]
    fn css_uses_explicit_family() {
        let meta = FontMetadata::default().with_name("Brand Sans");
        let css = generate_css("bs-regular.woff2", &meta);
        assert!(css.contains("font-family: 'Brand Sans';"), "{css}");
        assert!(css.contains("url('/fonts/bs-regular.woff2')"), "{css}");
    }

    #[test]
    fn css_escapes_quotes() {
        let meta = FontMetadata::default().with_name("O'Brien\\Sans\n");
        let css = generate_css("o.ttf", &meta);
        assert!(css.contains(r"font-family: 'O\'Brien\\Sans';"), "{css}");
    }

    proptest! {
        #[test]
        fn escaped_strings_never_close_the_quote(raw in ".*") {
            let escaped = escape_css_string(&raw);
            let mut chars = escaped.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => { chars.next(); }
                    '\'' | '"' => prop_assert!(false, "unescaped quote in {escaped:?}"),
                    c => prop_assert!(!c.is_control()),
                }
            }
        }
    }
}
