//! HTML listing for the catalog front page (made by FontLab https://www.fontlab.com/)
//!
//! The page is a single self-contained document: one `<style>` block carrying
//! every font's `@font-face` rule, a card per font with a live preview, and
//! the upload and edit forms that post back to the server.

use std::fmt::Write;

use fontl_core::output::FontData;

const PREVIEW_TEXT: &str = "The quick brown fox jumps over the lazy dog";

/// Render the catalog front page. `fonts` is expected to be sorted already.
pub fn render_index(fonts: &[FontData]) -> String {
    let mut html = String::with_capacity(4096 + fonts.len() * 1024);

    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Fonts</title>\n<style>\n",
    );
    for font in fonts {
        html.push_str(&style_safe(&font.css));
        html.push('\n');
    }
    html.push_str(
        "body { font-family: system-ui, sans-serif; margin: 2rem; }\n\
         .font { border-bottom: 1px solid #ddd; padding: 1rem 0; }\n\
         .preview { font-size: 2rem; margin: 0.5rem 0; }\n\
         .pill { display: inline-block; padding: 0 0.5rem; border-radius: 1rem; background: #eee; margin-right: 0.25rem; }\n\
         </style>\n</head>\n<body>\n",
    );

    let _ = writeln!(html, "<h1>Fonts ({})</h1>", fonts.len());
    html.push_str(UPLOAD_FORM);

    for font in fonts {
        render_font(&mut html, font);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_font(html: &mut String, font: &FontData) {
    let meta = &font.metadata;
    let name = escape_html(&font.name);
    let filename = escape_html(&font.filename);

    let _ = writeln!(html, "<section class=\"font\" id=\"{filename}\">");
    let _ = writeln!(html, "<h2>{name}</h2>");
    let _ = writeln!(
        html,
        "<p class=\"preview\" style=\"font-family: &#39;{}&#39;\">{PREVIEW_TEXT}</p>",
        escape_html(&css_family(&font.name))
    );
    let _ = writeln!(
        html,
        "<p><a href=\"/fonts/{filename}\">{filename}</a> · <a href=\"/css/{filename}\">CSS</a></p>"
    );

    if !meta.source.is_empty() {
        let label = escape_html(&source_label(&meta.source));
        if is_link(&meta.source) {
            let _ = writeln!(
                html,
                "<p>Source: <a href=\"{}\" rel=\"noopener\">{label}</a></p>",
                escape_html(&meta.source)
            );
        } else {
            let _ = writeln!(html, "<p>Source: {label}</p>");
        }
    }

    let _ = writeln!(
        html,
        "<p>Commercial use: {}</p>",
        if meta.commercial_use { "yes" } else { "no" }
    );
    render_pills(html, "Projects", &meta.projects);
    render_pills(html, "Tags", &meta.tags);

    let _ = writeln!(html, "<pre>{}</pre>", escape_html(&font.css));
    render_edit_form(html, font);
    html.push_str("</section>\n");
}

fn render_pills(html: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(html, "<p>{label}: ");
    for item in items {
        let _ = write!(html, "<span class=\"pill\">{}</span>", escape_html(item));
    }
    html.push_str("</p>\n");
}

fn render_edit_form(html: &mut String, font: &FontData) {
    let meta = &font.metadata;
    let _ = writeln!(
        html,
        "<details><summary>Edit</summary>\n\
         <form method=\"post\" action=\"/edit\">\n\
         <input type=\"hidden\" name=\"filename\" value=\"{}\">\n\
         <label>Name <input name=\"fontName\" value=\"{}\"></label>\n\
         <label>Source <input name=\"source\" value=\"{}\"></label>\n\
         <label>Commercial use <input type=\"checkbox\" name=\"commercialUse\" value=\"true\"{}></label>\n\
         <label>Projects <input name=\"projects\" value=\"{}\"></label>\n\
         <label>Tags <input name=\"tags\" value=\"{}\"></label>\n\
         <button type=\"submit\">Save</button>\n\
         </form></details>",
        escape_html(&font.filename),
        escape_html(&meta.name),
        escape_html(&meta.source),
        if meta.commercial_use { " checked" } else { "" },
        escape_html(&meta.projects.join(", ")),
        escape_html(&meta.tags.join(", ")),
    );
}

const UPLOAD_FORM: &str = "<details><summary>Upload font</summary>\n\
<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n\
<label>File <input type=\"file\" name=\"fontFile\" accept=\".ttf,.otf,.woff,.woff2,.eot\" required></label>\n\
<label>Name <input name=\"fontName\"></label>\n\
<label>Source <input name=\"source\"></label>\n\
<label>Commercial use <input type=\"checkbox\" name=\"commercialUse\" value=\"true\"></label>\n\
<label>Projects <input name=\"projects\" placeholder=\"comma, separated\"></label>\n\
<label>Tags <input name=\"tags\" placeholder=\"comma, separated\"></label>\n\
<button type=\"submit\">Upload</button>\n\
</form></details>\n";

/// Show just the host for http(s) sources, the raw text otherwise.
pub fn source_label(source: &str) -> String {
    let rest = source
        .strip_prefix("https://")
        .or_else(|| source.strip_prefix("http://"));
    match rest {
        Some(rest) => rest.split('/').next().unwrap_or(rest).to_string(),
        None => source.to_string(),
    }
}

fn is_link(source: &str) -> bool {
    source.starts_with("https://") || source.starts_with("http://")
}

/// Family name as it appears inside a quoted CSS string.
fn css_family(name: &str) -> String {
    fontl_core::content::escape_css_string(name)
}

/// A raw `<` could end the style element early; `\3c ` is the same
/// character to the CSS parser.
fn style_safe(css: &str) -> String {
    css.replace('<', "\\3c ")
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
