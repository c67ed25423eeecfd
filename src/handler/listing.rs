//! Directory listing module
//!
//! Renders an HTML index of a directory's immediate entries.

use std::io;
use std::path::Path;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Read the immediate entries of `dir`, sorted case-insensitively
///
/// Symlinks are followed to decide whether an entry is a directory.
pub async fn read_entries(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let is_symlink = entry
            .file_type()
            .await
            .is_ok_and(|t| t.is_symlink());
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_dir());
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Render the listing page
///
/// # Arguments
/// * `display_path` - Decoded request path, shown in the title
/// * `href_base` - Raw request path; entry links are made absolute from it
/// * `entries` - Directory entries in display order
pub fn render(display_path: &str, href_base: &str, entries: &[DirEntry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));
    let base = if href_base.ends_with('/') {
        href_base.to_string()
    } else {
        format!("{href_base}/")
    };

    let mut html = String::with_capacity(256 + entries.len() * 64);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<hr>\n<ul>\n"));

    for entry in entries {
        let mut display = entry.name.clone();
        let mut link = urlencoding::encode(&entry.name).into_owned();
        if entry.is_dir {
            display.push('/');
            link.push('/');
        }
        // A link to a directory displays with @ and links with /
        if entry.is_symlink {
            if entry.is_dir {
                display.pop();
            }
            display.push('@');
        }
        html.push_str(&format!(
            "<li><a href=\"{}{}\">{}</a></li>\n",
            escape_html(&base),
            escape_html(&link),
            escape_html(&display)
        ));
    }

    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

/// Escape text for inclusion in HTML content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
