//! String helpers and file system checks.
//!
//! - Text cleanup for scraped markup (whitespace collapsing)
//! - Display truncation, slugs and source-name labels for the renderers
//! - Query sanitization for report file names
//! - Output directory validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse runs of whitespace (including newlines and NBSP) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary) with
/// an ellipsis and byte count appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Truncate to `width` characters for display, appending `...` when cut.
pub fn truncate_display(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let head: String = s.chars().take(width).collect();
        format!("{head}...")
    }
}

/// Convert a title to a URL-friendly slug.
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}

/// Capitalize the first character of a string.
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Human label for a source key: `google_scholar` -> `Google Scholar`.
///
/// Keys with a qualifier keep it verbatim: `social:reddit.com` -> `Social: reddit.com`.
pub fn source_label(key: &str) -> String {
    match key.split_once(':') {
        Some((head, tail)) => format!("{}: {}", source_label(head), tail),
        None => key.split('_').map(upcase).collect::<Vec<_>>().join(" "),
    }
}

/// File-name-safe form of a person name: lowercase, spaces to underscores,
/// everything else non-alphanumeric dropped.
///
/// ```ignore
/// assert_eq!(sanitize_query("Jane O'Doe"), "jane_odoe");
/// ```
pub fn sanitize_query(query: &str) -> String {
    let cleaned: String = query
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() => Some(c),
            ' ' | '_' | '-' => Some('_'),
            _ => None,
        })
        .collect();
    let collapsed = cleaned
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if collapsed.is_empty() {
        "query".to_string()
    } else {
        collapsed
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
