//! Forward-slash path utilities.
//!
//! Published paths are stored and compared as `/`-separated strings regardless of the
//! platform that produced them: a publish started on Windows and one started on Linux must
//! plan byte-identical destinations, and backslashes break UDIM/pattern matching further
//! down the pipeline. These helpers therefore work on strings instead of [`std::path::Path`],
//! which would only split on the host separator.

/// Normalizes a path string to forward slashes and removes redundant segments.
///
/// - Backslashes become `/`
/// - Empty segments (`a//b`) and `.` segments are dropped
/// - `..` pops the previous segment; a leading `..` is kept for relative paths and
///   dropped for absolute ones
/// - A leading `/`, a UNC `//` prefix and a drive letter (`C:`) are preserved
///
/// This is purely lexical; the filesystem is never touched.
///
/// # Examples
///
/// ```rust
/// use anatomy_cli::utils::normalize_path_str;
///
/// assert_eq!(normalize_path_str(r"C:\proj\.\asset\\v001"), "C:/proj/asset/v001");
/// assert_eq!(normalize_path_str("/mnt/proj/a/../b/"), "/mnt/proj/b");
/// assert_eq!(normalize_path_str("../tex/./a.png"), "../tex/a.png");
/// ```
#[must_use]
pub fn normalize_path_str(path: &str) -> String {
    let unified = path.replace('\\', "/");

    let (prefix, rest) = if let Some(stripped) = unified.strip_prefix("//") {
        ("//", stripped)
    } else if let Some(stripped) = unified.strip_prefix('/') {
        ("/", stripped)
    } else {
        ("", unified.as_str())
    };
    let rooted = !prefix.is_empty() || has_drive_letter(rest);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." && !(segments.len() == 1 && has_drive_letter(last)) => {
                    segments.pop();
                }
                Some(_) if !rooted => segments.push(".."),
                None if !rooted => segments.push(".."),
                _ => {}
            },
            other => segments.push(other),
        }
    }

    format!("{prefix}{}", segments.join("/"))
}

/// Joins `name` onto `base` with a single `/` and normalizes the result.
#[must_use]
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        return normalize_path_str(name);
    }
    normalize_path_str(&format!("{base}/{name}"))
}

/// Returns everything before the last separator, or an empty string for a bare name.
#[must_use]
pub fn dirname(path: &str) -> String {
    let normalized = normalize_path_str(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => String::new(),
    }
}

/// Returns the last segment of a path (after normalizing separators).
#[must_use]
pub fn basename(path: &str) -> String {
    let normalized = normalize_path_str(path);
    normalized.rsplit('/').next().unwrap_or_default().to_string()
}

/// Strips trailing separators from a root value after normalizing it.
///
/// Root values are compared as prefixes of published paths, so `P:/projects/` and
/// `P:\projects` must clean to the same string.
#[must_use]
pub fn clean_root(root: &str) -> String {
    let mut cleaned = root.replace('\\', "/");
    while cleaned.len() > 1 && cleaned.ends_with('/') {
        cleaned.pop();
    }
    cleaned
}

fn has_drive_letter(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
