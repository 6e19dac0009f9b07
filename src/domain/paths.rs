//! Helpers for root-relative project paths.

/// Normalise a configured path: forward slashes, no leading `./`, no trailing `/`.
///
/// The repository root normalises to the empty string.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.trim().replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    let trimmed = normalized.trim_end_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Whether `file` (repository-relative) lies under the directory `dir`.
pub fn is_under(file: &str, dir: &str) -> bool {
    let dir = normalize_path(dir);
    if dir.is_empty() {
        return true;
    }
    match file.strip_prefix(dir.as_str()) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Whether any of `files` lies under any of `dirs`.
pub fn touches_any<F: AsRef<str>, D: AsRef<str>>(files: &[F], dirs: &[D]) -> bool {
    files
        .iter()
        .any(|f| dirs.iter().any(|d| is_under(f.as_ref(), d.as_ref())))
}
