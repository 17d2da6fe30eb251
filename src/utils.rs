// src/utils.rs

/// Builds a resource URL under `base`. Absolute URLs and `data:` URIs (inline
/// icons) are returned unchanged.
pub fn resource_url(base: &str, path: &str) -> String {
    if path.starts_with("data:") || path.contains("://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let clean_path = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", clean_path)
    } else {
        format!("{}/{}", base, clean_path)
    }
}
