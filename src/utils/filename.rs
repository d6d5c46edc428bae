use std::path::Path;

pub const FALLBACK_FILENAME: &str = "unnamed";

const MAX_FILENAME_LEN: usize = 255;

/// Cleans a client supplied filename for echoing back in responses and logs.
///
/// Keeps only the final path component, replaces control and reserved
/// characters with `_`, and truncates to 255 bytes on a char boundary.
/// Never fails: an empty result becomes [`FALLBACK_FILENAME`].
pub fn sanitize_filename(filename: &str) -> String {
    // Normalise Windows separators so `Path` sees every component
    let normalized = filename.replace('\\', "/");
    let name = Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from upload filename: {:?}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        return sanitized[..end].to_string();
    }

    sanitized.to_string()
}
