use anyhow::{Result, anyhow};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// A browser submits an empty part with `filename=""` when the file input is left blank.
pub fn is_unselected_part(filename: &str, data: &[u8]) -> bool {
    filename.trim().is_empty() && data.is_empty()
}

/// Sanitizes a client filename for use on disk and in logs.
/// Returns the sanitized filename or an error if nothing usable is left.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Browsers on Windows may send full paths; keep only the last component
    let last = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let name = Path::new(last)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() || name == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
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

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 200 {
        let mut end = 200;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    // Leading dots would hide the file or escape the arena
    let sanitized = sanitized.trim_start_matches('.').to_string();
    if sanitized.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename has no usable characters".to_string(),
        }));
    }

    Ok(sanitized)
}
