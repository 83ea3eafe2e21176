//! Content types for the sync server.
//!
//! The build output is a small front-end bundle (page, compiled script,
//! stylesheets, a few images), so only those extensions are known; anything
//! else goes out as raw bytes.

use std::path::Path;

pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const TEXT: &str = "text/plain; charset=utf-8";
    pub const WASM: &str = "application/wasm";
    pub const SVG: &str = "image/svg+xml";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const ICON: &str = "image/x-icon";
    pub const WOFF2: &str = "font/woff2";
    pub const BYTES: &str = "application/octet-stream";
}

/// Content type for a file in the build output, by extension.
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("html" | "htm") => types::HTML,
        Some("js" | "mjs") => types::JAVASCRIPT,
        Some("css") => types::CSS,
        Some("json" | "map") => types::JSON,
        Some("txt" | "md") => types::TEXT,
        Some("wasm") => types::WASM,
        Some("svg") => types::SVG,
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("ico") => types::ICON,
        Some("woff2") => types::WOFF2,
        _ => types::BYTES,
    }
}
