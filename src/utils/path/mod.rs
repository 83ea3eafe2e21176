//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects beyond
//! `canonicalize` lookups.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `expand_path`, `is_temp_file`)

pub mod fs;

pub use fs::{expand_path, is_temp_file, normalize_path};
