//! Shared helpers: external commands, hashing, MIME types and paths.

pub mod exec;
pub mod hash;
pub mod mime;
pub mod path;
