//! HTTP responses.
//!
//! Route handlers produce a [`Reply`]; only [`send`] touches the connection.

use std::{fs, io, path::Path};

use anyhow::Result;
use serde::Serialize;
use tiny_http::{Header, Request, Response, StatusCode};

use crate::document::DocumentError;
use crate::utils::mime::types::JSON;

/// A complete response, independent of the connection it goes out on.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    /// Serialize `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, JSON, body),
            Err(e) => Self::error(500, format!("serialization failed: {e}")),
        }
    }

    /// `{}` with status 200.
    pub fn empty_object() -> Self {
        Self::new(200, JSON, b"{}".to_vec())
    }

    /// `{"error": message}`.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "error": message.into() });
        Self::new(status, JSON, body.to_string().into_bytes())
    }

    pub fn not_found() -> Self {
        Self::error(404, "not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::error(405, "method not allowed")
    }

    /// A file from the build output, byte for byte.
    ///
    /// A missing file is a server error: the build output should be there.
    pub fn file(path: &Path) -> Self {
        let content_type = crate::utils::mime::from_path(path);
        match fs::read(path) {
            Ok(body) => Self::new(200, content_type, body),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::error(
                500,
                format!("build output `{}` is missing", path.display()),
            ),
            Err(e) => Self::error(500, format!("failed to read `{}`: {e}", path.display())),
        }
    }
}

impl From<DocumentError> for Reply {
    fn from(err: DocumentError) -> Self {
        let status = match err {
            DocumentError::NotFound(_) => 404,
            DocumentError::Validation(_) => 400,
            DocumentError::Io(..) => 500,
        };
        Self::error(status, format!("{:#}", anyhow::Error::from(err)))
    }
}

/// Write `reply` to the connection. HEAD requests get headers only.
pub fn send(request: Request, reply: Reply, head: bool) -> Result<()> {
    let content_type = make_header("Content-Type", reply.content_type);
    if head {
        let response = Response::empty(StatusCode(reply.status)).with_header(content_type);
        request.respond(response)?;
        return Ok(());
    }

    let response = Response::from_data(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(content_type)
        .with_header(make_header("Cache-Control", "no-store"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    // static ASCII, cannot fail
    Header::from_bytes(key, value).expect("valid header")
}
