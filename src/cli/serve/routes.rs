//! Request routing for the sync protocol.
//!
//! | Method   | Path                   | Reply                                 |
//! |----------|------------------------|---------------------------------------|
//! | GET      | `/`                    | built page, byte for byte             |
//! | GET      | `/fetch`, `/text`      | whole document `{"<id>": block}`      |
//! | GET      | `/fetch/{id}`          | one block                             |
//! | POST     | `/update/{id}`         | upsert block, `{}`                    |
//! | POST     | `/save`                | write block 0 to the target, `{}`     |
//! | POST     | `/increment`           | `{"counter": N}`                      |
//! | GET      | `/__dungeon/reload.js` | reload push client                    |
//! | GET      | anything else          | static file from the output, or 404   |

use std::convert::identity;
use std::sync::atomic::Ordering;

use tiny_http::Method;

use super::AppState;
use super::path::resolve_path;
use super::response::Reply;
use crate::document::{BlockId, TextBlock};
use crate::embed::{self, RELOAD_JS_PATH};
use crate::utils::mime::types::JAVASCRIPT;

type Handled = Result<Reply, Reply>;

/// Route one request to its handler.
pub fn dispatch(method: &Method, url: &str, body: &[u8], state: &AppState) -> Reply {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path == RELOAD_JS_PATH {
        return match method {
            Method::Get | Method::Head => reload_client(state),
            _ => Reply::method_not_allowed(),
        };
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let readable = matches!(method, Method::Get | Method::Head);

    let handled = match (method, segments.as_slice()) {
        (_, [""]) if readable => Ok(Reply::file(&state.page)),
        (_, ["fetch" | "text"]) if readable => fetch_all(state),
        (_, ["fetch", id]) if readable => fetch_one(state, id),
        (Method::Post, ["update", id]) => update(state, id, body),
        (Method::Post, ["update"]) => Err(Reply::error(400, "missing block id")),
        (Method::Post, ["save"]) => save(state),
        (Method::Post, ["increment"]) => Ok(increment(state)),
        (
            _,
            [""] | ["fetch" | "text"] | ["fetch", _] | ["update", _] | ["save"] | ["increment"],
        ) => Err(Reply::method_not_allowed()),
        _ if readable => Ok(static_file(state, url)),
        _ => Err(Reply::not_found()),
    };
    handled.unwrap_or_else(identity)
}

fn fetch_all(state: &AppState) -> Handled {
    Ok(Reply::json(200, &*state.store.get_all()))
}

fn fetch_one(state: &AppState, raw_id: &str) -> Handled {
    let id = parse_id(raw_id)?;
    Ok(Reply::json(200, &state.store.get_one(id)?))
}

fn update(state: &AppState, raw_id: &str, body: &[u8]) -> Handled {
    let id = parse_id(raw_id)?;
    let block: TextBlock = serde_json::from_slice(body)
        .map_err(|e| Reply::error(400, format!("malformed block: {e}")))?;

    state.store.upsert(id, block)?;
    crate::debug!("serve"; "updated block {}", id);

    if state.save_on_update && id == 0 {
        state.store.save_to_file(&state.target)?;
    }
    Ok(Reply::empty_object())
}

fn save(state: &AppState) -> Handled {
    state.store.save_to_file(&state.target)?;
    crate::log!("serve"; "saved {}", state.target.display());
    Ok(Reply::empty_object())
}

fn increment(state: &AppState) -> Reply {
    let counter = state.counter.fetch_add(1, Ordering::SeqCst) + 1;
    Reply::json(200, &serde_json::json!({ "counter": counter }))
}

fn reload_client(state: &AppState) -> Reply {
    state.ws_port.map_or_else(Reply::not_found, |port| {
        Reply::new(200, JAVASCRIPT, embed::reload_js(port).into_bytes())
    })
}

fn static_file(state: &AppState, url: &str) -> Reply {
    resolve_path(url, &state.output).map_or_else(Reply::not_found, |path| Reply::file(&path))
}

fn parse_id(raw: &str) -> Result<BlockId, Reply> {
    raw.parse()
        .map_err(|_| Reply::error(400, format!("block id `{raw}` is not a non-negative integer")))
}
