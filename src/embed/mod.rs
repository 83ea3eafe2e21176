//! Resources compiled into the binary.
//!
//! Only the browser side of the reload push channel lives here; it is served
//! by the sync server with the live WebSocket port filled in.

/// Path the reload client is served under.
pub const RELOAD_JS_PATH: &str = "/__dungeon/reload.js";

const RELOAD_JS: &str = include_str!("serve/reload.js");

const WS_PORT_SLOT: &str = "__DUNGEON_WS_PORT__";

/// The reload client, pointed at the push channel on `ws_port`.
pub fn reload_js(ws_port: u16) -> String {
    RELOAD_JS.replace(WS_PORT_SLOT, &ws_port.to_string())
}
