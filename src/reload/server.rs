//! WebSocket Server for Reload Push
//!
//! Accepts browser connections and hands each raw stream to the `WsActor`
//! via channel; the actor does the handshake and owns the client list.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use anyhow::Result;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// How long a client may stay silent before its handshake is given up
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Start the WebSocket listener, returning the port actually bound.
///
/// Port 0 binds an ephemeral port.
pub fn start_ws_server_with_channel(
    interface: IpAddr,
    base_port: u16,
    ws_tx: tokio::sync::mpsc::Sender<WsMsg>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::Builder::new()
        .name("ws-accept".into())
        .spawn(move || accept_loop(listener, ws_tx))?;

    Ok(actual_port)
}

fn accept_loop(listener: TcpListener, ws_tx: tokio::sync::mpsc::Sender<WsMsg>) {
    loop {
        if crate::core::is_shutdown() {
            break;
        }
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("reload"; "client connected: {}", addr);

                if let Err(e) = prepare_stream(&stream) {
                    crate::debug!("reload"; "dropping {}: {}", addr, e);
                    continue;
                }

                if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                    crate::debug!("reload"; "actor gone, stop accepting");
                    break;
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            Err(e) => {
                crate::log!("reload"; "accept error: {}", e);
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        }
    }
}

/// Blocking mode for the handshake, bounded so a silent client cannot
/// stall the actor.
fn prepare_stream(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                if offset > 0 {
                    crate::log!("reload"; "port {} in use, using {} instead", base_port, actual_port);
                }
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_bind_ephemeral_port() {
        let (_listener, port) = try_bind_port(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, 1).unwrap();
        assert_ne!(port, 0);
    }

    #[test]
    fn test_silent_client_handshake_gives_up() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        let _silent = TcpStream::connect(addr).unwrap();

        let (stream, _) = listener.accept().unwrap();
        prepare_stream(&stream).unwrap();

        let started = std::time::Instant::now();
        assert!(tungstenite::accept(stream).is_err());
        assert!(started.elapsed() < HANDSHAKE_TIMEOUT * 3);
    }

    #[test]
    fn test_bind_retries_next_port() {
        let (taken, port) = try_bind_port(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, 1).unwrap();
        let (_second, second_port) =
            try_bind_port(IpAddr::V4(Ipv4Addr::LOCALHOST), port, 3).unwrap();
        assert_ne!(second_port, port);
        drop(taken);
    }
}
