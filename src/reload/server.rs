//! WebSocket server for live reload.
//!
//! An acceptor thread performs the handshake and registers clients; a reader
//! thread polls them so pings get answered and closed sockets are dropped.
//! [`ReloadHub::broadcast`] writes to every registered client and drops the
//! ones that fail.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::ReloadMessage;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval of the acceptor and reader threads
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Connected reload clients. Cheap to clone.
#[derive(Clone)]
pub struct ReloadHub {
    clients: Clients,
    port: u16,
}

impl ReloadHub {
    /// Bind to `interface:base_port`, trying the next ports when taken, and
    /// start accepting clients.
    pub fn start(interface: IpAddr, base_port: u16) -> Result<Self> {
        let (listener, port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
        listener.set_nonblocking(true)?;

        let clients = Clients::default();
        let accept_clients = Arc::clone(&clients);
        thread::Builder::new()
            .name("mend-reload-accept".into())
            .spawn(move || accept_loop(&listener, &accept_clients))?;
        let read_clients = Arc::clone(&clients);
        thread::Builder::new()
            .name("mend-reload-read".into())
            .spawn(move || reader_loop(&read_clients))?;

        Ok(Self { clients, port })
    }

    /// Port actually bound.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Send `message` to every client, dropping those that fail.
    pub fn broadcast(&self, message: &ReloadMessage) {
        let text = message.to_json();
        let mut clients = self.clients.lock();
        let before = clients.len();
        clients.retain_mut(|ws| match ws.send(Message::Text(text.clone().into())) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "dropping client: {}", e);
                false
            }
        });
        crate::debug!("reload"; "sent {} to {} of {} client(s)", text, clients.len(), before);
    }

    pub fn reload(&self, generation: u64) {
        self.broadcast(&ReloadMessage::reload(generation));
    }
}

fn accept_loop(listener: &TcpListener, clients: &Clients) {
    while !crate::core::is_shutdown() {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("reload"; "client connected: {}", addr);
                // handshake in blocking mode, poll reads afterwards
                let _ = stream.set_nonblocking(false);
                add_client(stream, clients);
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                crate::log!("reload"; "accept error: {}", e);
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn add_client(stream: TcpStream, clients: &Clients) {
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::log!("reload"; "handshake failed: {}", e);
            return;
        }
    };
    if let Err(e) = ws.send(Message::Text(ReloadMessage::connected().to_json().into())) {
        crate::debug!("reload"; "failed to greet client: {}", e);
        return;
    }
    let _ = ws.get_ref().set_nonblocking(true);
    clients.lock().push(ws);
}

fn reader_loop(clients: &Clients) {
    while !crate::core::is_shutdown() {
        thread::sleep(POLL_INTERVAL);
        clients.lock().retain_mut(|ws| loop {
            match ws.read() {
                Ok(Message::Close(_)) => return false,
                Ok(_) => continue,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                    return true;
                }
                Err(_) => return false,
            }
        });
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Instant;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn read_text(ws: &mut WebSocket<impl std::io::Read + std::io::Write>) -> String {
        loop {
            if let Message::Text(text) = ws.read().unwrap() {
                return text.as_str().to_string();
            }
        }
    }

    #[test]
    fn test_port_retry() {
        let taken = TcpListener::bind((LOCALHOST, 0)).unwrap();
        let port = taken.local_addr().unwrap().port();
        let (_listener, actual) = try_bind_port(LOCALHOST, port, 10).unwrap();
        assert_ne!(actual, port);
    }

    #[test]
    fn test_broadcast_reload() {
        let hub = ReloadHub::start(LOCALHOST, 0).unwrap();
        let url = format!("ws://127.0.0.1:{}/", hub.port());
        let (mut client, _) = tungstenite::connect(url.as_str()).unwrap();

        let hello: ReloadMessage = serde_json::from_str(&read_text(&mut client)).unwrap();
        assert_eq!(hello, ReloadMessage::connected());

        wait_for(|| hub.client_count() == 1);
        hub.reload(7);
        assert_eq!(read_text(&mut client), r#"{"type":"reload","generation":7}"#);
    }

    #[test]
    fn test_closed_client_is_dropped() {
        let hub = ReloadHub::start(LOCALHOST, 0).unwrap();
        let url = format!("ws://127.0.0.1:{}/", hub.port());
        let (mut client, _) = tungstenite::connect(url.as_str()).unwrap();
        read_text(&mut client);
        wait_for(|| hub.client_count() == 1);

        client.close(None).unwrap();
        let _ = client.flush();
        drop(client);
        wait_for(|| {
            hub.reload(1);
            hub.client_count() == 0
        });
    }
}
