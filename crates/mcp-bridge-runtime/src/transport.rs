//! TCP listener (C3, §4.3, §5). Loopback-only acceptor; one reader task
//! per connection, each owning its own [`ReassemblyBuffer`]; a bounded
//! outbound queue per connection for writer-side framing.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::buffer::ReassemblyBuffer;
use crate::frame;
use crate::{Error, Result};

pub type ConnectionId = u64;

/// The listener owns the live connection set in a `dashmap`-backed table,
/// guarded only during add/remove/enumerate (§5 "Shared resources").
pub struct BridgeListener {
    connections: Arc<DashMap<ConnectionId, Connection>>,
    next_id: AtomicU64,
    /// §9 Open Question 2: tools/list_changed coalescing is per-connection,
    /// so each connection's outbound queue gets its own in-flight flag.
    port: u16,
}

struct Connection {
    outbound: mpsc::Sender<Vec<u8>>,
    list_changed_in_flight: Arc<AtomicBool>,
}

impl BridgeListener {
    /// Binds `127.0.0.1:port` and returns the listener plus the bound
    /// port (which may differ if the OS assigned an ephemeral one).
    pub async fn bind(port: u16) -> Result<(Self, TcpListener)> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let bound_port = listener.local_addr()?.port();
        Ok((
            Self {
                connections: Arc::new(DashMap::new()),
                next_id: AtomicU64::new(0),
                port: bound_port,
            },
            listener,
        ))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Accept loop body: call repeatedly (typically from a spawned task)
    /// to accept one connection and spin up its reader/writer pair. Peers
    /// that aren't loopback are rejected before any bytes flow (§5
    /// "Loopback enforcement").
    pub async fn accept_one<F, Fut>(&self, listener: &TcpListener, on_payload: F) -> Result<()>
    where
        F: Fn(ConnectionId, String) -> Fut + Send + Sync + 'static + Clone,
        Fut: std::future::Future<Output = Option<String>> + Send + 'static,
    {
        let (stream, peer) = listener.accept().await?;
        if !is_loopback(peer) {
            drop(stream);
            return Ok(());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (outbound_tx, outbound_rx) = mpsc::channel::<Vec<u8>>(64);
        let list_changed_in_flight = Arc::new(AtomicBool::new(false));

        self.connections.insert(
            id,
            Connection {
                outbound: outbound_tx.clone(),
                list_changed_in_flight,
            },
        );

        let connections = self.connections.clone();
        let (reader, writer) = stream.into_split();

        tokio::spawn(async move {
            writer_loop(writer, outbound_rx).await;
        });

        tokio::spawn(async move {
            reader_loop(id, reader, on_payload, outbound_tx).await;
            connections.remove(&id);
        });

        Ok(())
    }

    /// Enqueue a framed payload for one connection. Drops silently if the
    /// connection is gone (§5 "Cancellation": outbound writes to the dead
    /// connection are dropped).
    pub async fn send_to(&self, id: ConnectionId, payload: &str) -> Result<()> {
        let frame = frame::encode(payload)?;
        if let Some(conn) = self.connections.get(&id) {
            let _ = conn.outbound.send(frame).await;
        }
        Ok(())
    }

    /// Broadcast a push notification to every live connection, coalescing
    /// `tools/list_changed` so at most one is in flight per connection at
    /// a time (§4.4, §8 invariant 9).
    pub async fn broadcast(&self, payload: &str, coalesce_key: Option<&str>) -> Result<()> {
        let frame = frame::encode(payload)?;
        let ids: Vec<ConnectionId> = self.connections.iter().map(|e| *e.key()).collect();

        for id in ids {
            let Some(conn) = self.connections.get(&id) else {
                continue;
            };

            if coalesce_key.is_some() {
                if conn
                    .list_changed_in_flight
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    continue;
                }
            }

            let sent = conn.outbound.send(frame.clone()).await.is_ok();
            if coalesce_key.is_some() {
                conn.list_changed_in_flight.store(false, Ordering::SeqCst);
            }
            let _ = sent;
        }

        Ok(())
    }

    pub fn disconnect(&self, id: ConnectionId) {
        self.connections.remove(&id);
    }
}

fn is_loopback(addr: SocketAddr) -> bool {
    match addr.ip() {
        IpAddr::V4(v4) => v4 == Ipv4Addr::LOCALHOST,
        IpAddr::V6(v6) => v6 == Ipv6Addr::LOCALHOST,
    }
}

async fn writer_loop(mut writer: tokio::net::tcp::OwnedWriteHalf, mut outbound_rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(bytes) = outbound_rx.recv().await {
        if writer.write_all(&bytes).await.is_err() {
            break;
        }
    }
}

async fn reader_loop<F, Fut>(
    id: ConnectionId,
    mut reader: tokio::net::tcp::OwnedReadHalf,
    on_payload: F,
    outbound: mpsc::Sender<Vec<u8>>,
) where
    F: Fn(ConnectionId, String) -> Fut,
    Fut: std::future::Future<Output = Option<String>>,
{
    let mut buffer = ReassemblyBuffer::new();
    let mut chunk = vec![0u8; 8192];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };

        if buffer.push(&chunk[..n]).is_err() {
            // §7: BufferOverflow faults the connection, no reply.
            break;
        }

        let frames = match buffer.drain_complete_frames() {
            Ok(frames) => frames,
            Err(_) => break,
        };

        for payload in frames {
            if let Some(reply) = on_payload(id, payload).await {
                if let Ok(framed) = frame::encode(&reply) {
                    if outbound.send(framed).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
