//! Peer transport runtime and the discovery/ping/eviction loop that
//! drives the connection pool. `smartdrive-net` owns the wire format
//! and the pool's data structure; this module owns the sockets and tasks
//! that make them move.
//!
//! Liveness has no dedicated `PONG` message on the wire — `PING` is the
//! only liveness code defined — so any successfully received, verified
//! frame from a peer counts as a pong. Outbound `PING`s exist purely to
//! produce traffic on connections that would otherwise sit idle.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use smartdrive_types::constants::{INACTIVITY_TIMEOUT_SECONDS, PING_INTERVAL_SECONDS};
use smartdrive_types::{Address, ConnectionInfo, Module, ModuleType, PeerMessage};

use crate::node::Node;

pub async fn listen(node: Arc<Node>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", node.config.peer_port)).await?;
    tracing::info!(port = node.config.peer_port, "peer transport listening");
    loop {
        let (socket, remote) = listener.accept().await?;
        let node = node.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(node, socket, remote, None).await {
                tracing::debug!(%remote, error = %err, "peer connection closed");
            }
        });
    }
}

/// Dials a newly discovered validator at most once per discovery round;
/// registers it into the pool immediately on success, since its address
/// and `ConnectionInfo` are already known from the oracle.
async fn dial(node: Arc<Node>, module: Module) {
    if node.pool.contains(&module.address) {
        return;
    }
    let addr = (module.connection.ip.as_str(), module.connection.port);
    match TcpStream::connect(addr).await {
        Ok(socket) => {
            let remote = socket.peer_addr().unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)));
            let known = Some((module.address.clone(), module.connection.clone()));
            if let Err(err) = handle_connection(node, socket, remote, known).await {
                tracing::debug!(address = %module.address, error = %err, "dial failed");
            }
        }
        Err(err) => {
            tracing::debug!(address = %module.address, error = %err, "dial failed");
        }
    }
}

/// Runs one connection end-to-end: a writer task draining the peer's outbox
/// (frames arrive already signed and length-prefixed, so this is a raw
/// `write_all`, not another pass through `framing::write_frame`), and a
/// reader loop that verifies and dispatches every inbound frame. Returns
/// when either half closes.
async fn handle_connection(
    node: Arc<Node>,
    socket: TcpStream,
    remote: SocketAddr,
    known: Option<(Address, ConnectionInfo)>,
) -> anyhow::Result<()> {
    let (mut read_half, mut write_half) = socket.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    if let Some((address, connection)) = &known {
        node.pool.insert(address.clone(), connection.clone(), tx.clone());
    }

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if write_half.write_all(&frame).await.is_err() {
                break;
            }
        }
    });

    let mut registered_address = known.map(|(address, _)| address);
    loop {
        match smartdrive_net::recv(&mut read_half).await {
            Ok((sender, body)) => {
                if registered_address.is_none() {
                    let connection = ConnectionInfo { ip: remote.ip().to_string(), port: remote.port() };
                    node.pool.insert(sender.clone(), connection, tx.clone());
                    registered_address = Some(sender.clone());
                }
                node.pool.record_pong(&sender);
                if let Err(err) = dispatch(&node, &sender, body).await {
                    tracing::warn!(%sender, error = %err, "failed to handle peer message");
                }
            }
            Err(_) => break,
        }
    }

    if let Some(address) = registered_address {
        node.pool.remove(&address);
    }
    writer.abort();
    Ok(())
}

async fn dispatch(node: &Arc<Node>, sender: &Address, message: PeerMessage) -> anyhow::Result<()> {
    match message {
        PeerMessage::Ping => {}
        PeerMessage::Event { event, .. } => {
            node.mempool.add(event);
        }
        PeerMessage::Block { block_number, events, proposer_signature, proposer_address } => {
            let block = smartdrive_types::Block { block_number, events, proposer_signature, proposer_address };
            handle_incoming_block(node, sender, block).await?;
        }
        PeerMessage::SyncRequest { start, end } => {
            let to = end.unwrap_or_else(|| node.persistence.last_block_number());
            let blocks = node.persistence.iter_blocks(start, to)?;
            if let Some(peer) = node.pool.get(sender) {
                let frame = smartdrive_net::encode_frame(&node.validator_key, PeerMessage::SyncResponse { blocks })?;
                peer.send(frame);
            }
        }
        PeerMessage::SyncResponse { blocks } => {
            for block in blocks {
                match node.ingestor.ingest(block)? {
                    smartdrive_node::IngestOutcome::Rejected => {
                        tracing::warn!(%sender, "sync response contained a block that failed verification");
                        break;
                    }
                    _ => continue,
                }
            }
        }
    }
    Ok(())
}

async fn handle_incoming_block(node: &Arc<Node>, sender: &Address, block: smartdrive_types::Block) -> anyhow::Result<()> {
    match node.ingestor.ingest(block)? {
        smartdrive_node::IngestOutcome::Applied(number) => {
            tracing::info!(block_number = number, %sender, "applied block from peer");
        }
        smartdrive_node::IngestOutcome::Gap { expected } => {
            if let Some(peer) = node.pool.get(sender) {
                let frame = smartdrive_net::encode_frame(&node.validator_key, PeerMessage::SyncRequest { start: expected, end: None })?;
                peer.send(frame);
            }
        }
        smartdrive_node::IngestOutcome::Stale => {}
        smartdrive_node::IngestOutcome::Rejected => {
            tracing::warn!(%sender, "rejected block with invalid signatures");
        }
    }
    Ok(())
}

/// Discovery + ping + eviction: every `PING_INTERVAL_SECONDS`,
/// dial any validator the oracle knows about that we aren't connected to
/// yet, broadcast a liveness ping, and evict peers silent past
/// `INACTIVITY_TIMEOUT_SECONDS`.
pub async fn discovery_loop(node: Arc<Node>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(PING_INTERVAL_SECONDS));
    loop {
        ticker.tick().await;

        match node.oracle.get_modules(node.config.netuid, ModuleType::Validator).await {
            Ok(validators) => {
                for module in validators {
                    if &module.address == node.validator_key.address() {
                        continue;
                    }
                    if !node.pool.contains(&module.address) {
                        tokio::spawn(dial(node.clone(), module));
                    }
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to enumerate validators"),
        }

        if let Ok(frame) = smartdrive_net::encode_frame(&node.validator_key, PeerMessage::Ping) {
            node.pool.broadcast(&frame);
        }

        for address in node.pool.evict_stale(INACTIVITY_TIMEOUT_SECONDS) {
            tracing::debug!(%address, "evicted stale peer");
        }
    }
}
