//! Peer transport, connection pool & active-validator tracker,
//! and the mempool.

pub mod envelope;
pub mod error;
pub mod framing;
pub mod mempool;
pub mod pool;

pub use error::NetError;
pub use mempool::Mempool;
pub use pool::{ConnectionPool, PeerHandle};

use smartdrive_crypto::Signer;
use smartdrive_types::{Envelope, PeerMessage};

/// Signs `body`, frames it, and writes it out in one call.
pub async fn send(writer: &mut (impl tokio::io::AsyncWrite + Unpin), signer: &impl Signer, body: PeerMessage) -> Result<(), NetError> {
    let envelope = envelope::sign(signer, body)?;
    let bytes = serde_json::to_vec(&envelope)?;
    framing::write_frame(writer, &bytes).await
}

/// Signs and frames `body` into the raw bytes a `PeerHandle`/`ConnectionPool`
/// outbox expects, without touching a socket directly — the per-peer writer
/// task on the other end of the channel does the actual `write_frame`.
pub fn encode_frame(signer: &impl Signer, body: PeerMessage) -> Result<Vec<u8>, NetError> {
    let envelope = envelope::sign(signer, body)?;
    let json = serde_json::to_vec(&envelope)?;
    if json.len() as u32 > framing::MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge { size: json.len() as u32, limit: framing::MAX_FRAME_BYTES });
    }
    let mut framed = Vec::with_capacity(4 + json.len());
    framed.extend_from_slice(&(json.len() as u32).to_be_bytes());
    framed.extend_from_slice(&json);
    Ok(framed)
}

/// Reads one frame, decodes it as an `Envelope`, and verifies its signature.
/// Returns the sender's address alongside the verified `PeerMessage`.
pub async fn recv(reader: &mut (impl tokio::io::AsyncRead + Unpin)) -> Result<(smartdrive_types::Address, PeerMessage), NetError> {
    let bytes = framing::read_frame(reader).await?;
    let envelope: Envelope = serde_json::from_slice(&bytes)?;
    let address = envelope::verify(&envelope).ok_or(NetError::InvalidSignature)?;
    Ok((address, envelope.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartdrive_crypto::Keypair;

    #[tokio::test]
    async fn send_then_recv_round_trips_and_verifies() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let signer = Keypair::generate();
        send(&mut client, &signer, PeerMessage::Ping).await.unwrap();
        let (address, body) = recv(&mut server).await.unwrap();
        assert_eq!(&address, signer.address());
        assert!(matches!(body, PeerMessage::Ping));
    }
}
