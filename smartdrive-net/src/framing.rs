//! The wire frame itself: `uint32-BE length | json-utf8`, capped at
//! `MAX_FRAME_BYTES`. This module only knows about bytes; the
//! envelope's signature and the `PeerMessage` it carries live in
//! `envelope.rs`.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::NetError;

pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

pub async fn read_frame(reader: &mut (impl tokio::io::AsyncRead + Unpin)) -> Result<Vec<u8>, NetError> {
    let len = reader.read_u32().await?;
    if len > MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge { size: len, limit: MAX_FRAME_BYTES });
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_frame(writer: &mut (impl tokio::io::AsyncWrite + Unpin), body: &[u8]) -> Result<(), NetError> {
    let len = body.len() as u32;
    if len > MAX_FRAME_BYTES {
        return Err(NetError::FrameTooLarge { size: len, limit: MAX_FRAME_BYTES });
    }
    writer.write_u32(len).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_frame() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_frame(&mut client, b"hello").await.unwrap();
        let got = read_frame(&mut server).await.unwrap();
        assert_eq!(got, b"hello");
    }

    #[tokio::test]
    async fn rejects_frame_over_limit() {
        let (mut client, mut server) = tokio::io::duplex(16);
        client.write_u32(MAX_FRAME_BYTES + 1).await.unwrap();
        drop(client);
        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, NetError::FrameTooLarge { .. }));
    }
}
