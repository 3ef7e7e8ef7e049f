use bguard_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const MAX_TCP_MESSAGE_SIZE: usize = 65535;

pub async fn exchange(
    server: SocketAddr,
    message_bytes: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, DomainError> {
    let bytes = tokio::time::timeout(timeout, roundtrip(server, message_bytes))
        .await
        .map_err(|_| DomainError::UpstreamTimeout {
            server: server.to_string(),
        })??;

    debug!(server = %server, response_len = bytes.len(), "TCP answer received");
    Ok(bytes)
}

async fn roundtrip(server: SocketAddr, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
    let mut stream = TcpStream::connect(server)
        .await
        .map_err(|e| DomainError::Upstream {
            server: server.to_string(),
            reason: format!("TCP connect failed: {}", e),
        })?;
    let _ = stream.set_nodelay(true);

    send_with_length_prefix(&mut stream, message_bytes).await?;
    read_with_length_prefix(&mut stream).await
}

pub async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), DomainError>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        DomainError::InvalidRequest(format!(
            "DNS message too large for TCP: {} bytes",
            message_bytes.len()
        ))
    })?;

    stream
        .write_all(&length.to_be_bytes())
        .await
        .map_err(|e| DomainError::InvalidRequest(format!("Failed to write length prefix: {}", e)))?;
    stream
        .write_all(message_bytes)
        .await
        .map_err(|e| DomainError::InvalidRequest(format!("Failed to write DNS message: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DomainError::InvalidRequest(format!("Failed to flush stream: {}", e)))?;

    Ok(())
}

pub async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, DomainError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DomainError::InvalidRequest(format!("Failed to read message length: {}", e)))?;

    let message_len = u16::from_be_bytes(len_buf) as usize;
    if message_len > MAX_TCP_MESSAGE_SIZE {
        return Err(DomainError::InvalidRequest(format!(
            "Message too large: {} bytes (max {})",
            message_len, MAX_TCP_MESSAGE_SIZE
        )));
    }

    let mut buf = vec![0u8; message_len];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(|e| DomainError::InvalidRequest(format!("Failed to read DNS message: {}", e)))?;
    Ok(buf)
}
