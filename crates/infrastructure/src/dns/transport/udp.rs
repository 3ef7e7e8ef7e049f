//! UDP exchange with one upstream (RFC 1035 §4.2.1). Messages are sent as-is.

use bguard_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub async fn exchange(
    server: SocketAddr,
    message_bytes: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, DomainError> {
    let bind_addr: SocketAddr = if server.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| upstream_err(server, format!("failed to bind UDP socket: {}", e)))?;

    let bytes = tokio::time::timeout(timeout, roundtrip(&socket, server, message_bytes))
        .await
        .map_err(|_| DomainError::UpstreamTimeout {
            server: server.to_string(),
        })??;

    debug!(server = %server, bytes_received = bytes.len(), "UDP answer received");
    Ok(bytes)
}

async fn roundtrip(
    socket: &UdpSocket,
    server: SocketAddr,
    message_bytes: &[u8],
) -> Result<Vec<u8>, DomainError> {
    socket
        .send_to(message_bytes, server)
        .await
        .map_err(|e| upstream_err(server, format!("failed to send UDP query: {}", e)))?;

    let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
    loop {
        let (received, from) = socket
            .recv_from(&mut recv_buf)
            .await
            .map_err(|e| upstream_err(server, format!("failed to receive UDP answer: {}", e)))?;

        if from.ip() != server.ip() {
            warn!(expected = %server, received_from = %from, "UDP answer from unexpected source");
            continue;
        }

        recv_buf.truncate(received);
        return Ok(recv_buf);
    }
}

fn upstream_err(server: SocketAddr, reason: String) -> DomainError {
    DomainError::Upstream {
        server: server.to_string(),
        reason,
    }
}
