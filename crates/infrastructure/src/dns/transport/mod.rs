pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use bguard_domain::DomainError;
use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

pub use tcp::{read_with_length_prefix, send_with_length_prefix};

/// Sends one query to one upstream server and returns its answer.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &Message,
        timeout: Duration,
    ) -> Result<Message, DomainError>;
}

/// Plain DNS over UDP, retried over TCP when the UDP answer is truncated.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkTransport;

impl NetworkTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DnsTransport for NetworkTransport {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &Message,
        timeout: Duration,
    ) -> Result<Message, DomainError> {
        let bytes = encode(server, query)?;

        let reply_bytes = udp::exchange(server, &bytes, timeout).await?;
        let reply = decode(server, query, &reply_bytes)?;
        if !reply.truncated() {
            return Ok(reply);
        }

        debug!(server = %server, "UDP answer truncated, retrying over TCP");
        let reply_bytes = tcp::exchange(server, &bytes, timeout).await?;
        decode(server, query, &reply_bytes)
    }
}

fn encode(server: SocketAddr, query: &Message) -> Result<Vec<u8>, DomainError> {
    query.to_vec().map_err(|e| DomainError::Upstream {
        server: server.to_string(),
        reason: format!("failed to encode query: {}", e),
    })
}

fn decode(server: SocketAddr, query: &Message, bytes: &[u8]) -> Result<Message, DomainError> {
    let reply = Message::from_vec(bytes).map_err(|e| DomainError::Upstream {
        server: server.to_string(),
        reason: format!("malformed answer: {}", e),
    })?;

    if reply.id() != query.id() {
        return Err(DomainError::Upstream {
            server: server.to_string(),
            reason: format!("answer id {} does not match query id {}", reply.id(), query.id()),
        });
    }
    Ok(reply)
}
