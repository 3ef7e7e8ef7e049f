use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::dns_message::reply_to;
use bguard_domain::{Request, RequestProtocol};
use hickory_proto::op::{Message, MessageType, ResponseCode};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Largest UDP reply without EDNS (RFC 1035 §4.2.1).
const MIN_UDP_PAYLOAD: usize = 512;

/// Turns the bytes of one inbound query into the bytes of its reply.
pub struct QueryHandler {
    resolver: Arc<dyn Resolver>,
    shutdown: CancellationToken,
    query_timeout: Duration,
}

impl QueryHandler {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        shutdown: CancellationToken,
        query_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            shutdown,
            query_timeout,
        }
    }

    /// `None` means the datagram is not worth an answer.
    pub async fn handle(
        &self,
        bytes: &[u8],
        client_ip: IpAddr,
        protocol: RequestProtocol,
    ) -> Option<Vec<u8>> {
        let query = match Message::from_vec(bytes) {
            Ok(query) => query,
            Err(e) => {
                debug!(client = %client_ip, error = %e, "Unparsable query");
                return format_error(bytes);
            }
        };
        if query.message_type() != MessageType::Query {
            return None;
        }
        if query.queries().is_empty() {
            return encode(&reply_to(&query, ResponseCode::FormErr));
        }

        let request = Request::new(client_ip, protocol, query.clone())
            .with_received_at(SystemTime::now());
        let ctx = ResolveContext::new(self.shutdown.child_token()).with_timeout(self.query_timeout);

        let reply = match self.resolver.resolve(&ctx, &request).await {
            Ok(response) => response.message,
            Err(e) => {
                warn!(
                    client = %client_ip,
                    question = request.question_name().as_deref().unwrap_or(""),
                    error = %e,
                    "Resolution failed"
                );
                reply_to(&query, ResponseCode::ServFail)
            }
        };

        let encoded = encode(&reply)?;
        match protocol {
            RequestProtocol::Udp if encoded.len() > udp_payload_limit(&query) => {
                debug!(client = %client_ip, size = encoded.len(), "Reply truncated for UDP");
                let mut truncated = reply_to(&query, reply.response_code());
                truncated.set_truncated(true);
                encode(&truncated)
            }
            _ => Some(encoded),
        }
    }
}

fn udp_payload_limit(query: &Message) -> usize {
    query
        .extensions()
        .as_ref()
        .map(|edns| usize::from(edns.max_payload()))
        .unwrap_or(MIN_UDP_PAYLOAD)
        .max(MIN_UDP_PAYLOAD)
}

fn encode(message: &Message) -> Option<Vec<u8>> {
    match message.to_vec() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %e, "Failed to encode reply");
            None
        }
    }
}

/// FORMERR carrying the id of a query too broken to parse.
fn format_error(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.len() < 2 {
        return None;
    }
    let mut reply = Message::new();
    reply
        .set_id(u16::from_be_bytes([bytes[0], bytes[1]]))
        .set_message_type(MessageType::Response)
        .set_response_code(ResponseCode::FormErr);
    encode(&reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bguard_domain::dns_message::address_reply;
    use bguard_domain::{DomainError, Response, ResponseType};
    use hickory_proto::op::{OpCode, Query};
    use hickory_proto::rr::{Name, RecordType};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    struct Fixed(Result<usize, DomainError>);

    #[async_trait]
    impl Resolver for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn resolve(
            &self,
            _ctx: &ResolveContext,
            request: &Request,
        ) -> Result<Response, DomainError> {
            let count = self.0.clone()?;
            let ips: Vec<IpAddr> = (0..count)
                .map(|i| IpAddr::V4(Ipv4Addr::new(10, 0, (i / 256) as u8, (i % 256) as u8)))
                .collect();
            let reply = address_reply(request.message(), &ips, 60);
            Ok(Response::new(reply, ResponseType::Resolved, "RESOLVED (test)"))
        }
    }

    fn handler(result: Result<usize, DomainError>) -> QueryHandler {
        QueryHandler::new(
            Arc::new(Fixed(result)),
            CancellationToken::new(),
            Duration::from_secs(1),
        )
    }

    fn query_bytes(id: u16) -> Vec<u8> {
        let mut message = Message::new();
        message
            .set_id(id)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        message.add_query(Query::query(Name::from_str("example.com.").unwrap(), RecordType::A));
        message.to_vec().unwrap()
    }

    fn client() -> IpAddr {
        "127.0.0.1".parse().unwrap()
    }

    #[tokio::test]
    async fn test_answers_query() {
        let bytes = handler(Ok(1))
            .handle(&query_bytes(99), client(), RequestProtocol::Udp)
            .await
            .unwrap();
        let reply = Message::from_vec(&bytes).unwrap();

        assert_eq!(reply.id(), 99);
        assert_eq!(reply.response_code(), ResponseCode::NoError);
        assert_eq!(reply.answers().len(), 1);
    }

    #[tokio::test]
    async fn test_chain_error_becomes_servfail() {
        let bytes = handler(Err(DomainError::NoUpstream))
            .handle(&query_bytes(7), client(), RequestProtocol::Tcp)
            .await
            .unwrap();
        let reply = Message::from_vec(&bytes).unwrap();

        assert_eq!(reply.id(), 7);
        assert_eq!(reply.response_code(), ResponseCode::ServFail);
    }

    #[tokio::test]
    async fn test_query_without_question_is_formerr() {
        let mut message = Message::new();
        message.set_id(3);
        let bytes = handler(Ok(1))
            .handle(&message.to_vec().unwrap(), client(), RequestProtocol::Udp)
            .await
            .unwrap();

        assert_eq!(Message::from_vec(&bytes).unwrap().response_code(), ResponseCode::FormErr);
    }

    #[tokio::test]
    async fn test_garbage_gets_formerr_with_its_id() {
        let bytes = handler(Ok(1))
            .handle(&[0x12, 0x34, 0xff], client(), RequestProtocol::Udp)
            .await
            .unwrap();
        let reply = Message::from_vec(&bytes).unwrap();

        assert_eq!(reply.id(), 0x1234);
        assert_eq!(reply.response_code(), ResponseCode::FormErr);
    }

    #[tokio::test]
    async fn test_large_udp_reply_is_truncated() {
        let handler = handler(Ok(100));
        let bytes = handler
            .handle(&query_bytes(5), client(), RequestProtocol::Udp)
            .await
            .unwrap();
        let reply = Message::from_vec(&bytes).unwrap();
        assert!(reply.truncated());
        assert!(reply.answers().is_empty());

        let bytes = handler
            .handle(&query_bytes(5), client(), RequestProtocol::Tcp)
            .await
            .unwrap();
        let reply = Message::from_vec(&bytes).unwrap();
        assert!(!reply.truncated());
        assert_eq!(reply.answers().len(), 100);
    }
}
