use crate::dns_message::normalize_name;
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::RecordType;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestProtocol {
    Tcp,
    Udp,
}

impl fmt::Display for RequestProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestProtocol::Tcp => f.write_str("TCP"),
            RequestProtocol::Udp => f.write_str("UDP"),
        }
    }
}

/// A client's DNS query as it travels through the resolver chain.
///
/// Built once per inbound query and only ever handed out by shared reference.
#[derive(Debug, Clone)]
pub struct Request {
    client_ip: IpAddr,
    client_id: Option<Arc<str>>,
    protocol: RequestProtocol,
    client_names: Vec<Arc<str>>,
    message: Message,
    received_at: SystemTime,
}

impl Request {
    pub fn new(client_ip: IpAddr, protocol: RequestProtocol, message: Message) -> Self {
        Self {
            client_ip,
            client_id: None,
            protocol,
            client_names: Vec::new(),
            message,
            received_at: SystemTime::now(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<Arc<str>>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.client_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_received_at(mut self, received_at: SystemTime) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn client_ip(&self) -> IpAddr {
        self.client_ip
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn protocol(&self) -> RequestProtocol {
        self.protocol
    }

    pub fn client_names(&self) -> &[Arc<str>] {
        &self.client_names
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    pub fn question(&self) -> Option<&Query> {
        self.message.queries().first()
    }

    /// Lowercased question name without the trailing root dot.
    pub fn question_name(&self) -> Option<String> {
        self.question().map(|q| normalize_name(q.name()))
    }

    pub fn query_type(&self) -> Option<RecordType> {
        self.question().map(|q| q.query_type())
    }
}
