#![allow(dead_code)]
use bguard_application::use_cases::{SourceFetcher, SourceLoader};
use bguard_application::ports::ByteSourceFetcher;
use bguard_domain::{DownloadPolicy, ListSource, Request, RequestProtocol};
use bguard_infrastructure::lists::ListSourceFetcher;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub struct RequestBuilder {
    name: String,
    qtype: RecordType,
    client_ip: IpAddr,
    client_names: Vec<String>,
    id: u16,
    edns: bool,
}

impl RequestBuilder {
    pub fn query(name: &str, qtype: RecordType) -> Self {
        Self {
            name: name.to_string(),
            qtype,
            client_ip: "192.168.1.20".parse().unwrap(),
            client_names: Vec::new(),
            id: 1234,
            edns: false,
        }
    }

    pub fn a(name: &str) -> Self {
        Self::query(name, RecordType::A)
    }

    pub fn from_ip(mut self, ip: &str) -> Self {
        self.client_ip = ip.parse().unwrap();
        self
    }

    pub fn client_name(mut self, name: &str) -> Self {
        self.client_names.push(name.to_string());
        self
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn with_edns(mut self) -> Self {
        self.edns = true;
        self
    }

    pub fn message(&self) -> Message {
        let mut message = Message::new();
        message
            .set_id(self.id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true);
        let fqdn = if self.name.ends_with('.') {
            self.name.clone()
        } else {
            format!("{}.", self.name)
        };
        message.add_query(Query::query(Name::from_str(&fqdn).unwrap(), self.qtype));
        if self.edns {
            let mut edns = Edns::new();
            edns.set_max_payload(1232);
            message.set_edns(edns);
        }
        message
    }

    pub fn build(self) -> Request {
        let message = self.message();
        Request::new(self.client_ip, RequestProtocol::Udp, message)
            .with_client_names(self.client_names)
    }
}

pub fn text(body: &str) -> ListSource {
    ListSource::Text(body.to_string())
}

/// Loader with a single download attempt and no error budget limit.
pub fn loader(fetcher: Arc<dyn ByteSourceFetcher>) -> SourceLoader {
    let policy = DownloadPolicy {
        timeout: Duration::from_secs(5),
        attempts: 1,
        cooldown: Duration::ZERO,
    };
    SourceLoader::new(SourceFetcher::new(fetcher, policy), None)
}

/// Loader reading inline, file and HTTP sources through the real fetcher.
pub fn source_loader() -> SourceLoader {
    let fetcher = ListSourceFetcher::new(Duration::from_secs(5)).unwrap();
    loader(Arc::new(fetcher))
}
