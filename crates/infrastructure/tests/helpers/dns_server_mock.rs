#![allow(dead_code)]
use bguard_domain::dns_message::address_reply;
use hickory_proto::op::Message;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// UDP server on an ephemeral local port answering every A question with one address.
pub struct MockDnsServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(answer: IpAddr) -> Result<Self, std::io::Error> {
        Self::start_with(move |query| Some(address_reply(query, &[answer], 60))).await
    }

    /// `respond` returning `None` drops the query.
    pub async fn start_with<F>(respond: F) -> Result<Self, std::io::Error>
    where
        F: Fn(&Message) -> Option<Message> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        let Ok(query) = Message::from_vec(&buf[..len]) else { continue };
                        if let Some(reply) = respond(&query) {
                            if let Ok(bytes) = reply.to_vec() {
                                let _ = socket.send_to(&bytes, peer).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
