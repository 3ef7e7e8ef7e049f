use super::handler::QueryHandler;
use bguard_application::ports::Resolver;
use bguard_domain::RequestProtocol;
use bguard_infrastructure::dns::transport::{read_with_length_prefix, send_with_length_prefix};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Upper bound for one query, from receipt to reply.
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// An idle TCP connection is closed after this long.
const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

const UDP_RECV_BUFFER: usize = 4096;

/// Serves DNS on UDP and TCP at `bind_addr` until `shutdown` is cancelled.
pub async fn start_dns_server(
    bind_addr: SocketAddr,
    resolver: Arc<dyn Resolver>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let udp = Arc::new(UdpSocket::bind(bind_addr).await?);
    let tcp = TcpListener::bind(bind_addr).await?;
    let handler = Arc::new(QueryHandler::new(resolver, shutdown.clone(), QUERY_TIMEOUT));

    info!(bind_address = %bind_addr, "DNS server ready on UDP and TCP");

    let udp_task = tokio::spawn(run_udp(udp, handler.clone(), shutdown.clone()));
    let tcp_task = tokio::spawn(run_tcp(tcp, handler, shutdown.clone()));

    let (udp_result, tcp_result) = tokio::join!(udp_task, tcp_task);
    udp_result?;
    tcp_result?;

    info!("DNS server stopped");
    Ok(())
}

async fn run_udp(socket: Arc<UdpSocket>, handler: Arc<QueryHandler>, shutdown: CancellationToken) {
    let mut buf = [0u8; UDP_RECV_BUFFER];
    loop {
        let (len, from) = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    // ICMP port unreachable from a previous reply surfaces here on some platforms.
                    debug!(error = %e, "UDP recv error");
                    continue;
                }
            },
        };

        let query: Arc<[u8]> = Arc::from(&buf[..len]);
        let socket = socket.clone();
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Some(reply) = handler.handle(&query, from.ip(), RequestProtocol::Udp).await {
                if let Err(e) = socket.send_to(&reply, from).await {
                    debug!(client = %from, error = %e, "UDP send error");
                }
            }
        });
    }
}

async fn run_tcp(listener: TcpListener, handler: Arc<QueryHandler>, shutdown: CancellationToken) {
    loop {
        let (stream, from) = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "TCP accept error");
                    continue;
                }
            },
        };

        let handler = handler.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            serve_connection(stream, from, handler, shutdown).await;
        });
    }
}

/// Answers queries on one connection in order until the peer closes it or goes idle.
async fn serve_connection(
    mut stream: TcpStream,
    from: SocketAddr,
    handler: Arc<QueryHandler>,
    shutdown: CancellationToken,
) {
    loop {
        let query = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            read = tokio::time::timeout(TCP_IDLE_TIMEOUT, read_with_length_prefix(&mut stream)) => {
                match read {
                    Ok(Ok(query)) => query,
                    Ok(Err(_)) | Err(_) => return,
                }
            }
        };

        let Some(reply) = handler.handle(&query, from.ip(), RequestProtocol::Tcp).await else {
            return;
        };
        if let Err(e) = send_with_length_prefix(&mut stream, &reply).await {
            debug!(client = %from, error = %e, "TCP send error");
            return;
        }
    }
}
