pub mod resolver;
pub mod transport;

pub use resolver::{ChainHandle, ResolverChain, ResolverChainBuilder};
pub use transport::{DnsTransport, NetworkTransport};
