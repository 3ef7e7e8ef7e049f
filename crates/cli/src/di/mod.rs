mod dns;
mod lists;

pub use dns::build_chain;
pub use lists::ListServices;

use bguard_domain::Config;
use bguard_infrastructure::dns::{ChainHandle, NetworkTransport};
use std::sync::Arc;

pub struct Services {
    pub lists: ListServices,
    pub chain: Arc<ChainHandle>,
}

impl Services {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let lists = ListServices::new(config)?;
        let chain = build_chain(config, &lists, Arc::new(NetworkTransport::new()))?;
        Ok(Self {
            lists,
            chain: Arc::new(ChainHandle::new(chain)),
        })
    }
}
