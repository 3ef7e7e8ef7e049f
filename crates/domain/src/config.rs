pub mod blocking;
pub mod errors;
pub mod loading;
pub mod logging;
pub mod migration;
pub mod resolvers;
pub mod root;
pub mod server;
pub mod upstream;

pub use blocking::{BlockType, BlockingConfig, DEFAULT_BLOCKING_REFRESH, DEFAULT_CLIENT_GROUP};
pub use errors::ConfigError;
pub use loading::{DownloadConfig, DownloadPolicy, InitStrategy, RefreshPolicy, SourceLoadingConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use migration::{Deprecated, MIGRATIONS};
pub use resolvers::{
    CachingConfig, ConditionalConfig, CustomDnsConfig, EdeConfig, FilteringConfig,
    FqdnOnlyConfig, HostsFileConfig, SpecialUseDomainsConfig, DEFAULT_HOSTS_REFRESH,
};
pub use root::{CliOverrides, Config};
pub use server::PortsConfig;
pub use upstream::{parse_upstream, UpstreamStrategy, UpstreamsConfig};
