//! bguard domain layer
pub mod config;
pub mod dns_message;
pub mod errors;
pub mod list_source;
pub mod request;
pub mod response;

pub use config::{
    BlockType, CliOverrides, Config, ConfigError, DownloadPolicy, InitStrategy, RefreshPolicy,
    SourceLoadingConfig, UpstreamStrategy,
};
pub use errors::DomainError;
pub use list_source::{ListSource, ListSourceKind};
pub use request::{Request, RequestProtocol};
pub use response::{ExtendedErrorCode, Response, ResponseType};
