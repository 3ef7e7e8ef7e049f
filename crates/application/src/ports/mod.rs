mod byte_source;
mod refreshable;
mod resolver;

pub use byte_source::ByteSourceFetcher;
pub use refreshable::Refreshable;
pub use resolver::{ResolveContext, Resolver};
