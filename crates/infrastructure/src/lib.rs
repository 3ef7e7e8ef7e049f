//! bguard infrastructure layer: resolver stages, upstream transport and list caches
pub mod dns;
pub mod lists;
