//! bguard application layer: resolver and list-loading ports plus the use cases driving them
pub mod parsers;
pub mod ports;
pub mod use_cases;
