//! Lazy record parsers over list bytes.
//!
//! A parser yields one record per [`SeriesParser::next`] call. Errors are either resumable
//! (skip the record, keep going) or non-resumable (the rest of the input is unusable).
//! [`for_each`] drives a parser to the end and prefixes any error with the parser position.

mod allow_errors;
mod error;
mod lines;
mod series;

pub use allow_errors::AllowErrors;
pub use error::ParseError;
pub use lines::{LineGrammar, LineSeriesParser, Lines, MAX_LINE_LENGTH};
pub use series::{for_each, SeriesParser};
