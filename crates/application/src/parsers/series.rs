use super::error::ParseError;
use tokio_util::sync::CancellationToken;

/// Parses a series of `Item`s, one per call.
pub trait SeriesParser {
    type Item;

    /// `Ok(None)` marks the end of the input.
    fn next(&mut self) -> Result<Option<Self::Item>, ParseError>;

    /// Cursor description, valid for the record returned by the last `next` call.
    fn position(&self) -> String;
}

/// Calls `callback` for every record until the input is exhausted.
///
/// Errors from the parser or the callback stop the iteration and are returned prefixed with
/// the parser position.
pub fn for_each<P, F>(
    token: &CancellationToken,
    parser: &mut P,
    mut callback: F,
) -> Result<(), ParseError>
where
    P: SeriesParser + ?Sized,
    F: FnMut(P::Item) -> Result<(), ParseError>,
{
    loop {
        if token.is_cancelled() {
            return Err(ParseError::Cancelled);
        }

        let item = match parser.next() {
            Ok(Some(item)) => item,
            Ok(None) => return Ok(()),
            Err(e) => return Err(e.at(parser.position())),
        };

        callback(item).map_err(|e| e.at(parser.position()))?;
    }
}
