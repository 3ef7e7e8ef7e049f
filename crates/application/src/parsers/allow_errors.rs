use super::error::ParseError;
use super::series::SeriesParser;
use tracing::debug;

/// Skips resumable errors of the wrapped parser until more than `max_errors` have been seen.
///
/// `None` allows any number of errors. Non-resumable errors always pass through.
pub struct AllowErrors<P> {
    inner: P,
    max_errors: Option<usize>,
    error_count: usize,
}

impl<P: SeriesParser> AllowErrors<P> {
    pub fn new(inner: P, max_errors: Option<usize>) -> Self {
        Self {
            inner,
            max_errors,
            error_count: 0,
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: SeriesParser> SeriesParser for AllowErrors<P> {
    type Item = P::Item;

    fn next(&mut self) -> Result<Option<Self::Item>, ParseError> {
        loop {
            match self.inner.next() {
                Ok(item) => return Ok(item),
                Err(e) if e.is_non_resumable() => return Err(e),
                Err(e) => {
                    self.error_count += 1;
                    let e = e.at(self.inner.position());

                    if let Some(max) = self.max_errors {
                        if self.error_count > max {
                            return Err(ParseError::TooManyErrors {
                                count: self.error_count,
                                last: Box::new(e),
                            });
                        }
                    }

                    debug!(error = %e, "Skipping invalid list entry");
                }
            }
        }
    }

    fn position(&self) -> String {
        self.inner.position()
    }
}
