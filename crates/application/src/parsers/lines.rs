use super::error::ParseError;
use super::series::SeriesParser;

/// Lines longer than this are treated as corrupt input.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Splits a byte buffer into lines, tracking 1-based line numbers.
pub struct Lines<'a> {
    data: &'a [u8],
    offset: usize,
    line_no: usize,
}

impl<'a> Lines<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            line_no: 0,
        }
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Next line without its terminator (`\n` or `\r\n`).
    pub fn next_line(&mut self) -> Result<Option<&'a str>, ParseError> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }

        let rest = &self.data[self.offset..];
        let (raw, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.offset += consumed;
        self.line_no += 1;

        if raw.len() > MAX_LINE_LENGTH {
            return Err(ParseError::non_resumable(format!(
                "line exceeds {} bytes",
                MAX_LINE_LENGTH
            )));
        }

        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        std::str::from_utf8(raw)
            .map(Some)
            .map_err(|_| ParseError::resumable("line is not valid UTF-8"))
    }
}

/// Parses one line into at most one record. `Ok(None)` skips the line.
pub trait LineGrammar {
    type Record;

    fn parse_line(&self, line: &str) -> Result<Option<Self::Record>, ParseError>;
}

/// [`SeriesParser`] applying a [`LineGrammar`] to each line of the input.
pub struct LineSeriesParser<'a, G> {
    lines: Lines<'a>,
    grammar: &'a G,
}

impl<'a, G: LineGrammar> LineSeriesParser<'a, G> {
    pub fn new(data: &'a [u8], grammar: &'a G) -> Self {
        Self {
            lines: Lines::new(data),
            grammar,
        }
    }
}

impl<G: LineGrammar> SeriesParser for LineSeriesParser<'_, G> {
    type Item = G::Record;

    fn next(&mut self) -> Result<Option<Self::Item>, ParseError> {
        while let Some(line) = self.lines.next_line()? {
            if let Some(record) = self.grammar.parse_line(line)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn position(&self) -> String {
        format!("line {}", self.lines.line_no())
    }
}
