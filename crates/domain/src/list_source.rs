use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Tag of a [`ListSource`] as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSourceKind {
    Text,
    Http,
    File,
}

impl ListSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListSourceKind::Text => "text",
            ListSourceKind::Http => "http",
            ListSourceKind::File => "file",
        }
    }
}

impl FromStr for ListSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text" => Ok(ListSourceKind::Text),
            "http" => Ok(ListSourceKind::Http),
            "file" => Ok(ListSourceKind::File),
            other => Err(format!(
                "unknown list source type '{}' (expected text, http or file)",
                other
            )),
        }
    }
}

impl fmt::Display for ListSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a denylist, allowlist or hosts file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawListSource", into = "RawListSource")]
pub enum ListSource {
    Text(String),
    Http(String),
    File(PathBuf),
}

impl ListSource {
    pub fn new(kind: ListSourceKind, from: impl Into<String>) -> Self {
        let from = from.into();
        match kind {
            ListSourceKind::Text => ListSource::Text(from),
            ListSourceKind::Http => ListSource::Http(from),
            ListSourceKind::File => ListSource::File(PathBuf::from(from)),
        }
    }

    /// Guesses the kind from the value alone: URLs are HTTP, multi-line values are inline text
    /// and anything else is a file path.
    pub fn from_short(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ListSource::Http(trimmed.to_string())
        } else if value.contains('\n') {
            ListSource::Text(value.to_string())
        } else {
            ListSource::File(PathBuf::from(trimmed))
        }
    }

    pub fn kind(&self) -> ListSourceKind {
        match self {
            ListSource::Text(_) => ListSourceKind::Text,
            ListSource::Http(_) => ListSourceKind::Http,
            ListSource::File(_) => ListSourceKind::File,
        }
    }
}

impl fmt::Display for ListSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListSource::Text(text) => {
                let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                write!(f, "text:\"{}...\"", first.trim())
            }
            ListSource::Http(url) => f.write_str(url),
            ListSource::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawListSource {
    Short(String),
    Tagged {
        #[serde(rename = "type")]
        kind: String,
        from: String,
    },
}

impl TryFrom<RawListSource> for ListSource {
    type Error = String;

    fn try_from(raw: RawListSource) -> Result<Self, Self::Error> {
        match raw {
            RawListSource::Short(value) => Ok(ListSource::from_short(&value)),
            RawListSource::Tagged { kind, from } => {
                let kind = ListSourceKind::from_str(&kind)?;
                Ok(ListSource::new(kind, from))
            }
        }
    }
}

impl From<ListSource> for RawListSource {
    fn from(source: ListSource) -> Self {
        let kind = source.kind().as_str().to_string();
        let from = match source {
            ListSource::Text(text) | ListSource::Http(text) => text,
            ListSource::File(path) => path.to_string_lossy().into_owned(),
        };
        RawListSource::Tagged { kind, from }
    }
}
