use bguard_application::parsers::{LineGrammar, ParseError};
use regex::{Regex, RegexBuilder};
use std::net::IpAddr;

/// Host names that hosts-format blocklists carry as boilerplate.
const HOSTS_BOILERPLATE: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "broadcasthost",
    "local",
    "ip6-localhost",
    "ip6-loopback",
    "ip6-localnet",
    "ip6-mcastprefix",
    "ip6-allnodes",
    "ip6-allrouters",
    "ip6-allhosts",
    "0.0.0.0",
];

#[derive(Debug, Clone)]
pub enum ListEntry {
    /// Matches exactly this name.
    Exact(String),
    /// `*.example.com`: matches `example.com` and every name below it.
    Wildcard(String),
    /// `/pattern/`: matches names the expression finds a match in.
    Regex(Regex),
}

/// Grammar of denylist and allowlist sources.
///
/// One line holds a plain name, a hosts-style `IP name [name...]` entry, a `*.` wildcard or a
/// `/regex/`. `#` starts a comment anywhere outside a regex.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListEntryGrammar;

impl LineGrammar for ListEntryGrammar {
    type Record = Vec<ListEntry>;

    fn parse_line(&self, line: &str) -> Result<Option<Self::Record>, ParseError> {
        let line = line.trim();

        if let Some(body) = line.strip_prefix('/') {
            return parse_regex(body).map(|entry| Some(vec![entry]));
        }

        let line = strip_comment(line);
        if line.is_empty() {
            return Ok(None);
        }

        let mut tokens = line.split_whitespace();
        let first = tokens.next().unwrap_or_default();

        if first.parse::<IpAddr>().is_ok() {
            let names: Vec<&str> = tokens.collect();
            if names.is_empty() {
                return Err(ParseError::resumable(format!(
                    "address '{}' without host name",
                    first
                )));
            }
            let entries = names
                .into_iter()
                .filter(|name| !HOSTS_BOILERPLATE.contains(&name.to_ascii_lowercase().as_str()))
                .map(parse_name_entry)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(if entries.is_empty() { None } else { Some(entries) });
        }

        if tokens.next().is_some() {
            return Err(ParseError::resumable(format!(
                "unexpected text after '{}'",
                first
            )));
        }

        parse_name_entry(first).map(|entry| Some(vec![entry]))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => line[..pos].trim_end(),
        None => line,
    }
}

fn parse_regex(body: &str) -> Result<ListEntry, ParseError> {
    let Some(end) = closing_slash(body) else {
        return Err(ParseError::resumable("regex is missing its closing '/'"));
    };
    let trailing = body[end + 1..].trim();
    if !trailing.is_empty() && !trailing.starts_with('#') {
        return Err(ParseError::resumable(format!(
            "unexpected text after regex: '{}'",
            trailing
        )));
    }

    let pattern = &body[..end];
    if pattern.is_empty() {
        return Err(ParseError::resumable("empty regex"));
    }

    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(1 << 20)
        .build()
        .map(ListEntry::Regex)
        .map_err(|e| ParseError::resumable(format!("invalid regex '{}': {}", pattern, e)))
}

/// Byte offset of the first `/` not escaped by a backslash.
fn closing_slash(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (pos, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => return Some(pos),
            _ => {}
        }
    }
    None
}

fn parse_name_entry(token: &str) -> Result<ListEntry, ParseError> {
    if let Some(base) = token.strip_prefix("*.") {
        return normalize_domain(base).map(ListEntry::Wildcard);
    }
    normalize_domain(token).map(ListEntry::Exact)
}

/// Lowercases `raw`, strips a trailing dot and checks the characters allowed in list names.
pub fn normalize_domain(raw: &str) -> Result<String, ParseError> {
    let name = raw.strip_suffix('.').unwrap_or(raw).to_ascii_lowercase();

    if name.is_empty() {
        return Err(ParseError::resumable("empty domain name"));
    }
    if name.parse::<IpAddr>().is_ok() {
        return Err(ParseError::resumable(format!(
            "'{}' is an address, not a domain",
            raw
        )));
    }
    if name.split('.').any(str::is_empty) {
        return Err(ParseError::resumable(format!("empty label in '{}'", raw)));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ParseError::resumable(format!(
            "invalid character '{}' in '{}'",
            bad, raw
        )));
    }
    Ok(name)
}
