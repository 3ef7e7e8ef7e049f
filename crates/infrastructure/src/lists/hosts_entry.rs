use super::list_entry::normalize_domain;
use bguard_application::parsers::{LineGrammar, ParseError};
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsEntry {
    pub ip: IpAddr,
    pub names: Vec<String>,
}

/// `/etc/hosts` format: `IP name [alias...]`, `#` comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostsFileGrammar {
    pub filter_loopback: bool,
}

impl HostsFileGrammar {
    pub fn new(filter_loopback: bool) -> Self {
        Self { filter_loopback }
    }
}

impl LineGrammar for HostsFileGrammar {
    type Record = HostsEntry;

    fn parse_line(&self, line: &str) -> Result<Option<Self::Record>, ParseError> {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(None);
        };

        // `fe80::1%lo0` style zone suffixes are dropped
        let addr = first.split('%').next().unwrap_or(first);
        let ip: IpAddr = addr
            .parse()
            .map_err(|_| ParseError::resumable(format!("invalid address '{}'", first)))?;

        let names = tokens
            .map(normalize_domain)
            .collect::<Result<Vec<_>, _>>()?;
        if names.is_empty() {
            return Err(ParseError::resumable(format!(
                "address '{}' without host name",
                first
            )));
        }

        if self.filter_loopback && ip.is_loopback() {
            return Ok(None);
        }

        Ok(Some(HostsEntry { ip, names }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_aliases() {
        let entry = HostsFileGrammar::default()
            .parse_line("192.168.1.10  nas.lan NAS  # storage")
            .unwrap()
            .unwrap();
        assert_eq!(entry.ip, "192.168.1.10".parse::<IpAddr>().unwrap());
        assert_eq!(entry.names, vec!["nas.lan", "nas"]);
    }

    #[test]
    fn test_loopback_filtering() {
        let grammar = HostsFileGrammar::new(true);
        assert!(grammar.parse_line("127.0.0.1 localhost").unwrap().is_none());
        assert!(grammar.parse_line("::1 localhost").unwrap().is_none());
        assert!(HostsFileGrammar::new(false)
            .parse_line("127.0.0.1 localhost")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_invalid_lines() {
        let grammar = HostsFileGrammar::default();
        assert!(grammar.parse_line("not-an-ip host").is_err());
        assert!(grammar.parse_line("10.0.0.1").is_err());
        assert!(grammar.parse_line("   # only a comment").unwrap().is_none());
    }
}
