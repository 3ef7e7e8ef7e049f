use hickory_proto::op::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    Resolved,
    Cached,
    Conditional,
    CustomDns,
    HostsFile,
    NotFqdn,
    Blocked,
    Filtered,
    Special,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Resolved => "RESOLVED",
            ResponseType::Cached => "CACHED",
            ResponseType::Conditional => "CONDITIONAL",
            ResponseType::CustomDns => "CUSTOMDNS",
            ResponseType::HostsFile => "HOSTSFILE",
            ResponseType::NotFqdn => "NOTFQDN",
            ResponseType::Blocked => "BLOCKED",
            ResponseType::Filtered => "FILTERED",
            ResponseType::Special => "SPECIAL",
        }
    }

    pub fn to_extended_error_code(self) -> ExtendedErrorCode {
        match self {
            ResponseType::Resolved => ExtendedErrorCode::Other,
            ResponseType::Cached => ExtendedErrorCode::CachedError,
            ResponseType::Conditional | ResponseType::CustomDns | ResponseType::HostsFile => {
                ExtendedErrorCode::ForgedAnswer
            }
            ResponseType::NotFqdn | ResponseType::Blocked => ExtendedErrorCode::Blocked,
            ResponseType::Filtered | ResponseType::Special => ExtendedErrorCode::Filtered,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extended DNS Error codes (RFC 8914) used by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ExtendedErrorCode {
    Other = 0,
    ForgedAnswer = 4,
    CachedError = 13,
    Blocked = 15,
    Filtered = 17,
}

impl ExtendedErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Final answer of the resolver chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub message: Message,
    pub reason: String,
    pub rtype: ResponseType,
}

impl Response {
    pub fn new(message: Message, rtype: ResponseType, reason: impl Into<String>) -> Self {
        Self {
            message,
            reason: reason.into(),
            rtype,
        }
    }
}
