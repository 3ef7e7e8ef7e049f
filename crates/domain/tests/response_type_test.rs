use bguard_domain::{ExtendedErrorCode, ResponseType};

#[test]
fn test_extended_error_mapping_is_total() {
    let cases = [
        (ResponseType::Resolved, ExtendedErrorCode::Other),
        (ResponseType::Cached, ExtendedErrorCode::CachedError),
        (ResponseType::Conditional, ExtendedErrorCode::ForgedAnswer),
        (ResponseType::CustomDns, ExtendedErrorCode::ForgedAnswer),
        (ResponseType::HostsFile, ExtendedErrorCode::ForgedAnswer),
        (ResponseType::NotFqdn, ExtendedErrorCode::Blocked),
        (ResponseType::Blocked, ExtendedErrorCode::Blocked),
        (ResponseType::Filtered, ExtendedErrorCode::Filtered),
        (ResponseType::Special, ExtendedErrorCode::Filtered),
    ];

    for (rtype, code) in cases {
        assert_eq!(rtype.to_extended_error_code(), code, "{}", rtype);
    }
}

#[test]
fn test_extended_error_wire_values() {
    assert_eq!(ExtendedErrorCode::Other.as_u16(), 0);
    assert_eq!(ExtendedErrorCode::ForgedAnswer.as_u16(), 4);
    assert_eq!(ExtendedErrorCode::CachedError.as_u16(), 13);
    assert_eq!(ExtendedErrorCode::Blocked.as_u16(), 15);
    assert_eq!(ExtendedErrorCode::Filtered.as_u16(), 17);
}

#[test]
fn test_response_type_names() {
    assert_eq!(ResponseType::NotFqdn.to_string(), "NOTFQDN");
    assert_eq!(ResponseType::CustomDns.as_str(), "CUSTOMDNS");
    assert_eq!(ResponseType::HostsFile.as_str(), "HOSTSFILE");
}
