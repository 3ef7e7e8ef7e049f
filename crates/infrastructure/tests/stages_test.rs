mod helpers;

use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::config::CustomDnsConfig;
use bguard_domain::ResponseType;
use bguard_infrastructure::dns::resolver::ede::extended_error;
use bguard_infrastructure::dns::resolver::{
    CustomDnsResolver, EdeResolver, FilteringResolver, FqdnOnlyResolver,
    SpecialUseDomainsResolver,
};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{RData, RecordType};
use helpers::builders::RequestBuilder;
use helpers::RecordingResolver;
use std::net::IpAddr;
use std::sync::Arc;

fn ctx() -> ResolveContext {
    ResolveContext::background()
}

fn answer_ips(message: &hickory_proto::op::Message) -> Vec<IpAddr> {
    message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::A(a)) => Some(IpAddr::V4(a.0)),
            Some(RData::AAAA(aaaa)) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_filtering_answers_configured_types_empty() {
    let terminal = Arc::new(RecordingResolver::new("10.0.0.1"));
    let stage = FilteringResolver::new([RecordType::AAAA], terminal.clone());

    let response = stage
        .resolve(&ctx(), &RequestBuilder::query("example.com", RecordType::AAAA).build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::Filtered);
    assert_eq!(response.message.response_code(), ResponseCode::NoError);
    assert!(response.message.answers().is_empty());

    let response = stage
        .resolve(&ctx(), &RequestBuilder::a("example.com").build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::Resolved);
    assert_eq!(terminal.calls(), 1);
}

#[tokio::test]
async fn test_fqdn_only_rejects_single_label_names() {
    let terminal = Arc::new(RecordingResolver::new("10.0.0.1"));
    let stage = FqdnOnlyResolver::new(true, terminal.clone());

    let response = stage
        .resolve(&ctx(), &RequestBuilder::a("printer").build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::NotFqdn);
    assert_eq!(response.message.response_code(), ResponseCode::NXDomain);

    let request = RequestBuilder::a("printer.lan").build();
    let forwarded = stage.resolve(&ctx(), &request).await.unwrap();
    assert_eq!(terminal.calls(), 1);

    let direct = terminal.resolve(&ctx(), &request).await.unwrap();
    assert_eq!(forwarded, direct);
}

#[tokio::test]
async fn test_custom_dns_covers_subdomains() {
    let mut config = CustomDnsConfig::default();
    config.mapping.insert(
        "My.Lan".to_string(),
        vec!["192.168.1.5".parse().unwrap(), "fd00::5".parse().unwrap()],
    );
    let terminal = Arc::new(RecordingResolver::new("10.0.0.1"));
    let stage = CustomDnsResolver::new(&config, terminal.clone());

    let response = stage
        .resolve(&ctx(), &RequestBuilder::a("nas.my.lan").build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::CustomDns);
    assert_eq!(answer_ips(&response.message), vec!["192.168.1.5".parse::<IpAddr>().unwrap()]);

    let response = stage
        .resolve(&ctx(), &RequestBuilder::query("my.lan", RecordType::MX).build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::CustomDns);
    assert!(response.message.answers().is_empty());

    stage
        .resolve(&ctx(), &RequestBuilder::a("notmy.lan").build())
        .await
        .unwrap();
    assert_eq!(terminal.calls(), 1);
}

#[tokio::test]
async fn test_special_use_domains() {
    let terminal = Arc::new(RecordingResolver::new("10.0.0.1"));
    let stage = SpecialUseDomainsResolver::new(true, terminal.clone());

    let response = stage
        .resolve(&ctx(), &RequestBuilder::a("app.localhost").build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::Special);
    assert_eq!(answer_ips(&response.message), vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);

    for name in ["foo.invalid", "printer.local", "x.onion", "router.home.arpa"] {
        let response = stage
            .resolve(&ctx(), &RequestBuilder::a(name).build())
            .await
            .unwrap();
        assert_eq!(response.message.response_code(), ResponseCode::NXDomain, "{}", name);
    }
    assert_eq!(terminal.calls(), 0);
}

#[tokio::test]
async fn test_ede_attached_only_to_non_resolved_answers() {
    let filtered = EdeResolver::new(
        true,
        Arc::new(FilteringResolver::new(
            [RecordType::AAAA],
            Arc::new(RecordingResolver::new("10.0.0.1")),
        )),
    );

    let response = filtered
        .resolve(
            &ctx(),
            &RequestBuilder::query("example.com", RecordType::AAAA).with_edns().build(),
        )
        .await
        .unwrap();
    assert_eq!(extended_error(&response.message), Some((17, "FILTERED".to_string())));

    let response = filtered
        .resolve(&ctx(), &RequestBuilder::a("example.com").with_edns().build())
        .await
        .unwrap();
    assert_eq!(extended_error(&response.message), None);
}

#[tokio::test]
async fn test_ede_not_sent_to_clients_without_edns() {
    let stage = EdeResolver::new(
        true,
        Arc::new(FqdnOnlyResolver::new(true, Arc::new(RecordingResolver::new("10.0.0.1")))),
    );
    let response = stage
        .resolve(&ctx(), &RequestBuilder::a("printer").build())
        .await
        .unwrap();

    assert_eq!(response.rtype, ResponseType::NotFqdn);
    assert!(response.message.extensions().is_none());
}

#[tokio::test]
async fn test_ede_disabled_leaves_message_untouched() {
    let stage = EdeResolver::new(
        false,
        Arc::new(FqdnOnlyResolver::new(true, Arc::new(RecordingResolver::new("10.0.0.1")))),
    );
    let response = stage
        .resolve(&ctx(), &RequestBuilder::a("printer").with_edns().build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::NotFqdn);
    assert_eq!(extended_error(&response.message), None);
}
