mod helpers;

use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::{BlockType, ListSource, ResponseType};
use bguard_infrastructure::dns::resolver::BlockingResolver;
use bguard_infrastructure::lists::ListCache;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{RData, RecordType};
use helpers::builders::{source_loader, text, RequestBuilder};
use helpers::RecordingResolver;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Fixture {
    terminal: Arc<RecordingResolver>,
    denylists: Arc<ListCache>,
    allowlists: Arc<ListCache>,
}

async fn fixture(deny: &[(&str, &str)], allow: &[(&str, &str)]) -> Fixture {
    let to_lists = |pairs: &[(&str, &str)]| {
        let mut lists: BTreeMap<String, Vec<ListSource>> = BTreeMap::new();
        for (group, body) in pairs {
            lists.entry(group.to_string()).or_default().push(text(body));
        }
        lists
    };

    let denylists = Arc::new(ListCache::new("denylists", &to_lists(deny), source_loader(), 2));
    let allowlists = Arc::new(ListCache::new("allowlists", &to_lists(allow), source_loader(), 2));
    let token = CancellationToken::new();
    denylists.refresh(&token).await.unwrap();
    allowlists.refresh(&token).await.unwrap();

    Fixture {
        terminal: Arc::new(RecordingResolver::new("10.0.0.1")),
        denylists,
        allowlists,
    }
}

fn blocking(
    fixture: &Fixture,
    clients: &[(&str, &[&str])],
    block_type: BlockType,
) -> BlockingResolver {
    let client_groups = clients
        .iter()
        .map(|(client, groups)| {
            (client.to_string(), groups.iter().map(|g| g.to_string()).collect())
        })
        .collect();
    BlockingResolver::new(
        Arc::clone(&fixture.denylists),
        Arc::clone(&fixture.allowlists),
        &client_groups,
        block_type,
        3600,
        fixture.terminal.clone(),
    )
}

#[tokio::test]
async fn test_denylisted_name_is_blocked_with_zero_ip() {
    let fixture = fixture(&[("ads", "ads.example.com\n*.tracker.net")], &[]).await;
    let stage = blocking(&fixture, &[("default", &["ads"])], BlockType::ZeroIp);

    let response = stage
        .resolve(&ResolveContext::background(), &RequestBuilder::a("x.tracker.net").build())
        .await
        .unwrap();

    assert_eq!(response.rtype, ResponseType::Blocked);
    assert_eq!(response.reason, "BLOCKED (ads)");
    match response.message.answers()[0].data() {
        Some(RData::A(a)) => assert!(a.0.is_unspecified()),
        other => panic!("unexpected answer {:?}", other),
    }

    let response = stage
        .resolve(
            &ResolveContext::background(),
            &RequestBuilder::query("ads.example.com", RecordType::AAAA).build(),
        )
        .await
        .unwrap();
    match response.message.answers()[0].data() {
        Some(RData::AAAA(aaaa)) => assert!(aaaa.0.is_unspecified()),
        other => panic!("unexpected answer {:?}", other),
    }
    assert_eq!(fixture.terminal.calls(), 0);
}

#[tokio::test]
async fn test_allowlist_wins_over_denylist() {
    let fixture = fixture(
        &[("ads", "*.example.com")],
        &[("ads", "good.example.com")],
    )
    .await;
    let stage = blocking(&fixture, &[("default", &["ads"])], BlockType::NxDomain);

    let response = stage
        .resolve(&ResolveContext::background(), &RequestBuilder::a("good.example.com").build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::Resolved);

    let response = stage
        .resolve(&ResolveContext::background(), &RequestBuilder::a("bad.example.com").build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::Blocked);
    assert_eq!(response.message.response_code(), ResponseCode::NXDomain);
}

#[tokio::test]
async fn test_client_groups_by_name_and_ip() {
    let fixture = fixture(
        &[("kids", "games.com"), ("ads", "ads.com")],
        &[],
    )
    .await;
    let stage = blocking(
        &fixture,
        &[
            ("default", &["ads"]),
            ("Laptop", &["kids"]),
            ("192.168.1.77", &["kids", "ads"]),
        ],
        BlockType::ZeroIp,
    );
    let ctx = ResolveContext::background();

    let by_name = RequestBuilder::a("games.com").client_name("laptop").build();
    assert_eq!(stage.resolve(&ctx, &by_name).await.unwrap().rtype, ResponseType::Blocked);

    // named client without "ads" in its groups
    let named_ads = RequestBuilder::a("ads.com").client_name("laptop").build();
    assert_eq!(stage.resolve(&ctx, &named_ads).await.unwrap().rtype, ResponseType::Resolved);

    let by_ip = RequestBuilder::a("ads.com").from_ip("192.168.1.77").build();
    assert_eq!(stage.resolve(&ctx, &by_ip).await.unwrap().rtype, ResponseType::Blocked);

    let default_client = RequestBuilder::a("games.com").build();
    assert_eq!(stage.resolve(&ctx, &default_client).await.unwrap().rtype, ResponseType::Resolved);
}

#[tokio::test]
async fn test_custom_block_ips() {
    let fixture = fixture(&[("ads", "ads.com")], &[]).await;
    let stage = blocking(
        &fixture,
        &[("default", &["ads"])],
        BlockType::CustomIps(vec!["192.168.1.1".parse().unwrap()]),
    );

    let response = stage
        .resolve(&ResolveContext::background(), &RequestBuilder::a("ads.com").build())
        .await
        .unwrap();
    match response.message.answers()[0].data() {
        Some(RData::A(a)) => assert_eq!(a.0.to_string(), "192.168.1.1"),
        other => panic!("unexpected answer {:?}", other),
    }

    // no IPv6 configured, falls back to ::
    let response = stage
        .resolve(
            &ResolveContext::background(),
            &RequestBuilder::query("ads.com", RecordType::AAAA).build(),
        )
        .await
        .unwrap();
    assert_eq!(response.message.answers().len(), 1);
}

#[tokio::test]
async fn test_regex_entries_block() {
    let fixture = fixture(&[("ads", "/^ad[0-9]+\\./")], &[]).await;
    let stage = blocking(&fixture, &[("default", &["ads"])], BlockType::NxDomain);

    let response = stage
        .resolve(&ResolveContext::background(), &RequestBuilder::a("AD42.cdn.com").build())
        .await
        .unwrap();
    assert_eq!(response.rtype, ResponseType::Blocked);
}
