mod common;

use common::FakeResolver;
use std::sync::Arc;
use tldv6::dns::enums::DNSResourceType::{AAAA, NS};
use tldv6::error::LookupError;
use tldv6::probe::{CheckVerdict, Ipv6Prober, RetryPolicy};

fn prober(resolver: &Arc<FakeResolver>) -> Ipv6Prober {
    Ipv6Prober::new(resolver.clone())
}

#[tokio::test]
async fn first_name_server_with_ipv6_short_circuits() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("example.", &["ns1.example.org.", "ns2.example.org."])
            .aaaa("ns1.example.org.", "2001:db8::53")
            .aaaa("ns2.example.org.", "2001:db8::54"),
    );

    let verdict = prober(&resolver).probe("example").await;

    assert_eq!(verdict, CheckVerdict::Ok);
    assert_eq!(resolver.count("ns1.example.org.", AAAA), 1);
    assert_eq!(resolver.count("ns2.example.org.", AAAA), 0);
}

#[tokio::test]
async fn no_answer_is_not_retried() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("example.", &["ns1.example.org."])
            .fail("ns1.example.org.", AAAA, LookupError::NoAnswer),
    );

    let verdict = prober(&resolver).probe("example.").await;

    assert_eq!(verdict, CheckVerdict::NoIpv6);
    assert_eq!(resolver.count("ns1.example.org.", AAAA), 1);
}

#[tokio::test]
async fn all_attempts_timing_out_is_all_timed_out() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("slowtld.", &["ns1.slowtld."])
            .fail("ns1.slowtld.", AAAA, LookupError::Timeout),
    );

    let verdict = prober(&resolver).probe("slowtld.").await;

    assert_eq!(verdict, CheckVerdict::AllTimedOut);
    assert_eq!(resolver.count("ns1.slowtld.", AAAA), 3);
}

#[tokio::test]
async fn ns_lookup_timeout_skips_name_server_probing() {
    let resolver = Arc::new(FakeResolver::new().fail("missing.", NS, LookupError::Timeout));

    let verdict = prober(&resolver).probe("missing.").await;

    assert_eq!(verdict, CheckVerdict::LookupTimeout);
    assert_eq!(resolver.calls().len(), 1);
}

#[tokio::test]
async fn ns_lookup_failures_map_to_verdicts() {
    let resolver = Arc::new(
        FakeResolver::new()
            .fail("broken.", NS, LookupError::NoNameservers("SERVFAIL".to_string()))
            .fail("empty.", NS, LookupError::NoAnswer)
            .fail("gone.", NS, LookupError::NxDomain),
    );
    let prober = prober(&resolver);

    assert_eq!(prober.probe("broken.").await, CheckVerdict::NoNameservers);
    assert_eq!(prober.probe("empty.").await, CheckVerdict::NoAnswer);
    assert_eq!(prober.probe("gone.").await, CheckVerdict::NoAnswer);
    assert!(resolver.calls().iter().all(|(_, rtype)| *rtype == NS));
}

#[tokio::test]
async fn timeout_then_success_stops_retrying() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("flaky.", &["ns1.flaky."])
            .fail("ns1.flaky.", AAAA, LookupError::Timeout)
            .aaaa("ns1.flaky.", "2001:db8::1"),
    );

    let verdict = prober(&resolver).probe("flaky.").await;

    assert_eq!(verdict, CheckVerdict::Ok);
    assert_eq!(resolver.count("ns1.flaky.", AAAA), 2);
}

#[tokio::test]
async fn timeout_then_nxdomain_moves_to_next_name_server() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("mixed.", &["a.ns.mixed.", "b.ns.mixed."])
            .fail("a.ns.mixed.", AAAA, LookupError::Timeout)
            .fail("a.ns.mixed.", AAAA, LookupError::NxDomain)
            .aaaa("b.ns.mixed.", "2001:db8::b"),
    );

    let verdict = prober(&resolver).probe("mixed.").await;

    assert_eq!(verdict, CheckVerdict::Ok);
    assert_eq!(resolver.count("a.ns.mixed.", AAAA), 2);
    assert_eq!(resolver.count("b.ns.mixed.", AAAA), 1);
}

#[tokio::test]
async fn exhausted_name_server_aborts_remaining_ones() {
    // Name servers are probed in sorted order, so a.* goes first.
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("abort.", &["b.ns.abort.", "a.ns.abort."])
            .fail("a.ns.abort.", AAAA, LookupError::Timeout)
            .aaaa("b.ns.abort.", "2001:db8::b"),
    );

    let verdict = prober(&resolver).probe("abort.").await;

    assert_eq!(verdict, CheckVerdict::AllTimedOut);
    assert_eq!(resolver.count("b.ns.abort.", AAAA), 0);
}

#[tokio::test]
async fn continuing_policy_moves_past_exhausted_name_server() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("abort.", &["a.ns.abort.", "b.ns.abort."])
            .fail("a.ns.abort.", AAAA, LookupError::Timeout)
            .aaaa("b.ns.abort.", "2001:db8::b"),
    );
    let policy = RetryPolicy {
        abort_on_exhaustion: false,
        ..RetryPolicy::REFERENCE
    };

    let verdict = Ipv6Prober::with_policy(resolver.clone(), policy)
        .probe("abort.")
        .await;

    assert_eq!(verdict, CheckVerdict::Ok);
    assert_eq!(resolver.count("a.ns.abort.", AAAA), 3);
}

#[tokio::test]
async fn continuing_policy_reports_all_timed_out_only_when_every_server_did() {
    let all_slow = Arc::new(
        FakeResolver::new()
            .ns("slow.", &["a.slow.", "b.slow."])
            .fail("a.slow.", AAAA, LookupError::Timeout)
            .fail("b.slow.", AAAA, LookupError::Timeout),
    );
    let partly_slow = Arc::new(
        FakeResolver::new()
            .ns("slow.", &["a.slow.", "b.slow."])
            .fail("a.slow.", AAAA, LookupError::Timeout)
            .fail("b.slow.", AAAA, LookupError::NoAnswer),
    );
    let policy = RetryPolicy {
        abort_on_exhaustion: false,
        ..RetryPolicy::REFERENCE
    };

    assert_eq!(
        Ipv6Prober::with_policy(all_slow, policy).probe("slow.").await,
        CheckVerdict::AllTimedOut
    );
    assert_eq!(
        Ipv6Prober::with_policy(partly_slow, policy).probe("slow.").await,
        CheckVerdict::NoIpv6
    );
}

#[tokio::test]
async fn name_server_names_are_deduplicated_case_insensitively() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("dup.", &["NS1.DUP.", "ns1.dup."])
            .fail("ns1.dup.", AAAA, LookupError::NoAnswer),
    );

    assert_eq!(prober(&resolver).probe("dup.").await, CheckVerdict::NoIpv6);
    assert_eq!(resolver.count("ns1.dup.", AAAA), 1);
}

#[tokio::test]
async fn probing_twice_gives_the_same_verdict() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("stable.", &["ns1.stable.", "ns2.stable."])
            .fail("ns1.stable.", AAAA, LookupError::NoAnswer)
            .fail("ns2.stable.", AAAA, LookupError::NxDomain),
    );
    let prober = prober(&resolver);

    let first = prober.probe("stable.").await;
    let second = prober.probe("stable.").await;
    assert_eq!(first, CheckVerdict::NoIpv6);
    assert_eq!(first, second);
}

#[tokio::test]
async fn retry_count_is_per_name_server() {
    let resolver = Arc::new(
        FakeResolver::new()
            .ns("retry.", &["a.retry.", "b.retry."])
            .fail("a.retry.", AAAA, LookupError::Timeout)
            .fail("a.retry.", AAAA, LookupError::Timeout)
            .fail("a.retry.", AAAA, LookupError::NoAnswer)
            .fail("b.retry.", AAAA, LookupError::Timeout)
            .fail("b.retry.", AAAA, LookupError::Timeout)
            .aaaa("b.retry.", "2001:db8::2"),
    );

    assert_eq!(prober(&resolver).probe("retry.").await, CheckVerdict::Ok);
    assert_eq!(resolver.count("a.retry.", AAAA), 3);
    assert_eq!(resolver.count("b.retry.", AAAA), 3);
}
