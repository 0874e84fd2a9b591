mod common;

use std::net::TcpListener;
use std::time::Duration;

use common::{bypass_proxy, standard_responses, MockDoh};
use mxsift::models::Reason;
use mxsift::pipeline::{DohResolver, EmailValidator, LookupError, MxLookup};

fn resolver_for(mock: &MockDoh) -> DohResolver {
    bypass_proxy();
    DohResolver::new(mock.url.clone(), Some(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn test_resolver_returns_mx_records() {
    let mock = MockDoh::start(standard_responses());
    let resolver = resolver_for(&mock);

    let records = resolver.lookup_mx("example.com").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].data, "10 mx.example.com.");
}

#[tokio::test]
async fn test_resolver_sends_name_and_type() {
    let mock = MockDoh::start(standard_responses());
    let resolver = resolver_for(&mock);

    resolver.lookup_mx("example.com").await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET /resolve?"));
    assert!(requests[0].contains("name=example.com"));
    assert!(requests[0].contains("type=MX"));
}

#[tokio::test]
async fn test_resolver_without_answer_is_empty() {
    let mock = MockDoh::start(standard_responses());
    let resolver = resolver_for(&mock);

    assert!(resolver.lookup_mx("nomx.test").await.unwrap().is_empty());
    // Unknown names get NXDOMAIN from the mock
    assert!(resolver.lookup_mx("unknown.test").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resolver_http_error_status() {
    let mock = MockDoh::start(standard_responses());
    let resolver = resolver_for(&mock);

    let err = resolver.lookup_mx("broken.test").await.unwrap_err();
    assert!(matches!(err, LookupError::Status(500)));
}

#[tokio::test]
async fn test_resolver_undecodable_body() {
    let mock = MockDoh::start(standard_responses());
    let resolver = resolver_for(&mock);

    let err = resolver.lookup_mx("garbled.test").await.unwrap_err();
    assert!(matches!(err, LookupError::Decode(_)));
}

#[tokio::test]
async fn test_resolver_unreachable_endpoint() {
    bypass_proxy();
    // Grab a free port and release it so nothing is listening there
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let resolver = DohResolver::new(
        format!("http://127.0.0.1:{}/resolve", port),
        Some(Duration::from_secs(2)),
    )
    .unwrap();

    let err = resolver.lookup_mx("example.com").await.unwrap_err();
    assert!(matches!(err, LookupError::Transport(_)));
}

#[tokio::test]
async fn test_validator_over_doh() {
    let mock = MockDoh::start(standard_responses());
    let validator = EmailValidator::new(resolver_for(&mock));

    let valid = validator.validate("a@example.com").await;
    let no_mx = validator.validate("b@nomx.test").await;
    let failed = validator.validate("c@broken.test").await;
    let garbled = validator.validate("d@garbled.test").await;
    let malformed = validator.validate("e@example").await;

    assert!(valid.is_valid);
    assert_eq!(no_mx.reason, Some(Reason::InvalidDomain));
    assert_eq!(failed.reason, Some(Reason::DomainVerificationFailed));
    assert_eq!(garbled.reason, Some(Reason::DomainVerificationFailed));
    assert_eq!(malformed.reason, Some(Reason::InvalidFormat));

    assert_eq!(
        mock.queried_domains(),
        vec!["example.com", "nomx.test", "broken.test", "garbled.test"]
    );
}
