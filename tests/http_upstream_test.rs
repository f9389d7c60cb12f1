//! HTTP transport tests against a mock product service.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;
use similar_products::domain::errors::{ErrorKind, ProductError};
use similar_products::domain::value_objects::ProductId;
use similar_products::infrastructure::upstream::{HttpProductUpstream, ProductUpstream};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpProductUpstream {
    HttpProductUpstream::new(&server.uri(), 500, 300).unwrap()
}

fn ids(raw: &[&str]) -> Vec<ProductId> {
    raw.iter().copied().map(ProductId::from).collect()
}

#[tokio::test]
async fn lists_similar_ids_in_upstream_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/1/similarids"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[\"3\",\"2\",\"4\"]"))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client(&server).list_similar_ids(&"1".into()).await.unwrap();

    assert_eq!(listing, ids(&["3", "2", "4"]));
}

#[tokio::test]
async fn empty_and_null_listings_are_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/1/similarids"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/2/similarids"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let upstream = client(&server);

    assert!(upstream.list_similar_ids(&"1".into()).await.unwrap().is_empty());
    assert!(upstream.list_similar_ids(&"2".into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn fetches_product_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"2","name":"Dress","price":19.99,"availability":true}"#,
        ))
        .mount(&server)
        .await;

    let details = client(&server).fetch_details(&"2".into()).await.unwrap();

    assert_eq!(details.product_id().as_str(), "2");
    assert_eq!(details.name(), "Dress");
    assert_eq!(details.price(), Decimal::new(1999, 2));
    assert!(details.is_available());
}

#[tokio::test]
async fn identifier_is_sent_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/a%2Fb/similarids"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let listing = client(&server).list_similar_ids(&"a/b".into()).await.unwrap();

    assert!(listing.is_empty());
}

#[tokio::test]
async fn not_found_status_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let upstream = client(&server);

    assert_eq!(
        upstream.list_similar_ids(&"9".into()).await.unwrap_err(),
        ProductError::not_found("9")
    );
    assert_eq!(
        upstream.fetch_details(&"9".into()).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let error = client(&server).fetch_details(&"2".into()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UpstreamError);
    assert_eq!(error.status(), Some(503));
}

#[tokio::test]
async fn other_client_errors_are_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let error = client(&server).fetch_details(&"2".into()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn malformed_payloads_are_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/1/similarids"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\":\"a list\"}"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"2","name":"Dress"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"3","name":"Refund","price":-5.0,"availability":true}"#,
        ))
        .mount(&server)
        .await;

    let upstream = client(&server);

    for error in [
        upstream.list_similar_ids(&"1".into()).await.unwrap_err(),
        upstream.fetch_details(&"2".into()).await.unwrap_err(),
        upstream.fetch_details(&"3".into()).await.unwrap_err(),
    ] {
        assert_eq!(error.kind(), ErrorKind::Unknown, "{error}");
    }
}

#[tokio::test]
async fn details_for_another_product_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"7","name":"Scarf","price":9.99,"availability":true}"#,
        ))
        .mount(&server)
        .await;

    let error = client(&server).fetch_details(&"2".into()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Unknown);
    assert_eq!(error.product_id().as_str(), "2");
}

#[tokio::test]
async fn numeric_payload_id_matches_requested_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":2,"name":"Dress","price":19.99,"availability":true}"#,
        ))
        .mount(&server)
        .await;

    let details = client(&server).fetch_details(&"2".into()).await.unwrap();

    assert_eq!(details.product_id().as_str(), "2");
}

#[tokio::test]
async fn slow_response_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let error = client(&server).list_similar_ids(&"1".into()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Timeout);
    assert!(error.is_retryable());
}

#[tokio::test]
async fn refused_connection_is_a_connection_failure() {
    let upstream = HttpProductUpstream::new("http://127.0.0.1:1", 500, 300).unwrap();

    let error = upstream.fetch_details(&"2".into()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::ConnectionFailure);
}
