//! Integration tests for cursor pagination.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use outpost::client::paginate::{Extractor, PageQuery};
use outpost::client::{build_http_client, HttpDeliveryClient, RetryPolicy};

fn client() -> HttpDeliveryClient {
    HttpDeliveryClient::new(build_http_client())
        .with_retry(RetryPolicy {
            max_attempts: 1,
            backoff_factor: 0.0,
            status_forcelist: vec![],
        })
        .with_timeout(Duration::from_secs(2))
}

fn items_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/items", server.uri())).unwrap()
}

#[tokio::test]
async fn walks_cursor_chain_to_the_end() {
    let server = MockServer::start().await;

    // More specific matchers first: wiremock picks the first mock that matches
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page_token", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [3, 4],
            "next": "t3"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page_token", "t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [5],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [1, 2],
            "next": "t2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    let mut pages = client.paginate(PageQuery::new(items_url(&server)));

    assert_eq!(pages.next_page().await, Some(vec![json!(1), json!(2)]));
    assert_eq!(pages.next_page().await, Some(vec![json!(3), json!(4)]));
    assert_eq!(pages.next_page().await, Some(vec![json!(5)]));
    assert_eq!(pages.next_page().await, None);
    assert_eq!(pages.next_page().await, None);
}

#[tokio::test]
async fn empty_string_cursor_ends_the_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": ["only"],
            "next": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    let mut pages = client.paginate(PageQuery::new(items_url(&server)));

    assert_eq!(pages.next_page().await, Some(vec![json!("only")]));
    assert_eq!(pages.next_page().await, None);
}

#[tokio::test]
async fn custom_paths_and_params_are_honored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("limit", "2"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"entries": ["x"]},
            "meta": {"next_cursor": null}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"entries": ["w"]},
            "meta": {"next_cursor": "abc"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = PageQuery::new(items_url(&server))
        .with_params([("limit".to_string(), "2".to_string())].into())
        .with_items(Extractor::Path("data.entries".into()))
        .with_next_cursor(Extractor::Path("meta.next_cursor".into()))
        .with_cursor_param("cursor");

    let client = client();
    let mut pages = client.paginate(query);

    assert_eq!(pages.next_page().await, Some(vec![json!("w")]));
    assert_eq!(pages.next_page().await, Some(vec![json!("x")]));
    assert_eq!(pages.next_page().await, None);
}

#[tokio::test]
async fn function_extractor_handles_irregular_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch_a": [1],
            "batch_b": [2]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = PageQuery::new(items_url(&server)).with_items(Extractor::Func(Arc::new(
        |page: &Value| {
            let a = page.get("batch_a")?.as_array()?;
            let b = page.get("batch_b")?.as_array()?;
            Some(Value::Array(a.iter().chain(b).cloned().collect()))
        },
    )));

    let client = client();
    let mut pages = client.paginate(query);

    assert_eq!(pages.next_page().await, Some(vec![json!(1), json!(2)]));
    assert_eq!(pages.next_page().await, None);
}

#[tokio::test]
async fn request_failure_ends_the_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client();
    let mut pages = client.paginate(PageQuery::new(items_url(&server)));

    assert_eq!(pages.next_page().await, None);
    assert_eq!(pages.next_page().await, None);
}

#[tokio::test]
async fn missing_items_field_yields_an_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"next": null})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client();
    let mut pages = client.paginate(PageQuery::new(items_url(&server)));

    assert_eq!(pages.next_page().await, Some(Vec::new()));
    assert_eq!(pages.next_page().await, None);
}
