//! Integration tests for cursor-following pagination.

use std::path::PathBuf;
use std::time::Duration;

use page_reply_sync::config::Config;
use page_reply_sync::graph::{GraphClient, GraphError, Paginator};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GraphClient {
    let config = Config::for_testing(&server.uri(), PathBuf::from("unused"));
    GraphClient::new(&config).expect("Failed to build client")
}

/// Mount a feed page for `cursor` (`None` for the first page) linking to `next_cursor`.
async fn mount_feed_page(
    server: &MockServer,
    cursor: Option<&str>,
    next_cursor: Option<&str>,
    ids: &[&str],
) {
    let data: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
    let mut body = json!({"data": data});
    if let Some(next) = next_cursor {
        body["paging"] = json!({
            "cursors": {"after": next},
            "next": format!("{}/v19.0/111/feed?after={next}&access_token=test-token", server.uri())
        });
    }

    let mock = Mock::given(method("GET")).and(path("/v19.0/111/feed"));
    let mock = match cursor {
        Some(cursor) => mock.and(query_param("after", cursor)),
        None => mock.and(query_param_is_missing("after")),
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_follows_next_links_until_exhausted() {
    let server = MockServer::start().await;
    mount_feed_page(&server, None, Some("p2"), &["111_1", "111_2"]).await;
    mount_feed_page(&server, Some("p2"), Some("p3"), &["111_3", "111_4"]).await;
    mount_feed_page(&server, Some("p3"), None, &["111_5"]).await;

    let client = client_for(&server);
    let start = client.feed_url("111").unwrap();
    let collected = Paginator::new(&client, start, Duration::ZERO)
        .collect_all()
        .await;

    assert!(collected.error.is_none());
    assert_eq!(collected.pages, 3);
    let ids: Vec<&str> = collected
        .items
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["111_1", "111_2", "111_3", "111_4", "111_5"]);
}

#[tokio::test]
async fn test_next_page_is_lazy_and_ends_with_none() {
    let server = MockServer::start().await;
    mount_feed_page(&server, None, Some("p2"), &["111_1"]).await;
    mount_feed_page(&server, Some("p2"), None, &["111_2"]).await;

    let client = client_for(&server);
    let mut pages = Paginator::new(&client, client.feed_url("111").unwrap(), Duration::ZERO);
    assert_eq!(pages.pages_fetched(), 0);

    let first = pages.next_page().await.unwrap().unwrap();
    assert_eq!(first.data.len(), 1);
    assert_eq!(pages.pages_fetched(), 1);

    let second = pages.next_page().await.unwrap().unwrap();
    assert_eq!(second.data[0]["id"], "111_2");

    assert!(pages.next_page().await.is_none());
    assert!(pages.next_page().await.is_none());
    assert_eq!(pages.pages_fetched(), 2);
}

#[tokio::test]
async fn test_next_link_is_followed_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v19.0/111/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "111_1"}],
            "paging": {"next": format!("{}/opaque/cursor/xyz?token=abc", server.uri())}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/opaque/cursor/xyz"))
        .and(query_param("token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "111_2"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let collected = Paginator::new(&client, client.feed_url("111").unwrap(), Duration::ZERO)
        .collect_all()
        .await;

    assert!(collected.error.is_none());
    assert_eq!(collected.items.len(), 2);
}

#[tokio::test]
async fn test_non_json_page_aborts_walk_keeping_earlier_items() {
    let server = MockServer::start().await;
    mount_feed_page(&server, None, Some("p2"), &["111_1", "111_2"]).await;

    Mock::given(method("GET"))
        .and(path("/v19.0/111/feed"))
        .and(query_param("after", "p2"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let collected = Paginator::new(&client, client.feed_url("111").unwrap(), Duration::ZERO)
        .collect_all()
        .await;

    assert_eq!(collected.items.len(), 2);
    assert_eq!(collected.pages, 1);
    assert!(matches!(
        collected.error,
        Some(GraphError::Unparseable { .. })
    ));
}

#[tokio::test]
async fn test_error_field_stops_walk() {
    let server = MockServer::start().await;
    mount_feed_page(&server, None, Some("p2"), &["111_1"]).await;

    Mock::given(method("GET"))
        .and(path("/v19.0/111/feed"))
        .and(query_param("after", "p2"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 613, "message": "Calls to this api have exceeded the rate limit."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pages = Paginator::new(&client, client.feed_url("111").unwrap(), Duration::ZERO);

    assert!(pages.next_page().await.unwrap().is_ok());
    let err = pages.next_page().await.unwrap().unwrap_err();
    assert_eq!(err.code(), Some(613));
    assert!(pages.next_page().await.is_none());
}

#[tokio::test]
async fn test_transport_error_is_reported() {
    // Nothing listens on port 9 on the test host.
    let config = Config::for_testing("http://127.0.0.1:9", PathBuf::from("unused"));
    let client = GraphClient::new(&config).unwrap();

    let collected = Paginator::new(&client, client.feed_url("111").unwrap(), Duration::ZERO)
        .collect_all()
        .await;

    assert!(collected.items.is_empty());
    assert_eq!(collected.pages, 0);
    assert!(matches!(collected.error, Some(GraphError::Transport(_))));
}

#[tokio::test]
async fn test_transport_error_does_not_expose_token() {
    let mut config = Config::for_testing("http://127.0.0.1:9", PathBuf::from("unused"));
    config.access_token = "EAABSUPERSECRETTOKEN".to_string();
    let client = GraphClient::new(&config).unwrap();

    let collected = Paginator::new(&client, client.feed_url("111").unwrap(), Duration::ZERO)
        .collect_all()
        .await;

    let error = collected.error.expect("walk should fail");
    assert!(!error.to_string().contains("EAABSUPERSECRETTOKEN"));
    assert!(!format!("{error:?}").contains("EAABSUPERSECRETTOKEN"));
    assert!(!format!("{:#}", anyhow::Error::new(error)).contains("EAABSUPERSECRETTOKEN"));
}
