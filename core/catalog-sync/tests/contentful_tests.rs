use catalog_sync::{ContentSource, ContentfulClient, ContentfulConfig, SyncError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ContentfulClient {
    ContentfulClient::new(ContentfulConfig {
        base_url: server.uri(),
        space_id: "space1".into(),
        access_token: "cda-token".into(),
        content_type: "product".into(),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

fn entry_json(id: &str) -> serde_json::Value {
    json!({
        "sys": {
            "id": id,
            "type": "Entry",
            "createdAt": "2024-01-10T08:00:00.000Z",
            "updatedAt": "2024-01-11T09:30:00.000Z"
        },
        "fields": {
            "sku": { "en-US": format!("SKU-{id}") },
            "name": { "en-US": "Phone" },
            "brand": { "en-US": "Apple" },
            "model": { "en-US": "X" },
            "price": { "en-US": 999.5 }
        }
    })
}

// ── Config ───────────────────────────────────────────────────────

#[test]
fn config_defaults() {
    let cfg = ContentfulConfig::default();
    assert_eq!(cfg.base_url, "https://cdn.contentful.com");
    assert_eq!(cfg.environment, "master");
    assert_eq!(cfg.locale, "en-US");
    assert_eq!(cfg.timeout_secs, 30);
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = ContentfulClient::new(ContentfulConfig {
        base_url: "not a url".into(),
        ..Default::default()
    });
    assert!(matches!(result, Err(SyncError::Protocol(_))));
}

// ── Sync API ─────────────────────────────────────────────────────

#[tokio::test]
async fn initial_sync_sends_expected_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space1/sync"))
        .and(query_param("access_token", "cda-token"))
        .and(query_param("initial", "true"))
        .and(query_param("content_type", "product"))
        .and(query_param("type", "Entry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sys": { "type": "Array" },
            "items": [entry_json("A"), entry_json("B")],
            "nextPageUrl": format!("{}/spaces/space1/sync?sync_token=p2", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server).initial_sync().await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].sys.id, "A");
    assert!(page.next_page_url.unwrap().ends_with("sync_token=p2"));
    assert!(page.next_sync_url.is_none());
}

#[tokio::test]
async fn continue_sync_uses_token_as_locator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space1/sync"))
        .and(query_param("sync_token", "p2"))
        .and(query_param("access_token", "cda-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "nextSyncUrl": "https://cdn.contentful.com/spaces/space1/sync?sync_token=s1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = format!("{}/spaces/space1/sync?sync_token=p2", server.uri());
    let page = client_for(&server).continue_sync(&token).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(
        page.next_sync_url.as_deref(),
        Some("https://cdn.contentful.com/spaces/space1/sync?sync_token=s1")
    );
}

#[tokio::test]
async fn relative_token_resolves_against_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space1/sync"))
        .and(query_param("sync_token", "rel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .continue_sync("/spaces/space1/sync?sync_token=rel")
        .await
        .unwrap();
}

#[tokio::test]
async fn deleted_entries_deserialize_without_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space1/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "sys": { "id": "gone", "type": "DeletedEntry" } }],
            "nextSyncUrl": "s2"
        })))
        .mount(&server)
        .await;

    let token = format!("{}/spaces/space1/sync?sync_token=s1", server.uri());
    let page = client_for(&server).continue_sync(&token).await.unwrap();
    assert!(page.items[0].is_deleted());
    assert!(page.items[0].fields.is_empty());
}

// ── Errors ───────────────────────────────────────────────────────

#[tokio::test]
async fn non_success_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let err = client_for(&server).initial_sync().await.unwrap_err();
    match err {
        SyncError::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).initial_sync().await.unwrap_err();
    assert!(matches!(err, SyncError::Protocol(_)));
}

#[tokio::test]
async fn unreachable_source_is_network_error() {
    let client = ContentfulClient::new(ContentfulConfig {
        base_url: "http://127.0.0.1:1".into(),
        space_id: "space1".into(),
        timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();
    let err = client.initial_sync().await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_) | SyncError::Timeout));
}

// ── Entries API ──────────────────────────────────────────────────

#[tokio::test]
async fn list_entries_hits_environment_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space1/environments/master/entries"))
        .and(query_param("content_type", "product"))
        .and(query_param("access_token", "cda-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1, "skip": 0, "limit": 100,
            "items": [entry_json("A")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client_for(&server).list_entries().await.unwrap();
    assert_eq!(entries.total, 1);
    assert_eq!(entries.items[0].sys.id, "A");
}
