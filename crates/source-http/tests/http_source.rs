//! HTTP behavior of the reqwest source against a mock server.

use std::time::Duration;

use futures::TryStreamExt;
use httpmock::prelude::*;
use manifest_mirror_source_http::{HttpSettings, ReqwestSourceClient};
use manifest_mirror_storage::{
    fetch_manifest, ByteStream, Manifest, SourceClient, StorageError, SyncError,
};
use serde_json::json;

fn client() -> ReqwestSourceClient {
    ReqwestSourceClient::new(HttpSettings::default().with_user_agent("manifest-mirror/test"))
        .unwrap()
}

async fn read_all(stream: ByteStream) -> Result<Vec<u8>, StorageError> {
    stream
        .try_fold(Vec::new(), |mut body, chunk| async move {
            body.extend_from_slice(&chunk);
            Ok(body)
        })
        .await
}

async fn expect_err(client: &ReqwestSourceClient, url: &str, timeout: Option<Duration>) -> StorageError {
    match client.get(url, timeout).await {
        Err(err) => err,
        Ok(stream) => match read_all(stream).await {
            Err(err) => err,
            Ok(body) => panic!("expected an error, got {} bytes", body.len()),
        },
    }
}

#[tokio::test]
async fn test_get_streams_body() {
    let server = MockServer::start_async().await;
    let body: String = "x".repeat(200_000);
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/lib/a/f1.js")
            .header("user-agent", "manifest-mirror/test");
        then.status(200).body(body.clone());
    });

    let stream = client().get(&server.url("/lib/a/f1.js"), None).await.unwrap();
    let received: Vec<u8> = read_all(stream).await.unwrap();

    mock.assert();
    assert_eq!(received.len(), 200_000);
    assert_eq!(received, body.as_bytes());
}

#[tokio::test]
async fn test_server_error_is_retryable_status() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/broken.js");
        then.status(503);
    });

    let err = expect_err(&client(), &server.url("/broken.js"), None).await;

    mock.assert();
    assert!(matches!(err, StorageError::HttpStatus { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_not_found_is_not_retryable() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/missing.js");
        then.status(404);
    });

    let err = expect_err(&client(), &server.url("/missing.js"), None).await;

    assert!(matches!(err, StorageError::HttpStatus { status: 404, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/slow.js");
        then.status(200)
            .body("late")
            .delay(Duration::from_millis(1500));
    });

    let err = expect_err(
        &client(),
        &server.url("/slow.js"),
        Some(Duration::from_millis(100)),
    )
    .await;

    assert!(matches!(err, StorageError::Timeout { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_fetch_manifest_over_http() {
    let server = MockServer::start_async().await;
    let base_url: String = server.url("/");
    let urls: Vec<String> = vec![server.url("/a/f1.js"), server.url("/b/f2.js")];
    let mock = server.mock(|when, then| {
        when.method(GET).path("/manifest.json");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!(urls));
    });

    let manifest: Manifest = fetch_manifest(
        &client(),
        &server.url("/manifest.json"),
        &base_url,
        Duration::from_secs(5),
    )
    .await
    .unwrap();

    mock.assert();
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.file_keys().get("f1.js").unwrap(), "a/f1.js");
    assert_eq!(manifest.file_keys().get("f2.js").unwrap(), "b/f2.js");
}

#[tokio::test]
async fn test_fetch_manifest_server_error() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/manifest.json");
        then.status(500);
    });

    let result = fetch_manifest(
        &client(),
        &server.url("/manifest.json"),
        &server.url("/"),
        Duration::from_secs(5),
    )
    .await;

    match result {
        Err(SyncError::ManifestUnavailable { message, .. }) => assert!(message.contains("500")),
        other => panic!("expected ManifestUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_manifest_timeout() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/manifest.json");
        then.status(200).body("[]").delay(Duration::from_millis(1500));
    });

    let result = fetch_manifest(
        &client(),
        &server.url("/manifest.json"),
        &server.url("/"),
        Duration::from_millis(100),
    )
    .await;

    assert!(matches!(result, Err(SyncError::ManifestUnavailable { .. })));
}
