//! Workflow start and media download against a local mock server.

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wv_domain::config::{AuthConfig, MediaConfig, RouterConfig};
use wv_domain::error::Error;
use wv_platform::{GraphMediaFetcher, HttpWorkflowStarter, MediaFetcher, WorkflowStarter};

fn token() -> AuthConfig {
    AuthConfig {
        key: Some("tok".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn start_execution_posts_amz_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", "AWSStepFunctions.StartExecution"))
        .and(body_partial_json(serde_json::json!({
            "stateMachineArn": "arn:aws:states:eu-west-1:1:stateMachine:turn:live",
            "name": "acme-srl_0000"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "executionArn": "arn:exec"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let starter = HttpWorkflowStarter::new(&RouterConfig {
        endpoint: server.uri(),
        ..Default::default()
    })
    .unwrap();
    starter
        .start(
            "arn:aws:states:eu-west-1:1:stateMachine:turn:live",
            "acme-srl_0000",
            &serde_json::json!({"text": {"body": "ciao"}}),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn start_execution_rejection_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("ExecutionAlreadyExists"))
        .mount(&server)
        .await;

    let starter = HttpWorkflowStarter::new(&RouterConfig {
        endpoint: server.uri(),
        ..Default::default()
    })
    .unwrap();
    let err = starter
        .start("arn:sm", "dup", &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
}

#[tokio::test]
async fn media_fetch_follows_location_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/MEDIA1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": format!("{}/download/MEDIA1", server.uri()),
            "mime_type": "audio/ogg"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/MEDIA1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"OggS-audio".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = GraphMediaFetcher::new(&MediaConfig {
        fetch_base_url: server.uri(),
        auth: token(),
        ..Default::default()
    })
    .unwrap();
    let bytes = fetcher.fetch("MEDIA1").await.unwrap();
    assert_eq!(bytes, b"OggS-audio");
}

#[tokio::test]
async fn media_fetch_surfaces_missing_media() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = GraphMediaFetcher::new(&MediaConfig {
        fetch_base_url: server.uri(),
        ..Default::default()
    })
    .unwrap();
    assert!(fetcher.fetch("GONE").await.is_err());
}
