use pretty_assertions::assert_eq;
use serde_json::json;
use tracker_core::{Classification, Recheck, StatusMarkers, TaskKind};
use tracker_engine::{query_once, ClientError, ClientSettings, QueryOutcome, ReqwestStatusClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestStatusClient {
    ReqwestStatusClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn batch_ids_resolve_without_touching_task_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/batch/B7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "处理中",
            "sub_tasks": { "a": { "status": "已完成" }, "b": { "status": "队列中" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/task/B7"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = query_once(&client_for(&server), "B7", &StatusMarkers::default()).await;
    assert_eq!(
        outcome,
        QueryOutcome::Found {
            kind: TaskKind::Batch,
            classification: Classification::Processing {
                text: "Progress: 1/2".to_string(),
                recheck: Recheck::Interval,
            },
        }
    );
}

#[tokio::test]
async fn single_task_found_after_batch_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/task/T8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "processing",
            "progress_percentage": 12.5
        })))
        .mount(&server)
        .await;

    let outcome = query_once(&client_for(&server), "T8", &StatusMarkers::default()).await;
    assert_eq!(
        outcome,
        QueryOutcome::Found {
            kind: TaskKind::Single,
            classification: Classification::Processing {
                text: "12.5%".to_string(),
                recheck: Recheck::Interval,
            },
        }
    );
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let server = MockServer::start().await;
    let outcome = query_once(&client_for(&server), "nope", &StatusMarkers::default()).await;
    assert_eq!(outcome, QueryOutcome::NotFound);
}

#[tokio::test]
async fn transport_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/batch/X"))
        .respond_with(ResponseTemplate::new(200).set_body_string("garbage"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = query_once(&client_for(&server), "X", &StatusMarkers::default()).await;
    assert!(matches!(outcome, QueryOutcome::Failed(ClientError::Decode(_))));
}
