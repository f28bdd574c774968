//! `MetadataClient` tests against a mocked GraphQL endpoint (spec §4.3, §7).

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mentorup_metadata::{MetadataClient, MetadataConfig, MetadataError};

fn client(server: &MockServer) -> MetadataClient {
    MetadataClient::new(MetadataConfig {
        endpoint: format!("{}/graphql", server.uri()),
        api_secret: "test-secret".into(),
        timeout: Duration::from_secs(5),
    })
    .expect("client construction does not dial out")
}

#[tokio::test]
async fn fetch_task_returns_none_when_no_task_document_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "task": null }
        })))
        .mount(&server)
        .await;

    let task = client(&server).fetch_task("mentor-1", "question-1").await.unwrap();
    assert!(task.is_none());
}

#[tokio::test]
async fn is_upload_in_progress_is_true_iff_task_document_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "task": {
                    "mentorId": "mentor-1",
                    "questionId": "question-1",
                    "taskList": [
                        {"taskName": "transcoding-web", "taskId": "t1", "status": "QUEUED"}
                    ],
                    "transcript": "",
                    "media": []
                }
            }
        })))
        .mount(&server)
        .await;

    assert!(client(&server).is_upload_in_progress("mentor-1", "question-1").await.unwrap());
}

#[tokio::test]
async fn non_2xx_status_surfaces_as_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_task("mentor-1", "question-1")
        .await
        .unwrap_err();
    match err {
        MetadataError::Http { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn graphql_errors_field_surfaces_as_graphql_error_even_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "question not found"}]
        })))
        .mount(&server)
        .await;

    let err = client(&server).fetch_question_name("missing-question").await.unwrap_err();
    match err {
        MetadataError::GraphQl(message) => assert!(message.contains("question not found")),
        other => panic!("expected GraphQl error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_question_name_recognizes_idle_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "question": { "name": "_IDLE_" } }
        })))
        .mount(&server)
        .await;

    let name = client(&server).fetch_question_name("question-1").await.unwrap();
    assert_eq!(name, "_IDLE_");
}
