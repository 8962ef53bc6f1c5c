use std::time::Duration;

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deploy_board::api::ApiClient;
use deploy_board::api::client::user_message;
use deploy_board::api::graphql;
use deploy_board::types::{DeploymentScope, DeploymentStatus};

fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
    ApiClient::new(
        &format!("{}/graphql", server.uri()),
        token.map(str::to_owned),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn json_body(raw: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(raw.to_owned(), "application/json")
}

#[tokio::test]
async fn fetch_deployments_sends_scope_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_partial_json(serde_json::json!({
            "variables": { "input": { "projectId": "proj-1", "serviceId": "svc-api" } }
        })))
        .respond_with(json_body(include_str!("fixtures/deployments.json")))
        .expect(1)
        .mount(&server)
        .await;

    let scope = DeploymentScope {
        project_id: "proj-1".to_owned(),
        service_id: Some("svc-api".to_owned()),
    };
    let deployments = graphql::fetch_deployments(&client(&server, Some("secret-token")), &scope)
        .await
        .unwrap();

    assert_eq!(deployments.len(), 2);
    assert_eq!(deployments[0].id, "dep-7f3a");
    assert_eq!(deployments[0].environment.name, "production");
    assert_eq!(deployments[1].status, DeploymentStatus::Unknown);
}

#[tokio::test]
async fn fetch_services_takes_latest_deployment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(json_body(include_str!("fixtures/services.json")))
        .mount(&server)
        .await;

    let services = graphql::fetch_services(&client(&server, None), "proj-1")
        .await
        .unwrap();

    assert_eq!(services.len(), 2);
    let latest = services[0].latest_deployment.as_ref().unwrap();
    assert_eq!(latest.status, DeploymentStatus::Crashed);
    assert_eq!(latest.static_url.as_deref(), Some("api-production.example.app"));
    assert!(services[1].latest_deployment.is_none());
}

#[tokio::test]
async fn graphql_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(json_body(include_str!("fixtures/graphql_error.json")))
        .mount(&server)
        .await;

    let err = graphql::restart_deployment(&client(&server, None), "dep-1")
        .await
        .unwrap_err();
    assert_eq!(user_message(&err), "quota exceeded");
}

#[tokio::test]
async fn graphql_error_wins_over_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_raw(include_str!("fixtures/graphql_error.json"), "application/json"),
        )
        .mount(&server)
        .await;

    let err = graphql::stop_deployment(&client(&server, None), "dep-1")
        .await
        .unwrap_err();
    assert_eq!(user_message(&err), "quota exceeded");
}

#[tokio::test]
async fn http_failure_without_body_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = graphql::delete_service(&client(&server, None), "svc-1")
        .await
        .unwrap_err();
    let message = user_message(&err);
    assert!(message.starts_with("deleting service: "), "got: {message}");
    assert!(message.contains("HTTP 502"), "got: {message}");
}

#[tokio::test]
async fn missing_data_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(json_body(r#"{ "data": null }"#))
        .mount(&server)
        .await;

    let err = graphql::fetch_project(&client(&server, None), "proj-1")
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("GraphQL response has no data"));
}
