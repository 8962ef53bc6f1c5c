use std::future::Future;

use deploy_board::api::client::user_message;
use deploy_board::dispatch::ActionKind;
use deploy_board::engine::{Backend, Engine, EngineHandle, StubBackend, StubEngine};
use deploy_board::types::{Deployment, DeploymentScope, DeploymentStatus, Project, Service};

fn load_fixture_deployments() -> Vec<Deployment> {
    let json: serde_json::Value =
        serde_json::from_str(include_str!("fixtures/deployments.json")).expect("valid fixture");
    json["data"]["deployments"]["edges"]
        .as_array()
        .expect("edges array")
        .iter()
        .map(|edge| serde_json::from_value(edge["node"].clone()).expect("valid deployment"))
        .collect()
}

fn fixture_services() -> Vec<Service> {
    ["api", "worker"]
        .iter()
        .map(|name| Service {
            id: format!("svc-{name}"),
            name: (*name).to_owned(),
            icon: None,
            latest_deployment: None,
        })
        .collect()
}

fn fixture_backend() -> StubBackend {
    StubBackend::new(
        Project {
            id: "proj-1".to_owned(),
            name: "Fixture project".to_owned(),
        },
        fixture_services(),
        load_fixture_deployments(),
    )
}

fn start(backend: StubBackend) -> EngineHandle {
    StubEngine { backend }.start().expect("stub engine starts")
}

/// Run `fut` on the engine thread and wait for it from the test thread.
fn run<F>(engine: &EngineHandle, fut: F) -> F::Output
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    smol::block_on(engine.spawn(fut)).expect("engine task completes")
}

fn scope(service_id: Option<&str>) -> DeploymentScope {
    DeploymentScope {
        project_id: "proj-1".to_owned(),
        service_id: service_id.map(str::to_owned),
    }
}

#[test]
fn fixture_parses_wire_shape() {
    let deployments = load_fixture_deployments();
    assert_eq!(deployments.len(), 2);
    assert_eq!(deployments[0].status, DeploymentStatus::Success);
    assert_eq!(deployments[0].service.name, "api");
    assert_eq!(
        deployments[0].browser_url().as_deref(),
        Some("https://api-production.example.app")
    );
    assert_eq!(deployments[1].status, DeploymentStatus::Unknown);
    assert!(deployments[1].deployment_stopped);
    assert!(deployments[1].browser_url().is_none());
}

#[test]
fn stub_engine_fetches_deployments_by_scope() {
    let engine = start(fixture_backend());
    let backend = engine.backend();

    let all = run(&engine, {
        let backend = backend.clone();
        async move { backend.fetch_deployments(&scope(None)).await }
    })
    .unwrap();
    assert_eq!(all.len(), 2);

    let api_only = run(&engine, async move {
        backend.fetch_deployments(&scope(Some("svc-api"))).await
    })
    .unwrap();
    let ids: Vec<_> = api_only.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["dep-7f3a"]);
}

#[test]
fn stub_engine_unknown_project_is_an_error() {
    let engine = start(fixture_backend());
    let backend = engine.backend();
    let result = run(&engine, async move { backend.fetch_project("other").await });
    assert!(result.is_err());
}

#[test]
fn redeploy_inserts_a_building_deployment() {
    let engine = start(fixture_backend());
    let backend: std::sync::Arc<dyn Backend> = engine.backend();

    let listed = run(&engine, async move {
        backend.redeploy_deployment("dep-7f3a").await?;
        backend.fetch_deployments(&scope(Some("svc-api"))).await
    })
    .unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].status, DeploymentStatus::Building);
    assert_ne!(listed[0].id, "dep-7f3a");
    assert_eq!(listed[1].id, "dep-7f3a");
}

#[test]
fn stop_marks_deployment_stopped() {
    let engine = start(fixture_backend());
    let backend = engine.backend();

    let listed = run(&engine, async move {
        backend.stop_deployment("dep-7f3a").await?;
        backend.fetch_deployments(&scope(Some("svc-api"))).await
    })
    .unwrap();

    assert!(listed[0].deployment_stopped);
    assert_eq!(listed[0].status, DeploymentStatus::Removed);
}

#[test]
fn unknown_deployment_reports_server_style_message() {
    let engine = start(fixture_backend());
    let backend = engine.backend();
    let err = run(&engine, async move { backend.restart_deployment("dep-missing").await }).unwrap_err();
    assert_eq!(user_message(&err), "Deployment dep-missing not found");
}

#[test]
fn create_then_delete_service() {
    let engine = start(fixture_backend());
    let backend = engine.backend();

    let (created, after_create, after_delete) = run(&engine, async move {
        let created = backend.create_service("proj-1").await?;
        let after_create = backend.fetch_services("proj-1").await?;
        backend.delete_service(&created.id).await?;
        let after_delete = backend.fetch_services("proj-1").await?;
        anyhow::Ok((created, after_create, after_delete))
    })
    .unwrap();

    assert_eq!(after_create.len(), 3);
    assert!(after_create.iter().any(|s| s.id == created.id));
    assert_eq!(after_delete.len(), 2);
    assert!(after_delete.iter().all(|s| s.id != created.id));
}

#[test]
fn deleting_a_service_drops_its_deployments() {
    let engine = start(fixture_backend());
    let backend = engine.backend();

    let remaining = run(&engine, async move {
        backend.delete_service("svc-worker").await?;
        backend.fetch_deployments(&scope(None)).await
    })
    .unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].service.id, "svc-api");
}

#[test]
fn fail_with_surfaces_the_configured_message() {
    let engine = start(fixture_backend().fail_with(ActionKind::Restart, "quota exceeded"));
    let backend = engine.backend();

    let err = run(&engine, async move { backend.restart_deployment("dep-7f3a").await }).unwrap_err();
    assert_eq!(user_message(&err), "quota exceeded");
}

#[test]
fn demo_engine_serves_demo_project() {
    let engine = StubEngine::demo().start().unwrap();
    let backend = engine.backend();
    let project = run(&engine, async move {
        backend.fetch_project(StubEngine::DEMO_PROJECT).await
    })
    .unwrap();
    assert_eq!(project.name, "Demo project");
}
