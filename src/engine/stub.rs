use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use crate::dispatch::ActionKind;
use crate::types::{
    Deployment, DeploymentScope, DeploymentStatus, EnvironmentRef, LatestDeployment, Project,
    Service, ServiceRef,
};

use super::interface::{Backend, Engine, EngineHandle, start_runtime};

#[derive(Default)]
struct StubData {
    project: Option<Project>,
    services: Vec<Service>,
    deployments: Vec<Deployment>,
    next_id: u64,
}

/// In-memory backend serving fixture data without any network calls.
///
/// Mutations change the fixture state so a refresh shows their effect.
/// `fail_with` makes every invocation of one action kind fail with a given
/// server message.
pub struct StubBackend {
    data: Mutex<StubData>,
    failures: HashMap<ActionKind, String>,
    latency: Duration,
}

impl StubBackend {
    pub fn new(project: Project, services: Vec<Service>, deployments: Vec<Deployment>) -> Self {
        Self {
            data: Mutex::new(StubData {
                project: Some(project),
                services,
                deployments,
                next_id: 0,
            }),
            failures: HashMap::new(),
            latency: Duration::ZERO,
        }
    }

    pub fn fail_with(mut self, kind: ActionKind, message: impl Into<String>) -> Self {
        self.failures.insert(kind, message.into());
        self
    }

    /// Delay applied to every call, to make progress toasts visible in demos.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn lock(&self) -> MutexGuard<'_, StubData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate(&self, kind: Option<ActionKind>) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(kind) = kind
            && let Some(message) = self.failures.get(&kind)
        {
            bail!(crate::api::GraphqlError {
                message: message.clone(),
            });
        }
        Ok(())
    }

    fn with_deployment<R>(&self, id: &str, f: impl FnOnce(&mut StubData, usize) -> R) -> Result<R> {
        let mut data = self.lock();
        let idx = data
            .deployments
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| anyhow!(crate::api::GraphqlError {
                message: format!("Deployment {id} not found"),
            }))?;
        Ok(f(&mut data, idx))
    }
}

fn sync_latest(data: &mut StubData) {
    let StubData {
        services,
        deployments,
        ..
    } = data;
    for service in services.iter_mut() {
        service.latest_deployment = deployments
            .iter()
            .find(|d| d.service.id == service.id)
            .map(|d| LatestDeployment {
                status: d.status,
                static_url: d.static_url.clone(),
            });
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        self.simulate(None).await?;
        self.lock()
            .project
            .clone()
            .filter(|p| p.id == project_id)
            .ok_or_else(|| anyhow!("project {project_id} not found"))
    }

    async fn fetch_services(&self, _project_id: &str) -> Result<Vec<Service>> {
        self.simulate(None).await?;
        Ok(self.lock().services.clone())
    }

    async fn fetch_deployments(&self, scope: &DeploymentScope) -> Result<Vec<Deployment>> {
        self.simulate(None).await?;
        Ok(self
            .lock()
            .deployments
            .iter()
            .filter(|d| d.project_id == scope.project_id)
            .filter(|d| scope.service_id.as_ref().is_none_or(|s| *s == d.service.id))
            .cloned()
            .collect())
    }

    async fn restart_deployment(&self, id: &str) -> Result<()> {
        self.simulate(Some(ActionKind::Restart)).await?;
        self.with_deployment(id, |data, idx| {
            let d = &mut data.deployments[idx];
            d.status = DeploymentStatus::Success;
            d.deployment_stopped = false;
            d.updated_at = Utc::now();
            d.status_updated_at = Some(d.updated_at);
            sync_latest(data);
        })
    }

    async fn redeploy_deployment(&self, id: &str) -> Result<()> {
        self.simulate(Some(ActionKind::Redeploy)).await?;
        self.with_deployment(id, |data, idx| {
            data.next_id += 1;
            let mut fresh = data.deployments[idx].clone();
            fresh.id = format!("{}-r{}", fresh.id, data.next_id);
            fresh.status = DeploymentStatus::Building;
            fresh.deployment_stopped = false;
            fresh.created_at = Utc::now();
            fresh.updated_at = fresh.created_at;
            fresh.status_updated_at = Some(fresh.created_at);
            data.deployments.insert(0, fresh);
            sync_latest(data);
        })
    }

    async fn stop_deployment(&self, id: &str) -> Result<()> {
        self.simulate(Some(ActionKind::Stop)).await?;
        self.with_deployment(id, |data, idx| {
            let d = &mut data.deployments[idx];
            d.status = DeploymentStatus::Removed;
            d.deployment_stopped = true;
            d.updated_at = Utc::now();
            sync_latest(data);
        })
    }

    async fn create_service(&self, project_id: &str) -> Result<Service> {
        self.simulate(Some(ActionKind::Create)).await?;
        let mut data = self.lock();
        if data.project.as_ref().is_none_or(|p| p.id != project_id) {
            bail!(crate::api::GraphqlError {
                message: format!("Project {project_id} not found"),
            });
        }
        data.next_id += 1;
        let service = Service {
            id: format!("svc-new-{}", data.next_id),
            name: format!("service-{}", data.next_id),
            icon: None,
            latest_deployment: None,
        };
        data.services.push(service.clone());
        Ok(service)
    }

    async fn delete_service(&self, id: &str) -> Result<()> {
        self.simulate(Some(ActionKind::Delete)).await?;
        let mut data = self.lock();
        let before = data.services.len();
        data.services.retain(|s| s.id != id);
        if data.services.len() == before {
            bail!(crate::api::GraphqlError {
                message: format!("Service {id} not found"),
            });
        }
        data.deployments.retain(|d| d.service.id != id);
        Ok(())
    }
}

/// A stub engine that serves fixture data without any network calls.
///
/// Useful for integration tests and UI demos that must not require an API
/// token.
pub struct StubEngine {
    pub backend: StubBackend,
}

impl Engine for StubEngine {
    fn start(self) -> Result<EngineHandle> {
        start_runtime("stub-engine", Arc::new(self.backend))
    }
}

impl StubEngine {
    /// Project id used by [`StubEngine::demo`].
    pub const DEMO_PROJECT: &'static str = "demo-project";

    /// A small project with three services and a mix of deployment states.
    pub fn demo() -> Self {
        let now = Utc::now();
        let project = Project {
            id: Self::DEMO_PROJECT.to_owned(),
            name: "Demo project".to_owned(),
        };
        let services = vec![
            demo_service("svc-api", "api"),
            demo_service("svc-web", "web"),
            demo_service("svc-worker", "worker"),
        ];
        let deployments = vec![
            demo_deployment("dep-7f3a", &services[0], DeploymentStatus::Success, now - ChronoDuration::minutes(12)),
            demo_deployment("dep-19c2", &services[1], DeploymentStatus::Building, now - ChronoDuration::minutes(3)),
            demo_deployment("dep-a810", &services[2], DeploymentStatus::Crashed, now - ChronoDuration::hours(5)),
            demo_deployment("dep-55e1", &services[0], DeploymentStatus::Removed, now - ChronoDuration::days(3)),
            demo_deployment("dep-0b77", &services[1], DeploymentStatus::Success, now - ChronoDuration::days(40)),
        ];
        let mut data = StubData {
            project: Some(project.clone()),
            services,
            deployments,
            next_id: 0,
        };
        sync_latest(&mut data);
        Self {
            backend: StubBackend::new(project, data.services, data.deployments)
                .with_latency(Duration::from_millis(800)),
        }
    }
}

fn demo_service(id: &str, name: &str) -> Service {
    Service {
        id: id.to_owned(),
        name: name.to_owned(),
        icon: None,
        latest_deployment: None,
    }
}

fn demo_deployment(
    id: &str,
    service: &Service,
    status: DeploymentStatus,
    created_at: chrono::DateTime<Utc>,
) -> Deployment {
    Deployment {
        id: id.to_owned(),
        status,
        created_at,
        updated_at: created_at,
        status_updated_at: Some(created_at),
        project_id: StubEngine::DEMO_PROJECT.to_owned(),
        service_id: service.id.clone(),
        environment_id: "env-production".to_owned(),
        url: None,
        static_url: Some(format!("{}-production.example.app", service.name)),
        can_rollback: true,
        can_redeploy: true,
        suggest_add_service_domain: false,
        deployment_stopped: status == DeploymentStatus::Removed,
        environment: EnvironmentRef {
            name: "production".to_owned(),
        },
        service: ServiceRef {
            id: service.id.clone(),
            name: service.name.clone(),
        },
        creator: None,
    }
}
