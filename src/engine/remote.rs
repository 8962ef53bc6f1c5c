use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::api::{ApiClient, auth, graphql};
use crate::config::types::ApiConfig;
use crate::types::{Deployment, DeploymentScope, Project, Service};

use super::interface::{Backend, Engine, EngineHandle, start_runtime};

/// Backend talking to the platform's GraphQL API.
pub struct ApiBackend {
    client: ApiClient,
}

impl ApiBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for ApiBackend {
    async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        graphql::fetch_project(&self.client, project_id).await
    }

    async fn fetch_services(&self, project_id: &str) -> Result<Vec<Service>> {
        graphql::fetch_services(&self.client, project_id).await
    }

    async fn fetch_deployments(&self, scope: &DeploymentScope) -> Result<Vec<Deployment>> {
        graphql::fetch_deployments(&self.client, scope).await
    }

    async fn restart_deployment(&self, id: &str) -> Result<()> {
        graphql::restart_deployment(&self.client, id).await
    }

    async fn redeploy_deployment(&self, id: &str) -> Result<()> {
        graphql::redeploy_deployment(&self.client, id).await
    }

    async fn stop_deployment(&self, id: &str) -> Result<()> {
        graphql::stop_deployment(&self.client, id).await
    }

    async fn create_service(&self, project_id: &str) -> Result<Service> {
        graphql::create_service(&self.client, project_id).await
    }

    async fn delete_service(&self, id: &str) -> Result<()> {
        graphql::delete_service(&self.client, id).await
    }
}

/// The real engine, backed by the platform API.
pub struct ApiEngine {
    config: ApiConfig,
}

impl ApiEngine {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Engine for ApiEngine {
    fn start(self) -> Result<EngineHandle> {
        let token = match auth::resolve_token(self.config.token_env.as_deref()) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!("engine: {e:#}; sending unauthenticated requests");
                None
            }
        };
        let client = ApiClient::new(
            &self.config.endpoint,
            token,
            Duration::from_secs(self.config.timeout_secs),
        )?;
        tracing::debug!("engine: using API at {}", client.endpoint());
        start_runtime("api-engine", Arc::new(ApiBackend::new(client)))
    }
}
