use std::sync::Arc;

use async_trait::async_trait;

use crate::api::client::user_message;
use crate::dispatch::{ActionError, ActionKind, RemoteAction};
use crate::store::{FetchError, ListFetcher};
use crate::types::{Deployment, DeploymentScope, Service};

use super::interface::Backend;

// ---------------------------------------------------------------------------
// List fetchers
// ---------------------------------------------------------------------------

pub struct DeploymentsFetcher {
    backend: Arc<dyn Backend>,
}

impl DeploymentsFetcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ListFetcher for DeploymentsFetcher {
    type Scope = DeploymentScope;
    type Item = Deployment;

    async fn fetch(&self, scope: &DeploymentScope) -> Result<Vec<Deployment>, FetchError> {
        self.backend
            .fetch_deployments(scope)
            .await
            .map_err(|e| FetchError::new(user_message(&e)))
    }
}

/// Fetches the services of the project whose id is the scope.
pub struct ServicesFetcher {
    backend: Arc<dyn Backend>,
}

impl ServicesFetcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ListFetcher for ServicesFetcher {
    type Scope = String;
    type Item = Service;

    async fn fetch(&self, project_id: &String) -> Result<Vec<Service>, FetchError> {
        self.backend
            .fetch_services(project_id)
            .await
            .map_err(|e| FetchError::new(user_message(&e)))
    }
}

// ---------------------------------------------------------------------------
// Remote actions
// ---------------------------------------------------------------------------

struct BackendAction {
    backend: Arc<dyn Backend>,
    kind: ActionKind,
}

#[async_trait]
impl RemoteAction for BackendAction {
    async fn invoke(&self, entity_id: &str) -> Result<(), ActionError> {
        let result = match self.kind {
            ActionKind::Restart => self.backend.restart_deployment(entity_id).await,
            ActionKind::Redeploy => self.backend.redeploy_deployment(entity_id).await,
            ActionKind::Stop => self.backend.stop_deployment(entity_id).await,
            ActionKind::Create => self.backend.create_service(entity_id).await.map(|_| ()),
            ActionKind::Delete => self.backend.delete_service(entity_id).await,
        };
        result.map_err(|e| ActionError::new(user_message(&e)))
    }
}

/// The backend call behind `kind`. For `Create` the entity id is the
/// project id.
pub fn action_for(backend: &Arc<dyn Backend>, kind: ActionKind) -> Arc<dyn RemoteAction> {
    Arc::new(BackendAction {
        backend: Arc::clone(backend),
        kind,
    })
}
