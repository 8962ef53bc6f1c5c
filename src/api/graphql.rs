use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::{Deployment, DeploymentScope, LatestDeployment, Project, Service};

use super::client::ApiClient;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

const DEPLOYMENT_FIELDS: &str = "
  fragment DeploymentFields on Deployment {
    id
    status
    createdAt
    updatedAt
    statusUpdatedAt
    projectId
    serviceId
    environmentId
    url
    staticUrl
    canRollback
    canRedeploy
    suggestAddServiceDomain
    deploymentStopped
    environment { name }
    service { id name }
    creator { id name avatar }
  }
";

const SERVICE_FIELDS: &str = "
  fragment ServiceFields on Service {
    id
    name
    icon
    deployments(first: 1) {
      edges { node { status staticUrl } }
    }
  }
";

const GET_DEPLOYMENTS: &str = "
  query GetDeployments($input: DeploymentListInput!) {
    deployments(input: $input) {
      edges { node { ...DeploymentFields } }
    }
  }
";

const GET_SERVICES: &str = "
  query GetServices($projectId: String!) {
    project(id: $projectId) {
      services {
        edges { node { ...ServiceFields } }
      }
    }
  }
";

const GET_PROJECT: &str = "
  query GetProject($id: String!) {
    project(id: $id) { id name }
  }
";

const RESTART_DEPLOYMENT: &str = "
  mutation RestartDeployment($id: String!) {
    deploymentRestart(id: $id)
  }
";

const REDEPLOY_DEPLOYMENT: &str = "
  mutation RedeployDeployment($id: String!) {
    deploymentRedeploy(id: $id) { id }
  }
";

const STOP_DEPLOYMENT: &str = "
  mutation StopDeployment($id: String!) {
    deploymentStop(id: $id)
  }
";

const CREATE_SERVICE: &str = "
  mutation CreateService($input: ServiceCreateInput!) {
    serviceCreate(input: $input) { ...ServiceFields }
  }
";

const DELETE_SERVICE: &str = "
  mutation DeleteService($id: String!) {
    serviceDelete(id: $id)
  }
";

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Deserialize)]
struct Edge<T> {
    node: T,
}

impl<T> Connection<T> {
    fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

#[derive(Deserialize)]
struct DeploymentsData {
    deployments: Connection<Deployment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceNode {
    id: String,
    name: String,
    #[serde(default)]
    icon: Option<String>,
    deployments: Option<Connection<LatestDeployment>>,
}

impl From<ServiceNode> for Service {
    fn from(node: ServiceNode) -> Self {
        Self {
            id: node.id,
            name: node.name,
            icon: node.icon,
            latest_deployment: node
                .deployments
                .and_then(|c| c.into_nodes().into_iter().next()),
        }
    }
}

#[derive(Deserialize)]
struct ServicesData {
    project: ProjectServices,
}

#[derive(Deserialize)]
struct ProjectServices {
    services: Connection<ServiceNode>,
}

#[derive(Deserialize)]
struct ProjectData {
    project: Project,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateServiceData {
    service_create: ServiceNode,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// List deployments of a project, optionally narrowed to one service.
pub async fn fetch_deployments(client: &ApiClient, scope: &DeploymentScope) -> Result<Vec<Deployment>> {
    let variables = serde_json::json!({
        "input": {
            "projectId": scope.project_id,
            "serviceId": scope.service_id,
        }
    });
    let query = format!("{DEPLOYMENT_FIELDS}{GET_DEPLOYMENTS}");
    let data: DeploymentsData = client
        .execute(&query, variables)
        .await
        .context("fetching deployments")?;
    Ok(data.deployments.into_nodes())
}

pub async fn fetch_services(client: &ApiClient, project_id: &str) -> Result<Vec<Service>> {
    let query = format!("{SERVICE_FIELDS}{GET_SERVICES}");
    let data: ServicesData = client
        .execute(&query, serde_json::json!({ "projectId": project_id }))
        .await
        .context("fetching services")?;
    Ok(data
        .project
        .services
        .into_nodes()
        .into_iter()
        .map(Service::from)
        .collect())
}

pub async fn fetch_project(client: &ApiClient, project_id: &str) -> Result<Project> {
    let data: ProjectData = client
        .execute(GET_PROJECT, serde_json::json!({ "id": project_id }))
        .await
        .context("fetching project")?;
    Ok(data.project)
}

pub async fn restart_deployment(client: &ApiClient, id: &str) -> Result<()> {
    let _: serde_json::Value = client
        .execute(RESTART_DEPLOYMENT, serde_json::json!({ "id": id }))
        .await
        .context("restarting deployment")?;
    Ok(())
}

pub async fn redeploy_deployment(client: &ApiClient, id: &str) -> Result<()> {
    let _: serde_json::Value = client
        .execute(REDEPLOY_DEPLOYMENT, serde_json::json!({ "id": id }))
        .await
        .context("redeploying deployment")?;
    Ok(())
}

pub async fn stop_deployment(client: &ApiClient, id: &str) -> Result<()> {
    let _: serde_json::Value = client
        .execute(STOP_DEPLOYMENT, serde_json::json!({ "id": id }))
        .await
        .context("stopping deployment")?;
    Ok(())
}

/// Create an empty service in the project.
pub async fn create_service(client: &ApiClient, project_id: &str) -> Result<Service> {
    let query = format!("{SERVICE_FIELDS}{CREATE_SERVICE}");
    let data: CreateServiceData = client
        .execute(
            &query,
            serde_json::json!({ "input": { "projectId": project_id } }),
        )
        .await
        .context("creating service")?;
    Ok(data.service_create.into())
}

pub async fn delete_service(client: &ApiClient, id: &str) -> Result<()> {
    let _: serde_json::Value = client
        .execute(DELETE_SERVICE, serde_json::json!({ "id": id }))
        .await
        .context("deleting service")?;
    Ok(())
}
