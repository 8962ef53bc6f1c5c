use serde::{Deserialize, Serialize};

use crate::filter::Fields;
use crate::store::Entity;

use super::deployment::DeploymentStatus;

/// Status and URL of the most recent deployment of a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestDeployment {
    pub status: DeploymentStatus,
    #[serde(default)]
    pub static_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub latest_deployment: Option<LatestDeployment>,
}

impl Entity for Service {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Fields for Service {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(&self.id),
            "name" => Some(&self.name),
            "status" => self.latest_deployment.as_ref().map(|d| d.status.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}
