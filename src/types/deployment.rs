use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::Fields;
use crate::store::Entity;

// ---------------------------------------------------------------------------
// Deployment status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Building,
    Crashed,
    Deploying,
    Failed,
    Initializing,
    NeedsApproval,
    Queued,
    Removed,
    Removing,
    Skipped,
    Sleeping,
    Success,
    Waiting,
    #[serde(other)]
    Unknown,
}

impl DeploymentStatus {
    /// Wire name, e.g. `"NEEDS_APPROVAL"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "BUILDING",
            Self::Crashed => "CRASHED",
            Self::Deploying => "DEPLOYING",
            Self::Failed => "FAILED",
            Self::Initializing => "INITIALIZING",
            Self::NeedsApproval => "NEEDS_APPROVAL",
            Self::Queued => "QUEUED",
            Self::Removed => "REMOVED",
            Self::Removing => "REMOVING",
            Self::Skipped => "SKIPPED",
            Self::Sleeping => "SLEEPING",
            Self::Success => "SUCCESS",
            Self::Waiting => "WAITING",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Badge label: lower-case with a capitalised first letter ("Needs approval").
    pub fn label(self) -> String {
        let lower = self.as_str().replace('_', " ").to_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Nested references
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub status: DeploymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub status_updated_at: Option<DateTime<Utc>>,
    pub project_id: String,
    pub service_id: String,
    pub environment_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub static_url: Option<String>,
    #[serde(default)]
    pub can_rollback: bool,
    #[serde(default)]
    pub can_redeploy: bool,
    #[serde(default)]
    pub suggest_add_service_domain: bool,
    #[serde(default)]
    pub deployment_stopped: bool,
    pub environment: EnvironmentRef,
    pub service: ServiceRef,
    #[serde(default)]
    pub creator: Option<Creator>,
}

impl Deployment {
    /// Browser URL for the deployment, normalised to `https://`.
    pub fn browser_url(&self) -> Option<String> {
        let raw = self.static_url.as_deref().or(self.url.as_deref())?;
        if raw.is_empty() {
            None
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            Some(raw.to_owned())
        } else {
            Some(format!("https://{raw}"))
        }
    }
}

impl Entity for Deployment {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Fields for Deployment {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(&self.id),
            "service" => Some(&self.service.name),
            "service_id" => Some(&self.service.id),
            "environment" => Some(&self.environment.name),
            "status" => Some(self.status.as_str()),
            _ => None,
        }
    }
}

/// Parameters narrowing a deployment list fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentScope {
    pub project_id: String,
    /// Only deployments of this service when set.
    pub service_id: Option<String>,
}
