use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// An error reported by the GraphQL server in the response `errors` array.
///
/// `message` is the server's own wording and is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GraphqlError {
    pub message: String,
}

/// Thin GraphQL-over-HTTP client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deploy-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.to_owned(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one operation and deserialize its `data` member.
    ///
    /// A non-empty `errors` array becomes a [`GraphqlError`] carrying the first
    /// message, even when the HTTP status is not 2xx.
    pub async fn execute<V, D>(&self, query: &str, variables: V) -> Result<D>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let payload = serde_json::json!({
            "query": query,
            "variables": variables,
        });
        let mut request = self.http.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("sending GraphQL request")?;
        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => bail!("HTTP {status}"),
            Err(e) => return Err(e).context("decoding GraphQL response"),
        };

        if let Some(message) = first_error_message(&body) {
            return Err(GraphqlError { message }.into());
        }
        if !status.is_success() {
            bail!("HTTP {status}");
        }

        let data = body
            .get("data")
            .filter(|d| !d.is_null())
            .cloned()
            .context("GraphQL response has no data")?;
        serde_json::from_value(data).context("decoding GraphQL data")
    }
}

fn first_error_message(body: &Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .iter()
        .find_map(|e| e.get("message")?.as_str().map(str::to_owned))
}

/// The message to show for a failed call: the server's wording when there is
/// one, otherwise the full error chain.
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GraphqlError>() {
        Some(gql) => gql.message.clone(),
        None => format!("{err:#}"),
    }
}
