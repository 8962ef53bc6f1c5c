use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::types::{Deployment, DeploymentScope, Project, Service};

/// Remote operations the dashboard needs from the platform API.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn fetch_project(&self, project_id: &str) -> Result<Project>;
    async fn fetch_services(&self, project_id: &str) -> Result<Vec<Service>>;
    async fn fetch_deployments(&self, scope: &DeploymentScope) -> Result<Vec<Deployment>>;

    async fn restart_deployment(&self, id: &str) -> Result<()>;
    async fn redeploy_deployment(&self, id: &str) -> Result<()>;
    async fn stop_deployment(&self, id: &str) -> Result<()>;
    async fn create_service(&self, project_id: &str) -> Result<Service>;
    async fn delete_service(&self, id: &str) -> Result<()>;
}

/// Handle to the engine held by the UI layer.
///
/// Cheaply cloneable. When the last handle is dropped the engine thread
/// stops its runtime, dropping any task still in flight.
#[derive(Clone)]
pub struct EngineHandle {
    runtime: Handle,
    backend: Arc<dyn Backend>,
    _alive: UnboundedSender<()>,
}

impl EngineHandle {
    /// Run `fut` on the engine's runtime. Non-blocking — returns immediately.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(fut)
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }
}

/// Implemented by both `ApiEngine` and `StubEngine`.
pub trait Engine: Send + 'static {
    fn start(self) -> Result<EngineHandle>;
}

/// Start a dedicated OS thread running a single-threaded tokio runtime for
/// `backend`. Every store load and dispatched action runs on that one thread.
pub(super) fn start_runtime(name: &str, backend: Arc<dyn Backend>) -> Result<EngineHandle> {
    let (handle_tx, handle_rx) = std::sync::mpsc::channel();
    let (alive_tx, mut alive_rx) = tokio::sync::mpsc::unbounded_channel::<()>();

    std::thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = handle_tx.send(Err(e));
                    return;
                }
            };
            let _ = handle_tx.send(Ok(rt.handle().clone()));
            // Park here, driving spawned tasks, until every handle is gone.
            rt.block_on(async move { while alive_rx.recv().await.is_some() {} });
            tracing::debug!("engine: shutting down");
        })
        .context("spawning engine thread")?;

    let runtime = handle_rx
        .recv()
        .context("engine thread exited before starting")?
        .context("building tokio runtime")?;

    Ok(EngineHandle {
        runtime,
        backend,
        _alive: alive_tx,
    })
}
