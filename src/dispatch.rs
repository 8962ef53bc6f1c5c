use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::notifier::{ActionHandle, ActionNotifier, Outcome};
use crate::store::RefreshTarget;

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Restart,
    Redeploy,
    Stop,
    Create,
    Delete,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Restart => "Restart",
            Self::Redeploy => "Redeploy",
            Self::Stop => "Stop",
            Self::Create => "Create service",
            Self::Delete => "Delete service",
        }
    }

    pub fn progress_message(self) -> &'static str {
        match self {
            Self::Restart => "Restarting deployment…",
            Self::Redeploy => "Redeploying…",
            Self::Stop => "Stopping deployment…",
            Self::Create => "Creating empty service…",
            Self::Delete => "Deleting service…",
        }
    }

    /// Progress text naming the target when one is given. Only `Delete`
    /// mentions it ("Deleting api…").
    pub fn progress_message_for(self, display_name: Option<&str>) -> String {
        match (self, display_name) {
            (Self::Delete, Some(name)) => format!("Deleting {name}…"),
            _ => self.progress_message().to_owned(),
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Restart => "Deployment restarted",
            Self::Redeploy => "Deployment redeployed",
            Self::Stop => "Deployment stopped",
            Self::Create => "Service created",
            Self::Delete => "Service deleted",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Collaborator contract
// ---------------------------------------------------------------------------

/// A remote action failed. `message` is what the server said.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no remote action registered for {0}")]
    Unregistered(ActionKind),
}

/// Remote action capability for one action kind.
#[async_trait]
pub trait RemoteAction: Send + Sync {
    async fn invoke(&self, entity_id: &str) -> Result<(), ActionError>;
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// One dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInvocation {
    pub kind: ActionKind,
    pub target_id: String,
    /// Sequential id for logs.
    pub seq: u64,
    pub handle: ActionHandle,
}

/// Fire-and-forget dispatch of remote actions for one view.
pub struct ActionDispatcher {
    runtime: Handle,
    notifier: Arc<ActionNotifier>,
    refresh: Arc<dyn RefreshTarget>,
    actions: HashMap<ActionKind, Arc<dyn RemoteAction>>,
    next_seq: AtomicU64,
}

impl ActionDispatcher {
    pub fn new(
        runtime: Handle,
        notifier: Arc<ActionNotifier>,
        refresh: Arc<dyn RefreshTarget>,
    ) -> Self {
        Self {
            runtime,
            notifier,
            refresh,
            actions: HashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Register the remote action invoked for `kind`.
    pub fn with_action(mut self, kind: ActionKind, action: Arc<dyn RemoteAction>) -> Self {
        self.actions.insert(kind, action);
        self
    }

    pub fn supports(&self, kind: ActionKind) -> bool {
        self.actions.contains_key(&kind)
    }

    pub fn notifier(&self) -> &Arc<ActionNotifier> {
        &self.notifier
    }

    /// Start `kind` on `entity_id` and return without waiting for it.
    ///
    /// The progress notification is shown before this returns. On success the
    /// list is refreshed once; on failure the list is left alone and the
    /// server's message becomes the failure notification.
    pub fn dispatch(
        &self,
        kind: ActionKind,
        entity_id: &str,
    ) -> Result<(ActionInvocation, JoinHandle<()>), DispatchError> {
        self.dispatch_named(kind, entity_id, None)
    }

    /// Like [`ActionDispatcher::dispatch`], with the target's display name
    /// used in the progress notification.
    pub fn dispatch_named(
        &self,
        kind: ActionKind,
        entity_id: &str,
        display_name: Option<&str>,
    ) -> Result<(ActionInvocation, JoinHandle<()>), DispatchError> {
        let action = self
            .actions
            .get(&kind)
            .cloned()
            .ok_or(DispatchError::Unregistered(kind))?;

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = self.notifier.begin(&kind.progress_message_for(display_name));
        let invocation = ActionInvocation {
            kind,
            target_id: entity_id.to_owned(),
            seq,
            handle,
        };
        tracing::debug!("dispatch: #{seq} {kind} on {entity_id}");

        let notifier = Arc::clone(&self.notifier);
        let refresh = Arc::clone(&self.refresh);
        let target = entity_id.to_owned();
        let task = self.runtime.spawn(async move {
            match action.invoke(&target).await {
                Ok(()) => {
                    tracing::debug!("dispatch: #{seq} {kind} on {target} succeeded");
                    notifier.resolve(handle, Outcome::Success(kind.success_message().to_owned()));
                    refresh.refresh_list().await;
                }
                Err(e) => {
                    tracing::warn!("dispatch: #{seq} {kind} on {target} failed: {e}");
                    notifier.resolve(handle, Outcome::Failure(e.message));
                }
            }
        });
        Ok((invocation, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_progress_names_the_service() {
        assert_eq!(ActionKind::Delete.progress_message_for(Some("api")), "Deleting api…");
        assert_eq!(ActionKind::Delete.progress_message_for(None), "Deleting service…");
        assert_eq!(
            ActionKind::Stop.progress_message_for(Some("dep-1")),
            "Stopping deployment…"
        );
    }
}
