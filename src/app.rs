use std::time::Duration;

use iocraft::prelude::*;

use crate::components::toast_stack::{RenderedToastStack, ToastStack};
use crate::config::types::{AppConfig, View as DefaultView};
use crate::engine::EngineHandle;
use crate::theme::ResolvedTheme;
use crate::toast::ToastQueue;
use crate::views::deployments::DeploymentsView;
use crate::views::services::ServicesView;

// ---------------------------------------------------------------------------
// View switching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Services,
    Deployments,
}

impl ViewKind {
    pub const ALL: [ViewKind; 2] = [ViewKind::Services, ViewKind::Deployments];

    pub fn label(self) -> &'static str {
        match self {
            Self::Services => "Services",
            Self::Deployments => "Deployments",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Services => Self::Deployments,
            Self::Deployments => Self::Services,
        }
    }
}

impl From<DefaultView> for ViewKind {
    fn from(v: DefaultView) -> Self {
        match v {
            DefaultView::Services => Self::Services,
            DefaultView::Deployments => Self::Deployments,
        }
    }
}

// ---------------------------------------------------------------------------
// App component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct AppProps<'a> {
    pub config: Option<&'a AppConfig>,
    pub engine: Option<&'a EngineHandle>,
    pub theme: Option<&'a ResolvedTheme>,
    pub toasts: Option<&'a ToastQueue>,
    pub project_id: Option<&'a str>,
    /// Overrides `defaults.view` (CLI subcommand).
    pub initial_view: Option<ViewKind>,
    /// Start in the deployments view narrowed to this service id.
    pub initial_service: Option<String>,
}

#[component]
pub fn App<'a>(props: &AppProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let (width, height) = hooks.use_terminal_size();
    let mut system = hooks.use_context_mut::<SystemContext>();
    let should_exit = hooks.use_state(|| false);

    let config = props.config;
    let theme = props.theme;
    let initial_view = props
        .initial_view
        .or_else(|| config.map(|c| c.defaults.view.into()))
        .unwrap_or(ViewKind::Services);
    let mut active_view = hooks.use_state(move || initial_view);

    // (id, name) of the service the deployments view is narrowed to.
    let initial_service = props.initial_service.clone();
    let mut service_scope = hooks.use_state(move || initial_service.map(|id| (id.clone(), id)));
    let mut open_service = hooks.use_state(|| Option::<(String, String)>::None);
    let mut go_back = hooks.use_state(|| false);
    let mut switch_signal = hooks.use_state(|| false);

    if switch_signal.get() {
        switch_signal.set(false);
        active_view.set(active_view.get().next());
    }

    let requested_service = open_service.read().clone();
    if let Some(service) = requested_service {
        open_service.set(None);
        service_scope.set(Some(service));
        active_view.set(ViewKind::Deployments);
    }

    if go_back.get() {
        go_back.set(false);
        service_scope.set(None);
        active_view.set(ViewKind::Services);
    }

    if should_exit.get() {
        system.exit();
    }

    // Project name for the footer.
    let mut project_name = hooks.use_state(|| Option::<String>::None);
    {
        let engine = props.engine.cloned();
        let project_id = props.project_id.map(str::to_owned);
        hooks.use_future(async move {
            let (Some(engine), Some(project_id)) = (engine, project_id) else {
                return;
            };
            let backend = engine.backend();
            let task = engine.spawn(async move { backend.fetch_project(&project_id).await });
            match task.await {
                Ok(Ok(project)) => project_name.set(Some(project.name)),
                Ok(Err(e)) => tracing::warn!("app: fetching project failed: {e:#}"),
                Err(e) => tracing::warn!("app: project task failed: {e}"),
            }
        });
    }

    // Re-render when toasts change.
    let mut toast_version = hooks.use_state(|| 0u64);
    {
        let toasts = props.toasts.cloned();
        hooks.use_future(async move {
            let Some(toasts) = toasts else {
                return;
            };
            loop {
                smol::Timer::after(Duration::from_millis(100)).await;
                toasts.prune();
                let v = toasts.version();
                if v != toast_version.get() {
                    toast_version.set(v);
                }
            }
        });
    }

    let rendered_toasts = match (props.toasts, theme) {
        (Some(t), Some(theme)) => Some(RenderedToastStack::build(&t.visible(), theme)),
        (Some(t), None) => Some(RenderedToastStack::build(&t.visible(), &ResolvedTheme::default())),
        _ => None,
    };

    let active = active_view.get();
    let name = project_name.read().clone();
    let scope = service_scope.read().clone();

    element! {
        View(width: u32::from(width), height: u32::from(height), flex_direction: FlexDirection::Column) {
            View(
                display: if active == ViewKind::Services { Display::Flex } else { Display::None },
                flex_grow: 1.0,
            ) {
                ServicesView(
                    engine: props.engine,
                    config,
                    theme,
                    toasts: props.toasts,
                    project_id: props.project_id,
                    project_name: name.clone(),
                    width,
                    height,
                    is_active: active == ViewKind::Services,
                    should_exit,
                    switch_view: switch_signal,
                    open_service,
                )
            }
            View(
                display: if active == ViewKind::Deployments { Display::Flex } else { Display::None },
                flex_grow: 1.0,
            ) {
                DeploymentsView(
                    engine: props.engine,
                    config,
                    theme,
                    toasts: props.toasts,
                    project_id: props.project_id,
                    project_name: name,
                    service_scope: scope,
                    width,
                    height,
                    is_active: active == ViewKind::Deployments,
                    should_exit,
                    switch_view: switch_signal,
                    go_back,
                )
            }
            ToastStack(stack: rendered_toasts, width, height)
        }
    }
}
