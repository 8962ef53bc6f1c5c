use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use iocraft::prelude::*;

use crate::actions::browser::open_in_browser;
use crate::app::ViewKind;
use crate::components::action_menu::{ActionMenu, MenuAction, RenderedActionMenu};
use crate::components::cells;
use crate::components::dialogs::{ConfirmPrompt, RenderedConfirm};
use crate::components::footer::{Footer, RenderedFooter};
use crate::components::table::{Cell, Column, RenderedTable, Row, ScrollableTable, TableBuildConfig};
use crate::config::types::AppConfig;
use crate::dispatch::ActionKind;
use crate::engine::{EngineHandle, ServicesFetcher};
use crate::notifier::{NotificationPhase, NotificationSink};
use crate::theme::ResolvedTheme;
use crate::toast::ToastQueue;
use crate::types::Service;
use crate::util::format_updated_ago;

use super::{InputMode, ListController, clamp_cursor, default_theme};

const KEY_HINTS: &str = "enter deployments  a actions  n new  r refresh  tab switch  q quit";

type Controller = ListController<ServicesFetcher>;

fn columns() -> Vec<Column> {
    vec![
        Column::new("name", "Service", 0.30),
        Column::new("status", "Latest deployment", 0.25),
        Column::new("url", "URL", 0.45),
    ]
}

fn service_to_row(s: &Service, theme: &ResolvedTheme) -> Row {
    let mut row = Row::new();
    let name = match &s.icon {
        Some(icon) if !icon.starts_with("http") => format!("{icon} {}", s.name),
        _ => s.name.clone(),
    };
    row.insert("name".to_owned(), Cell::bold(name));
    let status = s.latest_deployment.as_ref().map_or_else(
        || cells::no_status_cell(theme),
        |d| cells::status_cell(d.status, theme),
    );
    row.insert("status".to_owned(), status);
    row.insert(
        "url".to_owned(),
        Cell::colored(
            service_url(s).unwrap_or_default(),
            theme.text_secondary,
        ),
    );
    row
}

/// Public URL of the service's latest deployment.
fn service_url(s: &Service) -> Option<String> {
    let raw = s.latest_deployment.as_ref()?.static_url.as_deref()?;
    if raw.is_empty() {
        None
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_owned())
    } else {
        Some(format!("https://{raw}"))
    }
}

pub(crate) fn service_actions(s: &Service) -> Vec<MenuAction> {
    let mut actions = Vec::with_capacity(2);
    if service_url(s).is_some() {
        actions.push(MenuAction::OpenDeployment);
    }
    actions.push(MenuAction::Remote(ActionKind::Delete));
    actions
}

// ---------------------------------------------------------------------------
// ServicesView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct ServicesViewProps<'a> {
    pub engine: Option<&'a EngineHandle>,
    pub config: Option<&'a AppConfig>,
    pub theme: Option<&'a ResolvedTheme>,
    pub toasts: Option<&'a ToastQueue>,
    pub project_id: Option<&'a str>,
    pub project_name: Option<String>,
    pub width: u16,
    pub height: u16,
    pub is_active: bool,
    pub should_exit: Option<State<bool>>,
    pub switch_view: Option<State<bool>>,
    /// Set to `(id, name)` to show that service's deployments.
    pub open_service: Option<State<Option<(String, String)>>>,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn ServicesView<'a>(props: &ServicesViewProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let defaults = props.config.map(|c| c.defaults.clone()).unwrap_or_default();
    let is_active = props.is_active;
    let should_exit = props.should_exit;
    let switch_view = props.switch_view;
    let open_service = props.open_service;
    let toasts = props.toasts.cloned();
    let project_id = props.project_id.map(str::to_owned);

    let controller = hooks.use_state({
        let engine = props.engine.cloned();
        let toasts = toasts.clone();
        let policy = defaults.loading_policy;
        move || -> Option<Arc<Controller>> {
            let engine = engine?;
            let toasts = toasts?;
            let fetcher = ServicesFetcher::new(engine.backend());
            Some(Arc::new(ListController::new(
                &engine,
                fetcher,
                policy,
                &toasts,
                &[ActionKind::Create, ActionKind::Delete],
            )))
        }
    });
    let controller = controller.read().clone();

    let mut cursor = hooks.use_state(|| 0usize);
    let mut scroll_offset = hooks.use_state(|| 0usize);
    let mut input_mode = hooks.use_state(|| InputMode::Normal);
    let mut loaded = hooks.use_state(|| false);
    let mut tick = hooks.use_state(|| 0u64);

    if is_active
        && !loaded.get()
        && let Some(ref ctl) = controller
        && let Some(ref project) = project_id
    {
        ctl.load(project.clone());
        loaded.set(true);
    }

    // Poll store changes, refetch on the configured interval.
    {
        let ctl = controller.clone();
        let refetch = Duration::from_secs(u64::from(defaults.refetch_interval_minutes) * 60);
        hooks.use_future(async move {
            let mut seen = u64::MAX;
            let mut last_second = Instant::now();
            let mut last_refetch = Instant::now();
            loop {
                smol::Timer::after(Duration::from_millis(100)).await;
                let version = ctl.as_ref().map_or(0, |c| c.version());
                let now = Instant::now();
                let mut changed = version != seen;
                if now.duration_since(last_second) >= Duration::from_secs(1) {
                    last_second = now;
                    changed = true;
                }
                if !refetch.is_zero() && now.duration_since(last_refetch) >= refetch {
                    last_refetch = now;
                    if let Some(ref c) = ctl {
                        c.refresh();
                    }
                }
                if changed {
                    seen = version;
                    tick.set(tick.get().wrapping_add(1));
                }
            }
        });
    }

    let state = controller.as_ref().map(|c| c.state()).unwrap_or_default();
    if controller.as_ref().is_some_and(|c| c.take_reset()) {
        cursor.set(0);
        scroll_offset.set(0);
        let menu_open = matches!(*input_mode.read(), InputMode::Menu(_));
        if menu_open {
            input_mode.set(InputMode::Normal);
        }
    }

    let rows: Vec<Row> = state.items.iter().map(|s| service_to_row(s, &theme)).collect();
    let visible_rows = usize::from(props.height.saturating_sub(6));
    let (cur, scroll) = clamp_cursor(cursor.get(), scroll_offset.get(), rows.len(), visible_rows);
    let current = state.items.get(cur).cloned();

    let empty_message = defaults.empty_text.services.clone();
    let cols = columns();
    let rendered_table = RenderedTable::build(&TableBuildConfig {
        columns: &cols,
        status: &state.status,
        rows: &rows,
        cursor: cur,
        scroll_offset: scroll,
        visible_rows,
        hidden_columns: None,
        total_width: props.width.saturating_sub(2),
        theme: &theme,
        show_header: true,
        skeleton_rows: defaults.skeleton_rows,
        empty_message: &empty_message,
    });
    let actions_enabled = rendered_table.actions_enabled;

    // -----------------------------------------------------------------------
    // Keyboard handling
    // -----------------------------------------------------------------------

    hooks.use_terminal_events({
        let ctl = controller.clone();
        let toasts = toasts.clone();
        let current = current.clone();
        let project_id = project_id.clone();
        let row_count = rows.len();
        move |event| match event {
            TerminalEvent::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                if !is_active {
                    return;
                }
                let dispatch = |kind: ActionKind, id: &str, name: Option<&str>| {
                    if let Some(ref c) = ctl
                        && let Err(e) = c.dispatch(kind, id, name)
                    {
                        tracing::warn!("services: {e}");
                    }
                };
                let mode = input_mode.read().clone();
                match mode {
                    InputMode::Confirm(kind, id) => match code {
                        KeyCode::Char('y' | 'Y') => {
                            input_mode.set(InputMode::Normal);
                            let name = current
                                .as_ref()
                                .filter(|s| s.id == id)
                                .map(|s| s.name.as_str());
                            dispatch(kind, &id, name);
                        }
                        KeyCode::Char('n' | 'N') | KeyCode::Esc => input_mode.set(InputMode::Normal),
                        _ => {}
                    },
                    InputMode::Menu(idx) => {
                        let Some(ref s) = current else {
                            input_mode.set(InputMode::Normal);
                            return;
                        };
                        let entries = service_actions(s);
                        match code {
                            KeyCode::Char('j') | KeyCode::Down => {
                                input_mode.set(InputMode::Menu((idx + 1).min(entries.len() - 1)));
                            }
                            KeyCode::Char('k') | KeyCode::Up => {
                                input_mode.set(InputMode::Menu(idx.saturating_sub(1)));
                            }
                            KeyCode::Enter => {
                                input_mode.set(InputMode::Normal);
                                match entries.get(idx).copied() {
                                    Some(action @ MenuAction::Remote(kind)) => {
                                        if action.needs_confirmation() {
                                            input_mode.set(InputMode::Confirm(kind, s.id.clone()));
                                        } else {
                                            dispatch(kind, &s.id, Some(&s.name));
                                        }
                                    }
                                    Some(MenuAction::OpenDeployment) => {
                                        if let Some(url) = service_url(s)
                                            && let Err(e) = open_in_browser(&url)
                                            && let Some(ref t) = toasts
                                        {
                                            t.show(NotificationPhase::Failure, &format!("{e:#}"));
                                        }
                                    }
                                    Some(MenuAction::ShowTimestamps) | None => {}
                                }
                            }
                            KeyCode::Esc | KeyCode::Char('q') => input_mode.set(InputMode::Normal),
                            _ => {}
                        }
                    }
                    InputMode::Timestamps => input_mode.set(InputMode::Normal),
                    InputMode::Normal => match code {
                        KeyCode::Char('q') => {
                            if let Some(mut exit) = should_exit {
                                exit.set(true);
                            }
                        }
                        KeyCode::Tab => {
                            if let Some(mut sv) = switch_view {
                                sv.set(true);
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Down => {
                            cursor.set((cur + 1).min(row_count.saturating_sub(1)));
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            cursor.set(cur.saturating_sub(1));
                        }
                        KeyCode::Char('g') | KeyCode::Home => cursor.set(0),
                        KeyCode::Char('G') | KeyCode::End => cursor.set(row_count.saturating_sub(1)),
                        KeyCode::Enter => {
                            if let Some(ref s) = current
                                && let Some(mut open) = open_service
                            {
                                open.set(Some((s.id.clone(), s.name.clone())));
                            }
                        }
                        KeyCode::Char('a') => {
                            if actions_enabled && current.is_some() {
                                input_mode.set(InputMode::Menu(0));
                            }
                        }
                        KeyCode::Char('d') => {
                            if actions_enabled && let Some(ref s) = current {
                                input_mode.set(InputMode::Confirm(ActionKind::Delete, s.id.clone()));
                            }
                        }
                        KeyCode::Char('n') => {
                            if let Some(ref project) = project_id {
                                dispatch(ActionKind::Create, project, None);
                            }
                        }
                        KeyCode::Char('r') => {
                            if let Some(ref c) = ctl {
                                c.refresh();
                            }
                        }
                        KeyCode::Char('x') => {
                            if let Some(ref t) = toasts {
                                t.dismiss_latest();
                            }
                        }
                        _ => {}
                    },
                }
            }
            _ => {}
        }
    });

    if cur != cursor.get() {
        cursor.set(cur);
    }
    if scroll != scroll_offset.get() {
        scroll_offset.set(scroll);
    }

    let mode = input_mode.read().clone();
    let rendered_menu = match (&mode, &current) {
        (InputMode::Menu(idx), Some(s)) => Some(RenderedActionMenu::build(
            &s.name,
            &service_actions(s),
            *idx,
            &theme,
        )),
        _ => None,
    };
    let rendered_confirm = match &mode {
        InputMode::Confirm(_, id) => {
            let name = state
                .items
                .iter()
                .find(|s| s.id == *id)
                .map_or(id.as_str(), |s| s.name.as_str());
            Some(RenderedConfirm::build(format!("Delete service {name}?"), &theme))
        }
        _ => None,
    };

    let now = Utc::now();
    let updated_text = controller
        .as_ref()
        .and_then(|c| c.fetched_at())
        .map(|t| format_updated_ago(t, now))
        .unwrap_or_default();
    let rendered_footer = RenderedFooter::build(
        ViewKind::Services,
        props.project_name.clone().unwrap_or_default(),
        format!("{} services", state.items.len()),
        updated_text,
        KEY_HINTS,
        &theme,
    );

    let width = u32::from(props.width);
    let height = u32::from(props.height);

    element! {
        View(flex_direction: FlexDirection::Column, width, height) {
            View(flex_grow: 1.0, flex_direction: FlexDirection::Column, overflow: Overflow::Hidden, padding_left: 1) {
                ScrollableTable(table: rendered_table)
            }
            ConfirmPrompt(confirm: rendered_confirm)
            Footer(footer: rendered_footer)
            ActionMenu(menu: rendered_menu, width: props.width, height: props.height)
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeploymentStatus, LatestDeployment};

    fn service(static_url: Option<&str>) -> Service {
        Service {
            id: "svc-1".to_owned(),
            name: "api".to_owned(),
            icon: None,
            latest_deployment: Some(LatestDeployment {
                status: DeploymentStatus::Success,
                static_url: static_url.map(str::to_owned),
            }),
        }
    }

    #[test]
    fn service_url_gets_a_scheme() {
        assert_eq!(
            service_url(&service(Some("api.example.app"))).as_deref(),
            Some("https://api.example.app")
        );
        assert_eq!(service_url(&service(Some(""))), None);
    }

    #[test]
    fn delete_is_always_offered_and_confirmed() {
        let actions = service_actions(&service(None));
        assert_eq!(actions, vec![MenuAction::Remote(ActionKind::Delete)]);
        assert!(actions[0].needs_confirmation());
    }
}
