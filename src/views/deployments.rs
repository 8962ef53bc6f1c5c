use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use iocraft::prelude::*;

use crate::actions::browser::open_in_browser;
use crate::app::ViewKind;
use crate::components::action_menu::{ActionMenu, MenuAction, RenderedActionMenu};
use crate::components::cells;
use crate::components::dialogs::{RenderedTimestampPanel, TimestampPanel};
use crate::components::footer::{Footer, RenderedFooter};
use crate::components::table::{Cell, Column, RenderedTable, Row, ScrollableTable, TableBuildConfig};
use crate::config::types::AppConfig;
use crate::dispatch::ActionKind;
use crate::engine::{DeploymentsFetcher, EngineHandle};
use crate::filter::{self, FilterCriteria, MatchValue, SortDirection};
use crate::notifier::{NotificationPhase, NotificationSink};
use crate::theme::ResolvedTheme;
use crate::toast::ToastQueue;
use crate::types::{Deployment, DeploymentScope};
use crate::util::{TimestampDetail, format_updated_ago};

use super::{InputMode, ListController, clamp_cursor, default_theme};

const SERVICE_FIELD: &str = "service";
const SORT_FIELDS: [Option<&str>; 3] = [None, Some("service"), Some("status")];
const KEY_HINTS: &str = "enter actions  f filter  s sort  r refresh  tab switch  q quit";

type Controller = ListController<DeploymentsFetcher>;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

fn columns() -> Vec<Column> {
    vec![
        Column::new("id", "Deployment", 0.34),
        Column::new("environment", "Environment", 0.16),
        Column::new("status", "Status", 0.18),
        Column::new("service", "Service", 0.18),
        Column::new("created", "Created", 0.14).align(TextAlign::Right),
    ]
}

fn deployment_to_row(
    d: &Deployment,
    now: chrono::DateTime<Utc>,
    threshold: chrono::Duration,
    theme: &ResolvedTheme,
) -> Row {
    let mut row = Row::new();
    row.insert("id".to_owned(), Cell::plain(d.id.clone()));
    row.insert(
        "environment".to_owned(),
        Cell::colored(d.environment.name.clone(), theme.text_secondary),
    );
    row.insert("status".to_owned(), cells::status_cell(d.status, theme));
    row.insert("service".to_owned(), Cell::bold(d.service.name.clone()));
    row.insert(
        "created".to_owned(),
        cells::time_cell(&d.created_at, now, threshold, theme),
    );
    row
}

/// Entries of a deployment's action menu.
pub(crate) fn deployment_actions(d: &Deployment) -> Vec<MenuAction> {
    let mut actions = Vec::with_capacity(5);
    if d.browser_url().is_some() {
        actions.push(MenuAction::OpenDeployment);
    }
    actions.push(MenuAction::ShowTimestamps);
    actions.push(MenuAction::Remote(ActionKind::Restart));
    actions.push(MenuAction::Remote(ActionKind::Redeploy));
    if !d.deployment_stopped {
        actions.push(MenuAction::Remote(ActionKind::Stop));
    }
    actions
}

/// The filtered, optionally sorted list the table shows.
fn visible_deployments(
    items: &[Deployment],
    criteria: &FilterCriteria,
    sort: Option<&str>,
    dir: SortDirection,
) -> Vec<Deployment> {
    let filtered = filter::project(items, criteria);
    match sort {
        Some(field) => filter::sort_by_field(&filtered, field, dir),
        None => filtered,
    }
}

// ---------------------------------------------------------------------------
// DeploymentsView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct DeploymentsViewProps<'a> {
    pub engine: Option<&'a EngineHandle>,
    pub config: Option<&'a AppConfig>,
    pub theme: Option<&'a ResolvedTheme>,
    pub toasts: Option<&'a ToastQueue>,
    pub project_id: Option<&'a str>,
    pub project_name: Option<String>,
    /// Narrow the list to one service and hide the service column.
    pub service_scope: Option<(String, String)>,
    pub width: u16,
    pub height: u16,
    pub is_active: bool,
    pub should_exit: Option<State<bool>>,
    pub switch_view: Option<State<bool>>,
    /// Set to leave the service scope and go back to the services view.
    pub go_back: Option<State<bool>>,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn DeploymentsView<'a>(
    props: &DeploymentsViewProps<'a>,
    mut hooks: Hooks,
) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let defaults = props.config.map(|c| c.defaults.clone()).unwrap_or_default();
    let is_active = props.is_active;
    let should_exit = props.should_exit;
    let switch_view = props.switch_view;
    let go_back = props.go_back;
    let toasts = props.toasts.cloned();

    let controller = hooks.use_state({
        let engine = props.engine.cloned();
        let toasts = toasts.clone();
        let policy = defaults.loading_policy;
        move || -> Option<Arc<Controller>> {
            let engine = engine?;
            let toasts = toasts?;
            let fetcher = DeploymentsFetcher::new(engine.backend());
            Some(Arc::new(ListController::new(
                &engine,
                fetcher,
                policy,
                &toasts,
                &[ActionKind::Restart, ActionKind::Redeploy, ActionKind::Stop],
            )))
        }
    });
    let controller = controller.read().clone();

    let mut cursor = hooks.use_state(|| 0usize);
    let mut scroll_offset = hooks.use_state(|| 0usize);
    let mut input_mode = hooks.use_state(|| InputMode::Normal);
    let mut service_filter = hooks.use_state(|| MatchValue::All);
    let mut sort_idx = hooks.use_state(|| 0usize);
    let mut sort_dir = hooks.use_state(SortDirection::default);
    let mut loaded_scope = hooks.use_state(|| Option::<DeploymentScope>::None);
    let mut tick = hooks.use_state(|| 0u64);

    // Load when first shown and whenever the scope changes.
    let scope_service = props.service_scope.clone();
    let desired_scope = props.project_id.map(|project_id| DeploymentScope {
        project_id: project_id.to_owned(),
        service_id: scope_service.as_ref().map(|(id, _)| id.clone()),
    });
    let needs_load = desired_scope
        .as_ref()
        .is_some_and(|s| loaded_scope.read().as_ref() != Some(s));
    if is_active
        && needs_load
        && let Some(ref ctl) = controller
        && let Some(ref scope) = desired_scope
    {
        tracing::debug!("deployments: loading {scope:?}");
        ctl.load(scope.clone());
        loaded_scope.set(Some(scope.clone()));
        service_filter.set(MatchValue::All);
        cursor.set(0);
        scroll_offset.set(0);
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
        let overlay_open = matches!(*input_mode.read(), InputMode::Menu(_) | InputMode::Timestamps);
        if overlay_open {
            input_mode.set(InputMode::Normal);
        }
    }

    let scoped = scope_service.is_some();
    let criteria = FilterCriteria {
        field: SERVICE_FIELD.to_owned(),
        value: if scoped { MatchValue::All } else { service_filter.read().clone() },
    };
    let sort_field = SORT_FIELDS[sort_idx.get() % SORT_FIELDS.len()];
    let visible = visible_deployments(&state.items, &criteria, sort_field, sort_dir.get());
    let filter_options = filter::filter_options(&state.items, SERVICE_FIELD);

    let now = Utc::now();
    let threshold = chrono::Duration::hours(i64::from(defaults.relative_threshold_hours));
    let rows: Vec<Row> = visible
        .iter()
        .map(|d| deployment_to_row(d, now, threshold, &theme))
        .collect();

    let visible_rows = usize::from(props.height.saturating_sub(6));
    let (cur, scroll) = clamp_cursor(cursor.get(), scroll_offset.get(), rows.len(), visible_rows);
    let current = visible.get(cur).cloned();

    let hidden: HashSet<String> = if scoped {
        [SERVICE_FIELD.to_owned()].into_iter().collect()
    } else {
        HashSet::new()
    };
    let empty_message = defaults.empty_text.deployments.clone();
    let cols = columns();
    let rendered_table = RenderedTable::build(&TableBuildConfig {
        columns: &cols,
        status: &state.status,
        rows: &rows,
        cursor: cur,
        scroll_offset: scroll,
        visible_rows,
        hidden_columns: Some(&hidden),
        total_width: props.width.saturating_sub(2),
        theme: &theme,
        show_header: !scoped,
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
        let row_count = rows.len();
        move |event| match event {
            TerminalEvent::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                if !is_active {
                    return;
                }
                let mode = input_mode.read().clone();
                match mode {
                    InputMode::Menu(idx) => {
                        let Some(ref d) = current else {
                            input_mode.set(InputMode::Normal);
                            return;
                        };
                        let entries = deployment_actions(d);
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
                                    Some(MenuAction::Remote(kind)) => {
                                        if let Some(ref c) = ctl
                                            && let Err(e) = c.dispatch(kind, &d.id, None)
                                        {
                                            tracing::warn!("deployments: {e}");
                                        }
                                    }
                                    Some(MenuAction::OpenDeployment) => {
                                        if let Some(url) = d.browser_url()
                                            && let Err(e) = open_in_browser(&url)
                                            && let Some(ref t) = toasts
                                        {
                                            t.show(NotificationPhase::Failure, &format!("{e:#}"));
                                        }
                                    }
                                    Some(MenuAction::ShowTimestamps) => {
                                        input_mode.set(InputMode::Timestamps);
                                    }
                                    None => {}
                                }
                            }
                            KeyCode::Esc | KeyCode::Char('q') => input_mode.set(InputMode::Normal),
                            _ => {}
                        }
                    }
                    InputMode::Timestamps => {
                        if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('t' | 'q')) {
                            input_mode.set(InputMode::Normal);
                        }
                    }
                    // Deployments never ask for confirmation.
                    InputMode::Confirm(..) => input_mode.set(InputMode::Normal),
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
                        KeyCode::Esc => {
                            if scoped && let Some(mut back) = go_back {
                                back.set(true);
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
                        KeyCode::Enter | KeyCode::Char('a') => {
                            if actions_enabled && current.is_some() {
                                input_mode.set(InputMode::Menu(0));
                            }
                        }
                        KeyCode::Char('t') => {
                            if current.is_some() {
                                input_mode.set(InputMode::Timestamps);
                            }
                        }
                        KeyCode::Char('o') => {
                            if let Some(url) = current.as_ref().and_then(Deployment::browser_url)
                                && let Err(e) = open_in_browser(&url)
                                && let Some(ref t) = toasts
                            {
                                t.show(NotificationPhase::Failure, &format!("{e:#}"));
                            }
                        }
                        KeyCode::Char('r') => {
                            if let Some(ref c) = ctl {
                                c.refresh();
                            }
                        }
                        KeyCode::Char(ch @ ('f' | 'F')) if !scoped => {
                            let current_filter = service_filter.read().clone();
                            service_filter.set(filter::cycle_option(&filter_options, &current_filter, ch == 'f'));
                            cursor.set(0);
                            scroll_offset.set(0);
                        }
                        KeyCode::Char('s') => {
                            sort_idx.set((sort_idx.get() + 1) % SORT_FIELDS.len());
                        }
                        KeyCode::Char('S') => {
                            sort_dir.set(match sort_dir.get() {
                                SortDirection::Ascending => SortDirection::Descending,
                                SortDirection::Descending => SortDirection::Ascending,
                            });
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

    // -----------------------------------------------------------------------
    // Overlays and footer
    // -----------------------------------------------------------------------

    let mode = input_mode.read().clone();
    let rendered_menu = match (&mode, &current) {
        (InputMode::Menu(idx), Some(d)) => Some(RenderedActionMenu::build(
            &d.id,
            &deployment_actions(d),
            *idx,
            &theme,
        )),
        _ => None,
    };
    let rendered_timestamps = match (&mode, &current) {
        (InputMode::Timestamps, Some(d)) => Some(RenderedTimestampPanel::build(
            TimestampDetail::new(&d.created_at, now),
            &theme,
        )),
        _ => None,
    };

    let context_text = match &scope_service {
        Some((_, name)) => format!("Service: {name}"),
        None => format!("Service: {}", criteria.value),
    };
    let context_text = match sort_field {
        Some(field) => {
            let arrow = match sort_dir.get() {
                SortDirection::Ascending => "\u{2191}",
                SortDirection::Descending => "\u{2193}",
            };
            format!("{context_text}  Sort: {field} {arrow}")
        }
        None => context_text,
    };
    let updated_text = controller
        .as_ref()
        .and_then(|c| c.fetched_at())
        .map(|t| format_updated_ago(t, now))
        .unwrap_or_default();
    let rendered_footer = RenderedFooter::build(
        ViewKind::Deployments,
        props.project_name.clone().unwrap_or_default(),
        context_text,
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
            Footer(footer: rendered_footer)
            ActionMenu(menu: rendered_menu, width: props.width, height: props.height)
            TimestampPanel(panel: rendered_timestamps, width: props.width, height: props.height)
        }
    }
    .into_any()
}
