use std::collections::{HashMap, HashSet};

use iocraft::prelude::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::color::Color as AppColor;
use crate::store::ListStatus;
use crate::theme::ResolvedTheme;

// ---------------------------------------------------------------------------
// Column definition
// ---------------------------------------------------------------------------

/// Defines a column in the table.
#[derive(Debug, Clone)]
pub struct Column {
    /// Unique identifier (e.g., "id", "status", "created").
    pub id: String,
    /// Display header text.
    pub header: String,
    /// Share of the width left after fixed columns (0.0..1.0).
    pub default_width_pct: f32,
    /// Fixed width in cells; takes precedence over the percentage.
    pub fixed_width: Option<u16>,
    pub align: TextAlign,
}

impl Column {
    pub fn new(id: &str, header: &str, default_width_pct: f32) -> Self {
        Self {
            id: id.to_owned(),
            header: header.to_owned(),
            default_width_pct,
            fixed_width: None,
            align: TextAlign::Left,
        }
    }

    pub fn fixed(mut self, width: u16) -> Self {
        self.fixed_width = Some(width);
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// A single cell value to display.
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub color: Option<AppColor>,
    pub bold: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: false,
        }
    }

    pub fn colored(text: impl Into<String>, color: AppColor) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: true,
        }
    }
}

/// A complete row of cells indexed by column id.
pub type Row = HashMap<String, Cell>;

// ---------------------------------------------------------------------------
// Pre-rendered table data (all owned)
// ---------------------------------------------------------------------------

/// What the table body shows for the current list state.
pub enum TableBody {
    /// Placeholder rows while the list is loading.
    Skeleton(Vec<RenderedRow>),
    /// The list loaded and is empty.
    Empty(String),
    Rows(Vec<RenderedRow>),
}

/// Pre-render table data into fully owned structures that can be passed
/// into the `element!` macro without lifetime issues.
pub struct RenderedTable {
    pub header_cells: Option<Vec<HeaderCell>>,
    pub body: TableBody,
    /// Shown under the rows when the last load failed.
    pub error_line: Option<String>,
    /// Row actions are offered only once the list has settled.
    pub actions_enabled: bool,
    pub total_width: u32,
    pub header_fg: Color,
    pub border_fg: Color,
    pub faint_fg: Color,
    pub error_fg: Color,
}

pub struct HeaderCell {
    pub text: String,
    pub width: u32,
    pub align: TextAlign,
}

pub struct RenderedRow {
    pub key: usize,
    pub bg: Option<Color>,
    pub cells: Vec<RenderedCell>,
}

pub struct RenderedCell {
    pub text: String,
    pub fg: Color,
    pub weight: Weight,
    pub width: u32,
    pub align: TextAlign,
}

/// Configuration for building a `RenderedTable`.
pub struct TableBuildConfig<'a> {
    pub columns: &'a [Column],
    pub status: &'a ListStatus,
    pub rows: &'a [Row],
    pub cursor: usize,
    pub scroll_offset: usize,
    pub visible_rows: usize,
    pub hidden_columns: Option<&'a HashSet<String>>,
    pub total_width: u16,
    pub theme: &'a ResolvedTheme,
    pub show_header: bool,
    pub skeleton_rows: usize,
    /// Message to show when a settled list is empty.
    pub empty_message: &'a str,
}

impl RenderedTable {
    /// Build a `RenderedTable` from a configuration.
    ///
    /// `Loading` with nothing to show yields exactly `skeleton_rows`
    /// placeholders; a `Ready` empty list yields the empty message once;
    /// `Error` keeps whatever rows are still held and adds an error line.
    pub fn build(cfg: &TableBuildConfig<'_>) -> Self {
        let theme = cfg.theme;
        let visible_columns: Vec<&Column> = cfg
            .columns
            .iter()
            .filter(|c| cfg.hidden_columns.is_none_or(|h| !h.contains(&c.id)))
            .collect();
        let col_widths = compute_column_widths(&visible_columns, cfg.total_width);

        let header_cells = cfg.show_header.then(|| {
            visible_columns
                .iter()
                .zip(col_widths.iter())
                .map(|(col, &w)| HeaderCell {
                    text: truncate_to_width(&col.header, usize::from(w)),
                    width: u32::from(w),
                    align: col.align,
                })
                .collect()
        });

        let loading = matches!(cfg.status, ListStatus::Loading);
        // Loading always draws placeholders, whatever the store retained.
        let body = if loading {
            TableBody::Skeleton(skeleton_rows(
                &visible_columns,
                &col_widths,
                cfg.skeleton_rows,
                theme.text_faint.to_crossterm_color(),
            ))
        } else if matches!(cfg.status, ListStatus::Ready) && cfg.rows.is_empty() {
            TableBody::Empty(cfg.empty_message.to_owned())
        } else {
            TableBody::Rows(body_rows(
                cfg,
                &visible_columns,
                &col_widths,
                theme.bg_selected.to_crossterm_color(),
            ))
        };

        let error_line = match cfg.status {
            ListStatus::Error(e) => Some(format!("Failed to load: {e}")),
            _ => None,
        };

        Self {
            header_cells,
            body,
            error_line,
            actions_enabled: !loading,
            total_width: u32::from(cfg.total_width),
            header_fg: theme.text_primary.to_crossterm_color(),
            border_fg: theme.border_faint.to_crossterm_color(),
            faint_fg: theme.text_faint.to_crossterm_color(),
            error_fg: theme.text_error.to_crossterm_color(),
        }
    }

    /// Number of body rows drawn, placeholders included.
    pub fn row_count(&self) -> usize {
        match &self.body {
            TableBody::Skeleton(rows) | TableBody::Rows(rows) => rows.len(),
            TableBody::Empty(_) => 0,
        }
    }
}

fn body_rows(
    cfg: &TableBuildConfig<'_>,
    columns: &[&Column],
    widths: &[u16],
    selected_bg: Color,
) -> Vec<RenderedRow> {
    let rows = cfg.rows;
    let end = (cfg.scroll_offset + cfg.visible_rows).min(rows.len());
    let visible_slice = if cfg.scroll_offset < rows.len() {
        &rows[cfg.scroll_offset..end]
    } else {
        &[]
    };

    visible_slice
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let absolute_idx = cfg.scroll_offset + i;
            let bg = (absolute_idx == cfg.cursor).then_some(selected_bg);
            let cells = columns
                .iter()
                .zip(widths.iter())
                .map(|(col, &w)| {
                    let cell = row.get(&col.id);
                    let text = cell.map_or_else(String::new, |c| {
                        truncate_to_width(&c.text, usize::from(w).saturating_sub(1))
                    });
                    let fg = cell
                        .and_then(|c| c.color)
                        .map_or(Color::Reset, AppColor::to_crossterm_color);
                    let weight = if cell.is_some_and(|c| c.bold) {
                        Weight::Bold
                    } else {
                        Weight::Normal
                    };
                    RenderedCell {
                        text,
                        fg,
                        weight,
                        width: u32::from(w),
                        align: col.align,
                    }
                })
                .collect();
            RenderedRow {
                key: absolute_idx,
                bg,
                cells,
            }
        })
        .collect()
}

fn skeleton_rows(columns: &[&Column], widths: &[u16], count: usize, fg: Color) -> Vec<RenderedRow> {
    (0..count)
        .map(|key| RenderedRow {
            key,
            bg: None,
            cells: columns
                .iter()
                .zip(widths.iter())
                .map(|(col, &w)| RenderedCell {
                    text: "\u{2591}".repeat(usize::from(w.saturating_sub(2)).min(12)),
                    fg,
                    weight: Weight::Normal,
                    width: u32::from(w),
                    align: col.align,
                })
                .collect(),
        })
        .collect()
}

/// Cut `text` to at most `max` display columns, ending in `…` when cut.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_owned();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('\u{2026}');
    out
}

// ---------------------------------------------------------------------------
// ScrollableTable component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct ScrollableTableProps {
    /// Pre-rendered table data.
    pub table: Option<RenderedTable>,
}

fn row_element(row: RenderedRow) -> AnyElement<'static> {
    element! {
        View(key: row.key, background_color: row.bg) {
            #(row.cells.into_iter().enumerate().map(|(ci, cell)| {
                element! {
                    View(key: ci, width: cell.width) {
                        Text(
                            content: cell.text,
                            color: cell.fg,
                            weight: cell.weight,
                            wrap: TextWrap::NoWrap,
                            align: cell.align,
                        )
                    }
                }
            }))
        }
    }
    .into_any()
}

#[component]
pub fn ScrollableTable(props: &mut ScrollableTableProps) -> impl Into<AnyElement<'static>> {
    let Some(table) = props.table.take() else {
        return element! { View }.into_any();
    };

    let (rows, empty) = match table.body {
        TableBody::Skeleton(rows) | TableBody::Rows(rows) => (rows, None),
        TableBody::Empty(msg) => (Vec::new(), Some(msg)),
    };

    element! {
        View(flex_direction: FlexDirection::Column, width: table.total_width) {
            #(table.header_cells.map(|cells| {
                element! {
                    View(
                        border_style: BorderStyle::Single,
                        border_edges: Edges::Bottom,
                        border_color: table.border_fg,
                    ) {
                        #(cells.into_iter().enumerate().map(|(i, hc)| {
                            element! {
                                View(key: i, width: hc.width) {
                                    Text(
                                        content: hc.text,
                                        weight: Weight::Bold,
                                        color: table.header_fg,
                                        wrap: TextWrap::NoWrap,
                                        align: hc.align,
                                    )
                                }
                            }
                        }))
                    }
                }
            }))

            #(empty.map(|msg| {
                element! {
                    View(padding_top: 1, padding_left: 2) {
                        Text(content: msg, color: table.faint_fg)
                    }
                }
            }))
            #(rows.into_iter().map(row_element))

            #(table.error_line.map(|line| {
                element! {
                    View(padding_top: 1, padding_left: 2) {
                        Text(content: line, color: table.error_fg, wrap: TextWrap::NoWrap)
                    }
                }
            }))
        }
    }
    .into_any()
}

// ---------------------------------------------------------------------------
// Column width computation
// ---------------------------------------------------------------------------

fn compute_column_widths(columns: &[&Column], total: u16) -> Vec<u16> {
    let fixed_total: u16 = columns.iter().filter_map(|c| c.fixed_width).sum();
    let remaining = total.saturating_sub(fixed_total);

    let unfixed_pct_sum: f32 = columns
        .iter()
        .filter(|c| c.fixed_width.is_none())
        .map(|c| c.default_width_pct)
        .sum();

    columns
        .iter()
        .map(|col| {
            if let Some(w) = col.fixed_width {
                return w;
            }
            let ratio = if unfixed_pct_sum > 0.0 {
                col.default_width_pct / unfixed_pct_sum
            } else {
                #[allow(clippy::cast_precision_loss)]
                {
                    1.0 / columns.len() as f32
                }
            };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let w = (f32::from(remaining) * ratio).round() as u16;
            w.max(1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FetchError;

    fn make_columns() -> Vec<Column> {
        vec![
            Column::new("id", "Deployment", 0.30),
            Column::new("status", "Status", 0.20),
            Column::new("service", "Service", 0.25),
            Column::new("created", "Created", 0.25).align(TextAlign::Right),
        ]
    }

    fn row(id: &str) -> Row {
        [("id".to_owned(), Cell::plain(id))].into_iter().collect()
    }

    fn build(status: &ListStatus, rows: &[Row], hidden: Option<&HashSet<String>>) -> RenderedTable {
        let columns = make_columns();
        let theme = ResolvedTheme::default();
        RenderedTable::build(&TableBuildConfig {
            columns: &columns,
            status,
            rows,
            cursor: 0,
            scroll_offset: 0,
            visible_rows: 20,
            hidden_columns: hidden,
            total_width: 100,
            theme: &theme,
            show_header: true,
            skeleton_rows: 5,
            empty_message: "No deployments yet",
        })
    }

    #[test]
    fn loading_renders_fixed_skeleton_count() {
        let table = build(&ListStatus::Loading, &[], None);
        assert!(matches!(table.body, TableBody::Skeleton(_)));
        assert_eq!(table.row_count(), 5);
        assert!(!table.actions_enabled);
    }

    #[test]
    fn ready_empty_shows_message_once() {
        let table = build(&ListStatus::Ready, &[], None);
        match table.body {
            TableBody::Empty(msg) => assert_eq!(msg, "No deployments yet"),
            _ => panic!("expected empty body"),
        }
        assert!(table.error_line.is_none());
        assert!(table.actions_enabled);
    }

    #[test]
    fn ready_rows_render_one_per_item() {
        let rows = vec![row("a"), row("b"), row("c")];
        let table = build(&ListStatus::Ready, &rows, None);
        assert!(matches!(table.body, TableBody::Rows(_)));
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn error_keeps_rows_and_adds_error_line() {
        let rows = vec![row("a")];
        let status = ListStatus::Error(FetchError::new("network down"));
        let table = build(&status, &rows, None);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.error_line.as_deref(), Some("Failed to load: network down"));
    }

    #[test]
    fn loading_with_retained_rows_still_renders_skeleton() {
        let rows: Vec<Row> = (0..12).map(|i| row(&format!("dep-{i}"))).collect();
        let table = build(&ListStatus::Loading, &rows, None);
        assert!(matches!(table.body, TableBody::Skeleton(_)));
        assert_eq!(table.row_count(), 5);
        assert!(!table.actions_enabled);
    }

    #[test]
    fn hidden_columns_are_excluded() {
        let hidden: HashSet<String> = ["service".to_owned()].into_iter().collect();
        let table = build(&ListStatus::Ready, &[row("a")], Some(&hidden));
        let headers: Vec<String> = table
            .header_cells
            .unwrap()
            .into_iter()
            .map(|h| h.text)
            .collect();
        assert_eq!(headers, vec!["Deployment", "Status", "Created"]);
    }

    #[test]
    fn column_widths_without_fixed() {
        let cols = make_columns();
        let col_refs: Vec<&Column> = cols.iter().collect();
        let widths = compute_column_widths(&col_refs, 100);

        let total: u16 = widths.iter().sum();
        assert!(
            (99..=101).contains(&total),
            "widths should sum close to 100, got {total}"
        );
        assert!(widths[0] > widths[1], "id should be wider than status");
    }

    #[test]
    fn column_widths_with_fixed() {
        let mut cols = make_columns();
        cols[1] = cols[1].clone().fixed(10);
        let col_refs: Vec<&Column> = cols.iter().collect();
        let widths = compute_column_widths(&col_refs, 100);

        assert_eq!(widths[1], 10);
        let rest: u16 = widths.iter().enumerate().filter(|(i, _)| *i != 1).map(|(_, w)| w).sum();
        assert_eq!(rest, 90);
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("deployment", 20), "deployment");
        assert_eq!(truncate_to_width("deployment", 5), "depl\u{2026}");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本\u{2026}");
    }
}
