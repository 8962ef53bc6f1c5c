use iocraft::prelude::*;

use crate::theme::ResolvedTheme;
use crate::util::TimestampDetail;

// ---------------------------------------------------------------------------
// y/n confirmation
// ---------------------------------------------------------------------------

pub struct RenderedConfirm {
    pub prompt: String,
    pub text_fg: Color,
    pub border_fg: Color,
}

impl RenderedConfirm {
    pub fn build(prompt: String, theme: &ResolvedTheme) -> Self {
        Self {
            prompt,
            text_fg: theme.text_primary.to_crossterm_color(),
            border_fg: theme.text_warning.to_crossterm_color(),
        }
    }
}

#[derive(Default, Props)]
pub struct ConfirmPromptProps {
    pub confirm: Option<RenderedConfirm>,
}

#[component]
pub fn ConfirmPrompt(props: &mut ConfirmPromptProps) -> impl Into<AnyElement<'static>> {
    let Some(c) = props.confirm.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: c.border_fg,
            padding_left: 1,
        ) {
            Text(content: format!("{} (y/n)", c.prompt), color: c.text_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}

// ---------------------------------------------------------------------------
// Timestamp detail
// ---------------------------------------------------------------------------

pub struct RenderedTimestampPanel {
    pub detail: TimestampDetail,
    pub label_fg: Color,
    pub text_fg: Color,
    pub border_fg: Color,
}

impl RenderedTimestampPanel {
    pub fn build(detail: TimestampDetail, theme: &ResolvedTheme) -> Self {
        Self {
            detail,
            label_fg: theme.text_faint.to_crossterm_color(),
            text_fg: theme.text_primary.to_crossterm_color(),
            border_fg: theme.border_faint.to_crossterm_color(),
        }
    }
}

#[derive(Default, Props)]
pub struct TimestampPanelProps {
    pub panel: Option<RenderedTimestampPanel>,
    pub width: u16,
    pub height: u16,
}

#[component]
pub fn TimestampPanel(props: &mut TimestampPanelProps) -> impl Into<AnyElement<'static>> {
    let Some(p) = props.panel.take() else {
        return element! { View }.into_any();
    };
    let d = p.detail;

    let width = u32::from(props.width);
    let height = u32::from(props.height);
    let panel_width = 44u32.min(width.saturating_sub(4));
    let pad_left = width.saturating_sub(panel_width + 2);

    element! {
        View(width, height, position: Position::Absolute) {
            View(
                margin_left: pad_left,
                margin_top: 2,
                width: panel_width,
                height: 7,
                flex_direction: FlexDirection::Column,
                border_style: BorderStyle::Round,
                border_color: p.border_fg,
                background_color: Color::Reset,
                padding_left: 1,
                padding_right: 1,
            ) {
                View(margin_bottom: 1) {
                    Text(content: capitalize(&d.relative), color: p.text_fg, wrap: TextWrap::NoWrap)
                }
                View {
                    Text(content: format!("{:<9}", "UTC"), color: p.label_fg, wrap: TextWrap::NoWrap)
                    Text(content: d.utc, color: p.text_fg, wrap: TextWrap::NoWrap)
                }
                View {
                    Text(content: format!("{:<9}", d.local_label), color: p.label_fg, wrap: TextWrap::NoWrap)
                    Text(content: d.local, color: p.text_fg, wrap: TextWrap::NoWrap)
                }
            }
        }
    }
    .into_any()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
