use iocraft::prelude::*;

use crate::dispatch::ActionKind;
use crate::theme::ResolvedTheme;

/// One choice in a row's action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Dispatch a remote action on the row's entity.
    Remote(ActionKind),
    /// Open the deployment's public URL in the browser.
    OpenDeployment,
    /// Show relative, UTC and local timestamps for the row.
    ShowTimestamps,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Remote(kind) => kind.label(),
            Self::OpenDeployment => "View deployment",
            Self::ShowTimestamps => "Show timestamps",
        }
    }

    /// Destructive actions go through a y/n prompt first.
    pub fn needs_confirmation(self) -> bool {
        matches!(self, Self::Remote(ActionKind::Delete))
    }
}

pub struct RenderedActionMenu {
    pub title: String,
    pub items: Vec<(String, bool)>,
    pub text_fg: Color,
    pub selected_bg: Color,
    pub border_fg: Color,
    pub title_fg: Color,
}

impl RenderedActionMenu {
    pub fn build(title: &str, actions: &[MenuAction], cursor: usize, theme: &ResolvedTheme) -> Self {
        Self {
            title: title.to_owned(),
            items: actions
                .iter()
                .enumerate()
                .map(|(i, a)| (a.label().to_owned(), i == cursor))
                .collect(),
            text_fg: theme.text_primary.to_crossterm_color(),
            selected_bg: theme.bg_selected.to_crossterm_color(),
            border_fg: theme.border_faint.to_crossterm_color(),
            title_fg: theme.text_secondary.to_crossterm_color(),
        }
    }
}

#[derive(Default, Props)]
pub struct ActionMenuProps {
    pub menu: Option<RenderedActionMenu>,
    pub width: u16,
    pub height: u16,
}

#[component]
pub fn ActionMenu(props: &mut ActionMenuProps) -> impl Into<AnyElement<'static>> {
    let Some(menu) = props.menu.take() else {
        return element! { View }.into_any();
    };

    let width = u32::from(props.width);
    let height = u32::from(props.height);
    let menu_width = 28u32.min(width.saturating_sub(4));
    #[allow(clippy::cast_possible_truncation)]
    let menu_height = (menu.items.len() as u32 + 3).min(height.saturating_sub(2));
    let pad_left = width.saturating_sub(menu_width + 2);

    element! {
        View(width, height, position: Position::Absolute) {
            View(
                margin_left: pad_left,
                margin_top: 2,
                width: menu_width,
                height: menu_height,
                flex_direction: FlexDirection::Column,
                border_style: BorderStyle::Round,
                border_color: menu.border_fg,
                background_color: Color::Reset,
                padding_left: 1,
                padding_right: 1,
                overflow: Overflow::Hidden,
            ) {
                Text(content: menu.title, color: menu.title_fg, wrap: TextWrap::NoWrap)
                #(menu.items.into_iter().enumerate().map(|(i, (label, selected))| {
                    let bg = if selected { Some(menu.selected_bg) } else { None };
                    element! {
                        View(key: i, background_color: bg) {
                            Text(content: format!(" {label} "), color: menu.text_fg, wrap: TextWrap::NoWrap)
                        }
                    }
                }))
            }
        }
    }
    .into_any()
}
