use iocraft::prelude::*;

use crate::notifier::NotificationPhase;
use crate::theme::ResolvedTheme;
use crate::toast::Toast;

pub struct RenderedToast {
    pub key: u64,
    pub icon: &'static str,
    pub icon_fg: Color,
    pub message: String,
}

/// Visible toasts, newest last.
pub struct RenderedToastStack {
    pub toasts: Vec<RenderedToast>,
    pub text_fg: Color,
    pub border_fg: Color,
}

impl RenderedToastStack {
    pub fn build(toasts: &[Toast], theme: &ResolvedTheme) -> Self {
        Self {
            toasts: toasts
                .iter()
                .map(|t| {
                    let (icon, color) = match t.phase {
                        NotificationPhase::Progress => ("\u{25cc}", theme.text_warning),
                        NotificationPhase::Success => ("\u{2714}", theme.text_success),
                        NotificationPhase::Failure => ("\u{2716}", theme.text_error),
                    };
                    RenderedToast {
                        key: t.id.0,
                        icon,
                        icon_fg: color.to_crossterm_color(),
                        message: t.message.clone(),
                    }
                })
                .collect(),
            text_fg: theme.text_primary.to_crossterm_color(),
            border_fg: theme.border_faint.to_crossterm_color(),
        }
    }
}

#[derive(Default, Props)]
pub struct ToastStackProps {
    pub stack: Option<RenderedToastStack>,
    pub width: u16,
    pub height: u16,
}

#[component]
pub fn ToastStack(props: &mut ToastStackProps) -> impl Into<AnyElement<'static>> {
    let Some(stack) = props.stack.take().filter(|s| !s.toasts.is_empty()) else {
        return element! { View }.into_any();
    };

    let width = u32::from(props.width);
    let height = u32::from(props.height);
    let toast_width = 40u32.min(width.saturating_sub(4));
    // Each toast is one line of text plus its border; keep clear of the footer.
    #[allow(clippy::cast_possible_truncation)]
    let stack_height = (stack.toasts.len() as u32 * 3).min(height.saturating_sub(4));
    let pad_left = width.saturating_sub(toast_width + 2);
    let pad_top = height.saturating_sub(stack_height + 3);

    element! {
        View(width, height, position: Position::Absolute) {
            View(
                margin_left: pad_left,
                margin_top: pad_top,
                width: toast_width,
                height: stack_height,
                flex_direction: FlexDirection::Column,
                overflow: Overflow::Hidden,
            ) {
                #(stack.toasts.into_iter().map(|t| {
                    element! {
                        View(
                            key: t.key,
                            border_style: BorderStyle::Round,
                            border_color: stack.border_fg,
                            background_color: Color::Reset,
                            padding_left: 1,
                            padding_right: 1,
                        ) {
                            Text(content: format!("{} ", t.icon), color: t.icon_fg, wrap: TextWrap::NoWrap)
                            Text(content: t.message, color: stack.text_fg, wrap: TextWrap::NoWrap)
                        }
                    }
                }))
            }
        }
    }
    .into_any()
}
