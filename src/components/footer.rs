use iocraft::prelude::*;

use crate::app::ViewKind;
use crate::theme::ResolvedTheme;

// ---------------------------------------------------------------------------
// Footer component — structured status bar
// ---------------------------------------------------------------------------

pub struct FooterView {
    pub label: &'static str,
    pub is_active: bool,
}

pub struct RenderedFooter {
    pub views: Vec<FooterView>,
    pub inactive_fg: Color,
    pub active_bg: Color,
    pub project_label: String,
    pub context_text: String,
    pub updated_text: String,
    pub key_hints: String,
    pub text_fg: Color,
    pub border_fg: Color,
}

impl RenderedFooter {
    pub fn build(
        active_view: ViewKind,
        project_label: String,
        context_text: String,
        updated_text: String,
        key_hints: &str,
        theme: &ResolvedTheme,
    ) -> Self {
        let views = ViewKind::ALL
            .iter()
            .map(|v| FooterView {
                label: v.label(),
                is_active: *v == active_view,
            })
            .collect();

        Self {
            views,
            inactive_fg: theme.text_faint.to_crossterm_color(),
            active_bg: theme.bg_selected.to_crossterm_color(),
            project_label,
            context_text,
            updated_text,
            key_hints: key_hints.to_owned(),
            text_fg: theme.text_faint.to_crossterm_color(),
            border_fg: theme.border_faint.to_crossterm_color(),
        }
    }
}

#[derive(Default, Props)]
pub struct FooterProps {
    pub footer: Option<RenderedFooter>,
}

#[component]
pub fn Footer(props: &mut FooterProps) -> impl Into<AnyElement<'static>> {
    let Some(f) = props.footer.take() else {
        return element! { View }.into_any();
    };

    let context_contents: Vec<MixedTextContent> = [&f.project_label, &f.context_text, &f.updated_text]
        .into_iter()
        .filter(|s| !s.is_empty())
        .enumerate()
        .flat_map(|(i, s)| {
            let sep = (i > 0).then(|| MixedTextContent::new("  \u{2022}  ").color(f.text_fg));
            sep.into_iter().chain(std::iter::once(MixedTextContent::new(s).color(f.text_fg)))
        })
        .collect();

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: f.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            #(f.views.iter().map(|v| {
                let (fg, bg, weight) = if v.is_active {
                    (Color::White, f.active_bg, Weight::Bold)
                } else {
                    (f.inactive_fg, Color::Reset, Weight::Normal)
                };
                element! {
                    View(background_color: bg) {
                        Text(content: format!(" {} ", v.label), color: fg, weight, wrap: TextWrap::NoWrap)
                    }
                }
            }))
            Text(content: " \u{2502} ", color: f.text_fg, wrap: TextWrap::NoWrap)
            View(flex_grow: 1.0) {
                MixedText(contents: context_contents, wrap: TextWrap::NoWrap)
            }
            Text(content: " \u{2502} ", color: f.text_fg, wrap: TextWrap::NoWrap)
            Text(content: f.key_hints.clone(), color: f.text_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}
