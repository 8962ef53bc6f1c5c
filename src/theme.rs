use crate::color::Color;
use crate::components::cells::StatusCategory;
use crate::config::types::ThemeColors;

/// A fully resolved theme: every slot has a concrete colour, taken from the
/// user config when set and from the defaults otherwise.
#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_faint: Color,
    pub text_success: Color,
    pub text_error: Color,
    pub text_warning: Color,
    pub bg_selected: Color,
    pub border_faint: Color,
}

impl Default for ResolvedTheme {
    fn default() -> Self {
        Self::resolve(&ThemeColors::default())
    }
}

impl ResolvedTheme {
    pub fn resolve(colors: &ThemeColors) -> Self {
        Self {
            text_primary: colors.primary.unwrap_or(Color::Ansi256(7)),
            text_secondary: colors.secondary.unwrap_or(Color::Ansi256(245)),
            text_faint: colors.faint.unwrap_or(Color::Ansi256(240)),
            text_success: colors.success.unwrap_or(Color::Ansi256(2)),
            text_error: colors.error.unwrap_or(Color::Ansi256(1)),
            text_warning: colors.warning.unwrap_or(Color::Ansi256(3)),
            bg_selected: colors.selected.unwrap_or(Color::Ansi256(237)),
            border_faint: colors.border.unwrap_or(Color::Ansi256(238)),
        }
    }

    /// Badge colour for a status category.
    pub fn status_color(&self, category: StatusCategory) -> Color {
        match category {
            StatusCategory::Success => self.text_success,
            StatusCategory::Failure => self.text_error,
            StatusCategory::Pending => self.text_warning,
            StatusCategory::Neutral => self.text_faint,
        }
    }
}
