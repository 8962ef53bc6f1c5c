use chrono::{DateTime, Duration, Utc};

use crate::components::table::Cell;
use crate::theme::ResolvedTheme;
use crate::types::DeploymentStatus;
use crate::util::format_time_cell;

/// Badge family of a deployment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Success,
    Failure,
    Pending,
    Neutral,
}

impl StatusCategory {
    pub fn of(status: DeploymentStatus) -> Self {
        use DeploymentStatus as S;
        match status {
            S::Success => Self::Success,
            S::Failed | S::Crashed => Self::Failure,
            S::Building
            | S::Deploying
            | S::Initializing
            | S::NeedsApproval
            | S::Queued
            | S::Removing
            | S::Sleeping
            | S::Waiting => Self::Pending,
            S::Removed | S::Skipped | S::Unknown => Self::Neutral,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "\u{2714}",
            Self::Failure => "\u{2716}",
            Self::Pending => "\u{25cf}",
            Self::Neutral => "\u{25cb}",
        }
    }
}

/// Status badge: icon plus lower-case label in the category colour.
pub fn status_cell(status: DeploymentStatus, theme: &ResolvedTheme) -> Cell {
    let category = StatusCategory::of(status);
    Cell::colored(
        format!("{} {}", category.icon(), status.label()),
        theme.status_color(category),
    )
}

/// Placeholder for an entity with no deployment yet.
pub fn no_status_cell(theme: &ResolvedTheme) -> Cell {
    Cell::colored("-", theme.text_faint)
}

pub fn time_cell(
    dt: &DateTime<Utc>,
    now: DateTime<Utc>,
    threshold: Duration,
    theme: &ResolvedTheme,
) -> Cell {
    Cell::colored(format_time_cell(dt, now, threshold), theme.text_secondary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_status_families() {
        assert_eq!(StatusCategory::of(DeploymentStatus::Success), StatusCategory::Success);
        assert_eq!(StatusCategory::of(DeploymentStatus::Failed), StatusCategory::Failure);
        assert_eq!(StatusCategory::of(DeploymentStatus::Crashed), StatusCategory::Failure);
        assert_eq!(StatusCategory::of(DeploymentStatus::Removed), StatusCategory::Neutral);
        assert_eq!(StatusCategory::of(DeploymentStatus::Skipped), StatusCategory::Neutral);
        assert_eq!(StatusCategory::of(DeploymentStatus::Building), StatusCategory::Pending);
        assert_eq!(StatusCategory::of(DeploymentStatus::Unknown), StatusCategory::Neutral);
    }

    #[test]
    fn status_cell_uses_category_color() {
        let theme = ResolvedTheme::default();
        let cell = status_cell(DeploymentStatus::Crashed, &theme);
        assert_eq!(cell.color, Some(theme.text_error));
        assert!(cell.text.ends_with("Crashed"));
    }
}
