use serde::Deserialize;

use crate::color::Color;
use crate::store::LoadingPolicy;

// ---------------------------------------------------------------------------
// Custom Color deserialization
// ---------------------------------------------------------------------------

/// Deserialize an `Option<Color>` from a TOML string value.
pub(crate) mod color_de {
    use serde::{self, Deserialize, Deserializer};

    use crate::color::Color;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) => Color::parse(&s, "<theme>")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub defaults: Defaults,
    pub theme: Theme,
}

// ---------------------------------------------------------------------------
// API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    /// Project whose services and deployments are listed.
    pub project_id: Option<String>,
    /// Environment variable holding the bearer token.
    pub token_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://backboard.railway.app/graphql/v2".to_owned(),
            project_id: None,
            token_env: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Services,
    Deployments,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub view: View,
    /// Placeholder rows drawn while a list is loading.
    pub skeleton_rows: usize,
    /// Lifetime of success and failure toasts.
    pub toast_ttl_secs: u64,
    pub loading_policy: LoadingPolicy,
    pub refetch_interval_minutes: u32,
    /// Timestamps younger than this render as relative time.
    pub relative_threshold_hours: u32,
    pub empty_text: EmptyText,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            view: View::Services,
            skeleton_rows: 5,
            toast_ttl_secs: 4,
            loading_policy: LoadingPolicy::default(),
            refetch_interval_minutes: 5,
            relative_threshold_hours: 24,
            empty_text: EmptyText::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmptyText {
    pub services: String,
    pub deployments: String,
}

impl Default for EmptyText {
    fn default() -> Self {
        Self {
            services: "No services yet".to_owned(),
            deployments: "No deployments".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub colors: ThemeColors,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    #[serde(deserialize_with = "color_de::deserialize")]
    pub primary: Option<Color>,
    #[serde(deserialize_with = "color_de::deserialize")]
    pub secondary: Option<Color>,
    #[serde(deserialize_with = "color_de::deserialize")]
    pub faint: Option<Color>,
    #[serde(deserialize_with = "color_de::deserialize")]
    pub success: Option<Color>,
    #[serde(deserialize_with = "color_de::deserialize")]
    pub error: Option<Color>,
    #[serde(deserialize_with = "color_de::deserialize")]
    pub warning: Option<Color>,
    #[serde(deserialize_with = "color_de::deserialize")]
    pub selected: Option<Color>,
    #[serde(deserialize_with = "color_de::deserialize")]
    pub border: Option<Color>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.defaults.skeleton_rows, 5);
        assert_eq!(config.defaults.loading_policy, LoadingPolicy::Clear);
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.theme.colors.primary.is_none());
    }

    #[test]
    fn theme_colors_accept_hex_and_ansi() {
        let config: AppConfig = toml::from_str(
            r##"
            [theme.colors]
            primary = "#c0caf5"
            faint = "240"
            "##,
        )
        .unwrap();
        assert_eq!(
            config.theme.colors.primary,
            Some(Color::Hex { r: 0xc0, g: 0xca, b: 0xf5 })
        );
        assert_eq!(config.theme.colors.faint, Some(Color::Ansi256(240)));
    }

    #[test]
    fn bad_color_is_an_error() {
        let result: Result<AppConfig, _> = toml::from_str("[theme.colors]\nerror = \"crimson\"\n");
        assert!(result.is_err());
    }
}
