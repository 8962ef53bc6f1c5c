use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::types::AppConfig;

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$DEPLOY_BOARD_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/deploy-board/config.toml`
/// 4. `~/.config/deploy-board/config.toml`
///
/// With none of these present the built-in defaults are used.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    match explicit_path.map(Path::to_path_buf).or_else(find_config) {
        Some(path) => read_config(&path),
        None => Ok(AppConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML from {}", path.display()))?;
    tracing::debug!("config: loaded {}", path.display());
    Ok(config)
}

fn find_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("DEPLOY_BOARD_CONFIG") {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("deploy-board/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    let home = std::env::var("HOME").ok().map(PathBuf::from)?;
    let p = home.join(".config/deploy-board/config.toml");
    p.is_file().then_some(p)
}
