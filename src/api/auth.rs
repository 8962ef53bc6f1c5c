use anyhow::{Result, bail};

/// Environment variable consulted when the config does not name one.
pub const DEFAULT_TOKEN_ENV: &str = "DEPLOY_BOARD_TOKEN";

/// Resolve the API bearer token.
///
/// Priority:
/// 1. the variable named by `token_env` (config `api.token_env`)
/// 2. `DEPLOY_BOARD_TOKEN`
///
/// Session handling lives outside the dashboard; this only forwards a token
/// obtained elsewhere.
pub fn resolve_token(token_env: Option<&str>) -> Result<String> {
    let candidates = token_env
        .into_iter()
        .chain(std::iter::once(DEFAULT_TOKEN_ENV));
    for var in candidates {
        if let Ok(token) = std::env::var(var)
            && !token.is_empty()
        {
            return Ok(token);
        }
    }
    bail!(
        "no API token found. Set {} (or the variable named by api.token_env).",
        token_env.unwrap_or(DEFAULT_TOKEN_ENV)
    )
}
