use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail, ensure};

/// Open a URL in the default browser.
pub(crate) fn open_in_browser(url: &str) -> Result<()> {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "linux") {
        "xdg-open"
    } else {
        bail!("opening a browser is not supported on this platform");
    };

    let status = Command::new(program)
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("running {program}"))?;
    ensure!(status.success(), "{program} exited with {status}");
    tracing::debug!("browser: opened {url}");
    Ok(())
}
