//! Pass-through `docker compose` invocation

use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::paths::NodePaths;

pub fn cmd_compose(paths: &NodePaths, app: &str, args: &[String]) -> Result<()> {
    run_compose(paths, app, args)
}

/// Run `docker compose` in the app's directory with the node env file.
/// The compose file must already exist; this never generates one.
pub fn run_compose(paths: &NodePaths, app: &str, args: &[String]) -> Result<()> {
    let compose_file = paths.compose_file(app);
    if !compose_file.is_file() {
        bail!(
            "could not find {} for app '{}'",
            berth_core::COMPOSE_FILE,
            app
        );
    }

    let status = Command::new("docker")
        .arg("compose")
        .arg("--env-file")
        .arg(paths.env_file())
        .args(args)
        .current_dir(paths.app_dir(app))
        .status()
        .with_context(|| format!("failed to invoke docker compose for '{}'", app))?;

    if !status.success() {
        bail!("docker compose exited with {} for app '{}'", status, app);
    }
    Ok(())
}
