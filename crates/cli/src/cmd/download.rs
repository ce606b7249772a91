//! Best-effort manifest download from the remote catalog mirror
//!
//! A failed download is a warning, never an error: the node keeps working
//! with whatever manifests it already has.

use std::fs;

use anyhow::{Context, Result};
use console::{style, Term};
use tracing::debug;

use berth_core::validate_apps;

use crate::paths::NodePaths;

/// Remote catalog mirror serving raw app manifests
const CATALOG_MIRROR: &str = "https://raw.githubusercontent.com/berthd/catalog/main/apps";

pub fn cmd_download(paths: &NodePaths, app: Option<&str>) -> Result<()> {
    let term = Term::stderr();

    let apps = match app {
        Some(app) => vec![app.to_string()],
        None => validate_apps(&paths.apps_dir())?.valid,
    };

    for app in &apps {
        match fetch_manifest(app) {
            Some(text) => {
                let path = paths.manifest_file(app);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                fs::write(&path, text)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                debug!("downloaded manifest for {}", app);
            }
            None => {
                term.write_line(&format!(
                    "{} Could not download {}",
                    style("warning:").yellow().bold(),
                    app
                ))?;
            }
        }
    }

    Ok(())
}

/// Fetch one manifest; None on any HTTP failure
fn fetch_manifest(app: &str) -> Option<String> {
    let url = format!("{}/{}/app.yml", CATALOG_MIRROR, app);
    let response = reqwest::blocking::get(&url).ok()?;
    if response.status().is_success() {
        response.text().ok()
    } else {
        None
    }
}
