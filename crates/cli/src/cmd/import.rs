//! One-time migration of a hand-written compose file back into an app.yml

use std::fs;

use anyhow::{Context, Result};
use console::{style, Term};

use berth_core::{manifest_from_compose, manifest_to_yaml, ComposeConfig, RegistryEntry};

use crate::paths::NodePaths;

pub fn cmd_import(paths: &NodePaths, app: &str) -> Result<()> {
    let compose_path = paths.compose_file(app);
    let compose_text = fs::read_to_string(&compose_path)
        .with_context(|| format!("failed to read {}", compose_path.display()))?;
    let compose = ComposeConfig::from_yaml(&compose_text)?;

    let registry_path = paths.registry_file();
    let registry_text = fs::read_to_string(&registry_path)
        .with_context(|| format!("failed to read {}", registry_path.display()))?;
    let registry: Vec<RegistryEntry> = serde_json::from_str(&registry_text)?;

    let manifest = manifest_from_compose(&compose, app, &registry)?;
    let manifest_path = paths.manifest_file(app);
    fs::write(&manifest_path, manifest_to_yaml(&manifest)?)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    let term = Term::stderr();
    term.write_line(&format!(
        "{} Wrote {}",
        style("::").green().bold(),
        manifest_path.display()
    ))?;
    Ok(())
}
