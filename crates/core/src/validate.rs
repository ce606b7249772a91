//! App directory validation
//!
//! Walks every subdirectory of the apps root, parses its `app.yml`, and
//! splits the set into structurally valid apps and per-app failures. One bad
//! manifest never aborts the run; it is logged, recorded, and skipped.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::manifest::AppManifest;
use crate::Result;

/// Manifest file name expected in each app directory
pub const MANIFEST_FILE: &str = "app.yml";

/// An app excluded during a fail-soft pass, with the reason
#[derive(Debug)]
pub struct AppFailure {
    pub id: String,
    pub error: CoreError,
}

/// Result of validating an apps directory
#[derive(Debug, Default)]
pub struct Validation {
    /// Ids of structurally valid apps, sorted
    pub valid: Vec<String>,
    /// Apps excluded from the run
    pub failures: Vec<AppFailure>,
}

/// Path to an app's manifest file
pub fn manifest_path(apps_dir: &Path, app_id: &str) -> PathBuf {
    apps_dir.join(app_id).join(MANIFEST_FILE)
}

/// Load and parse one app's manifest
pub fn load_manifest(apps_dir: &Path, app_id: &str) -> Result<AppManifest> {
    let path = manifest_path(apps_dir, app_id);
    let text = fs::read_to_string(&path).map_err(|e| CoreError::io(&path, e))?;
    AppManifest::parse(&text, app_id)
}

/// Validate every app under `apps_dir`.
///
/// Directories without a manifest file are silently skipped (not every
/// directory is an app). Candidate ids are the directory names, taken in
/// sorted order so results do not depend on filesystem listing order. Ids
/// must be unique case-insensitively; on a collision the first app
/// encountered is retained and later ones are excluded.
pub fn validate_apps(apps_dir: &Path) -> Result<Validation> {
    let mut candidates = Vec::new();
    let entries = fs::read_dir(apps_dir).map_err(|e| CoreError::io(apps_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::io(apps_dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            candidates.push(name);
        }
    }
    candidates.sort();

    let mut validation = Validation::default();
    let mut seen = Vec::new();

    for id in candidates {
        if !manifest_path(apps_dir, &id).is_file() {
            debug!("skipping '{}': no {}", id, MANIFEST_FILE);
            continue;
        }

        let normalized = id.to_lowercase();
        if seen.contains(&normalized) {
            let error = CoreError::conflict(&id, "app id collides with an already-accepted app");
            warn!("excluding app '{}': {}", id, error);
            validation.failures.push(AppFailure { id, error });
            continue;
        }

        match load_manifest(apps_dir, &id) {
            Ok(_) => {
                seen.push(normalized);
                validation.valid.push(id);
            }
            Err(error) => {
                warn!("excluding app '{}': {}", id, error);
                validation.failures.push(AppFailure { id, error });
            }
        }
    }

    validation.valid.sort();
    Ok(validation)
}
