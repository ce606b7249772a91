//! The update workflow
//!
//! One pass over the catalog: validate every app, write both registry
//! documents, then generate one `docker-compose.yml` per valid app. Registry
//! documents are rendered fully in memory before either file is overwritten,
//! and compose files are written atomically per app, so a failing app can
//! never corrupt a previously-good artifact.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compose::{compose_from_v0, compose_from_v1};
use crate::error::CoreError;
use crate::manifest::{AppManifest, CapabilityIndex};
use crate::registry::{build_registry, to_registry_json};
use crate::validate::{load_manifest, validate_apps, AppFailure};
use crate::Result;

/// File name of the full registry document
pub const REGISTRY_FILE: &str = "registry.json";
/// File name of the simple (version-listing) registry document
pub const SIMPLE_REGISTRY_FILE: &str = "apps.json";
/// File name of the per-app compose artifact
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// The apps directory under a node root
pub fn apps_dir(node_root: &Path) -> PathBuf {
    node_root.join("apps")
}

/// Outcome of one update pass
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Structurally valid apps found in the catalog
    pub valid: Vec<String>,
    /// Apps whose compose file was (re)written
    pub written: Vec<String>,
    /// Every app excluded along the way, with the reason
    pub failures: Vec<AppFailure>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the full update pass over `node_root`.
///
/// Writes `registry.json` and `apps.json` into the apps directory, then a
/// fresh `docker-compose.yml` into each valid app's directory (fully
/// overwriting the previous one). Per-app failures are collected in the
/// report, never propagated as an early abort.
pub fn update_catalog(node_root: &Path) -> Result<UpdateReport> {
    let apps_dir = apps_dir(node_root);
    let validation = validate_apps(&apps_dir)?;

    let mut report = UpdateReport {
        valid: validation.valid,
        failures: validation.failures,
        ..Default::default()
    };

    let build = build_registry(&report.valid, &apps_dir, node_root)?;

    // Render both documents before touching either file
    let full_json = to_registry_json(&build.full)?;
    let simple_json = to_registry_json(&build.simple)?;

    let registry_path = apps_dir.join(REGISTRY_FILE);
    fs::write(&registry_path, full_json).map_err(|e| CoreError::io(&registry_path, e))?;
    info!("wrote registry to {}", registry_path.display());

    let simple_path = apps_dir.join(SIMPLE_REGISTRY_FILE);
    fs::write(&simple_path, simple_json).map_err(|e| CoreError::io(&simple_path, e))?;
    info!("wrote version information to {}", simple_path.display());

    let excluded: BTreeSet<String> = build.failures.iter().map(|f| f.id.clone()).collect();
    report.failures.extend(build.failures);

    // Registry aggregation already proved these manifests transpile; reload
    // them for the actual compose emission. A manifest that becomes
    // unreadable between the two passes is reported, not dropped.
    let manifests = reload_for_emission(&apps_dir, &report.valid, &excluded, &mut report.failures);

    let capabilities = CapabilityIndex::from_manifests(
        manifests.iter().map(|(id, m)| (id.as_str(), m.metadata())),
    );

    for (id, manifest) in &manifests {
        let compose = match manifest {
            AppManifest::V0(m) => compose_from_v0(m, id),
            AppManifest::V1(m) => compose_from_v1(m, id, node_root, &capabilities),
        };

        let result = compose.and_then(|config| {
            let path = apps_dir.join(id).join(COMPOSE_FILE);
            config.write_atomic(&path)?;
            debug!("wrote {} to {}", id, path.display());
            Ok(())
        });

        match result {
            Ok(()) => report.written.push(id.clone()),
            Err(error) => report.failures.push(AppFailure {
                id: id.clone(),
                error,
            }),
        }
    }

    Ok(report)
}

fn reload_for_emission(
    apps_dir: &Path,
    valid: &[String],
    excluded: &BTreeSet<String>,
    failures: &mut Vec<AppFailure>,
) -> Vec<(String, AppManifest)> {
    let mut manifests = Vec::new();
    for id in valid {
        if excluded.contains(id.as_str()) {
            continue;
        }
        match load_manifest(apps_dir, id) {
            Ok(manifest) => manifests.push((id.clone(), manifest)),
            Err(error) => failures.push(AppFailure {
                id: id.clone(),
                error,
            }),
        }
    }
    manifests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ComposeConfig;
    use tempfile::TempDir;

    fn write_app(node_root: &Path, id: &str, yaml: &str) {
        let dir = node_root.join("apps").join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.yml"), yaml).unwrap();
    }

    fn node() -> TempDir {
        let root = TempDir::new().unwrap();
        write_app(
            root.path(),
            "legacy",
            r#"
name: legacy
image: legacy:latest
port: 8080
metadata:
  title: Legacy
  version: "1.0.0"
"#,
        );
        write_app(
            root.path(),
            "modern",
            r#"
version: 1
name: modern
containers:
  - name: web
    image: modern:latest
    ports: [3000]
    main: true
metadata:
  title: Modern
  version: "2.0.0"
"#,
        );
        root
    }

    #[test]
    fn test_update_writes_all_artifacts() {
        let root = node();
        let report = update_catalog(root.path()).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.valid, vec!["legacy", "modern"]);
        assert_eq!(report.written, vec!["legacy", "modern"]);

        let apps = apps_dir(root.path());
        assert!(apps.join(REGISTRY_FILE).is_file());
        assert!(apps.join(SIMPLE_REGISTRY_FILE).is_file());

        let legacy =
            ComposeConfig::from_yaml(&fs::read_to_string(apps.join("legacy").join(COMPOSE_FILE)).unwrap())
                .unwrap();
        assert!(legacy.services.get("legacy").is_some());

        let modern =
            ComposeConfig::from_yaml(&fs::read_to_string(apps.join("modern").join(COMPOSE_FILE)).unwrap())
                .unwrap();
        assert!(modern.services.get("modern_web").is_some());
    }

    #[test]
    fn test_update_is_idempotent() {
        let root = node();
        update_catalog(root.path()).unwrap();

        let apps = apps_dir(root.path());
        let registry_first = fs::read(apps.join(REGISTRY_FILE)).unwrap();
        let simple_first = fs::read(apps.join(SIMPLE_REGISTRY_FILE)).unwrap();

        update_catalog(root.path()).unwrap();
        assert_eq!(fs::read(apps.join(REGISTRY_FILE)).unwrap(), registry_first);
        assert_eq!(
            fs::read(apps.join(SIMPLE_REGISTRY_FILE)).unwrap(),
            simple_first
        );
    }

    #[test]
    fn test_failing_app_produces_no_partial_artifact() {
        let root = node();
        write_app(
            root.path(),
            "broken",
            r#"
version: 1
name: broken
containers:
  - name: web
    image: x
    permissions: [unheard-of]
metadata:
  title: Broken
  version: "1.0.0"
"#,
        );

        let report = update_catalog(root.path()).unwrap();
        assert_eq!(report.written, vec!["legacy", "modern"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "broken");

        let apps = apps_dir(root.path());
        assert!(!apps.join("broken").join(COMPOSE_FILE).exists());
        // The good apps still got their artifacts
        assert!(apps.join("legacy").join(COMPOSE_FILE).exists());
    }

    #[test]
    fn test_unreadable_manifest_at_emission_is_reported() {
        let root = node();
        let apps = apps_dir(root.path());
        let ids = vec!["legacy".to_string(), "phantom".to_string()];

        let mut failures = Vec::new();
        let manifests = reload_for_emission(&apps, &ids, &BTreeSet::new(), &mut failures);

        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].0, "legacy");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "phantom");
        assert!(matches!(failures[0].error, CoreError::Io { .. }));
    }
}
