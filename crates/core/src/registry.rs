//! Registry aggregation
//!
//! Builds two derived catalogs from the validated app set: the full registry
//! (`registry.json`, everything the store UI needs) and the simple registry
//! (`apps.json`, just enough for update checks). Both are sorted by app id
//! and rendered with stable 4-space indentation so reruns over an unchanged
//! catalog are byte-identical.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::compose::{compose_from_v0, compose_from_v1};
use crate::manifest::{AppManifest, CapabilityIndex, Metadata};
use crate::validate::{load_manifest, AppFailure};
use crate::Result;

/// Full registry entry: manifest metadata plus resolved runtime facts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub metadata: Metadata,
    /// Host ports the app publishes
    pub ports: Vec<u16>,
    /// Whether every dependency and permission resolves within the catalog
    pub installable: bool,
}

/// Simple registry entry, used for update checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleEntry {
    pub id: String,
    pub name: String,
    pub version: String,
    pub hidden: bool,
}

/// Result of one aggregation pass
#[derive(Debug, Default)]
pub struct RegistryBuild {
    pub full: Vec<RegistryEntry>,
    pub simple: Vec<SimpleEntry>,
    /// Apps that failed metadata extraction, excluded from both catalogs
    pub failures: Vec<AppFailure>,
}

/// Aggregate the validated app set into both registries.
///
/// Each app's manifest is re-run through the matching transpiler to extract
/// its resolved port list; the compose document itself is discarded here (the
/// update workflow writes the real one separately). An app that fails
/// extraction is excluded from both catalogs without aborting the pass.
pub fn build_registry(apps: &[String], apps_dir: &Path, node_root: &Path) -> Result<RegistryBuild> {
    let mut manifests = Vec::new();
    let mut build = RegistryBuild::default();

    for id in apps {
        match load_manifest(apps_dir, id) {
            Ok(manifest) => manifests.push((id.clone(), manifest)),
            Err(error) => {
                warn!("excluding app '{}' from registry: {}", id, error);
                build.failures.push(AppFailure {
                    id: id.clone(),
                    error,
                });
            }
        }
    }

    let capabilities = CapabilityIndex::from_manifests(
        manifests.iter().map(|(id, m)| (id.as_str(), m.metadata())),
    );

    for (id, manifest) in &manifests {
        let compose = match manifest {
            AppManifest::V0(m) => compose_from_v0(m, id),
            AppManifest::V1(m) => compose_from_v1(m, id, node_root, &capabilities),
        };
        let compose = match compose {
            Ok(c) => c,
            Err(error) => {
                warn!("excluding app '{}' from registry: {}", id, error);
                build.failures.push(AppFailure {
                    id: id.clone(),
                    error,
                });
                continue;
            }
        };

        let metadata = manifest.metadata();
        let installable = metadata
            .dependencies
            .iter()
            .all(|dep| manifests.iter().any(|(other, _)| other == dep))
            && metadata.permissions.iter().all(|tag| capabilities.resolves(tag));

        build.full.push(RegistryEntry {
            id: id.clone(),
            name: manifest.name().to_string(),
            metadata: metadata.clone(),
            ports: compose.published_ports(),
            installable,
        });
        build.simple.push(SimpleEntry {
            id: id.clone(),
            name: manifest.name().to_string(),
            version: metadata.version.clone(),
            hidden: !metadata.compatible,
        });
    }

    build.full.sort_by(|a, b| a.id.cmp(&b.id));
    build.simple.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(build)
}

/// Render entries as a JSON document with 4-space indentation and sorted
/// object keys, for diffable registry files
pub fn to_registry_json<T: Serialize>(entries: &[T]) -> Result<String> {
    // Round-tripping through Value sorts object keys (serde_json's map is
    // ordered by key)
    let value = serde_json::to_value(entries)?;
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    let mut text = String::from_utf8(out).expect("serde_json emits UTF-8");
    text.push('\n');
    Ok(text)
}
