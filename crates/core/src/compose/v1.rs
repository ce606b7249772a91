//! Current (version 1) manifest transpiler
//!
//! Emits one service per declared container, keyed `<appId>_<containerName>`
//! so names stay unique across apps that both call a container "web". All
//! structural checks run before anything is emitted; a manifest either
//! transpiles completely or not at all.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::compose::{ComposeConfig, ComposeService, Network, PLATFORM_NETWORK};
use crate::error::CoreError;
use crate::manifest::{CapabilityIndex, Container, V1Manifest};
use crate::Result;

/// Convert a v1 manifest into a compose document.
///
/// `node_root` anchors volume resolution: relative host paths land under
/// `<node_root>/app-data/<app_id>/`, absolute paths pass through unchanged.
/// Permission tags resolve through `capabilities` to read-only mounts of the
/// implementing app's data directory.
pub fn compose_from_v1(
    manifest: &V1Manifest,
    app_id: &str,
    node_root: &Path,
    capabilities: &CapabilityIndex,
) -> Result<ComposeConfig> {
    manifest.check_structure(app_id)?;

    let app_network = format!("{}_net", app_id);
    let edges = manifest.dependency_edges();

    let mut config = ComposeConfig::new();
    config.networks.insert(app_network.clone(), Network::default());

    for container in &manifest.containers {
        let service_name = format!("{}_{}", app_id, container.name);
        debug!("transpiling {} -> {}", container.name, service_name);

        let depends_on = edges[container.name.as_str()]
            .iter()
            .map(|sibling| format!("{}_{}", app_id, sibling))
            .collect();

        let mut service = ComposeService {
            image: container.image.clone(),
            ports: container
                .ports
                .iter()
                .map(|p| format!("{}:{}", p, p))
                .collect(),
            volumes: resolve_volumes(container, app_id, node_root, capabilities)?,
            environment: build_environment(container, app_id, node_root),
            depends_on,
            restart: Some(
                container
                    .restart
                    .clone()
                    .unwrap_or_else(|| "unless-stopped".to_string()),
            ),
            command: container.command.clone(),
            user: container.user.clone(),
            stop_signal: container.stop_signal.clone(),
            stop_grace_period: container.stop_grace_period.clone(),
            network_mode: container.network_mode.clone(),
            networks: Vec::new(),
        };

        // network_mode and networks are mutually exclusive in compose
        if service.network_mode.is_none() {
            service.networks.push(app_network.clone());
            if container.main {
                service.networks.push(PLATFORM_NETWORK.to_string());
                config
                    .networks
                    .insert(PLATFORM_NETWORK.to_string(), Network { external: true });
            }
        }

        config.services.insert(service_name, service);
    }

    Ok(config)
}

/// Platform-provided variables, injected over manifest-declared values
fn build_environment(
    container: &Container,
    app_id: &str,
    node_root: &Path,
) -> BTreeMap<String, String> {
    let mut environment = container.environment.clone();
    environment.insert("APP_ID".to_string(), app_id.to_string());
    environment.insert(
        "APP_DATA_DIR".to_string(),
        app_data_dir(node_root, app_id),
    );
    environment.insert("NODE_ROOT".to_string(), node_root.display().to_string());
    environment
}

fn resolve_volumes(
    container: &Container,
    app_id: &str,
    node_root: &Path,
    capabilities: &CapabilityIndex,
) -> Result<Vec<String>> {
    let mut volumes = Vec::new();

    for entry in &container.volumes {
        let Some((host, target)) = entry.split_once(':') else {
            return Err(CoreError::schema(
                app_id,
                format!("invalid volume entry '{}' (expected host:container)", entry),
            ));
        };
        if host.starts_with('/') {
            volumes.push(entry.clone());
        } else {
            volumes.push(format!("{}/{}:{}", app_data_dir(node_root, app_id), host, target));
        }
    }

    // Permission tags become read-only mounts of the implementing app's data
    for tag in &container.permissions {
        if CapabilityIndex::is_built_in(tag) {
            continue;
        }
        let provider = capabilities.provider(tag).ok_or_else(|| {
            CoreError::reference(
                app_id,
                format!(
                    "container '{}' requires permission '{}' which no app implements",
                    container.name, tag
                ),
            )
        })?;
        volumes.push(format!(
            "{}:/mnt/{}:ro",
            app_data_dir(node_root, provider),
            provider
        ));
    }

    Ok(volumes)
}

fn app_data_dir(node_root: &Path, app_id: &str) -> String {
    node_root.join("app-data").join(app_id).display().to_string()
}
