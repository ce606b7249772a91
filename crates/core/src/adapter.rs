//! Compose -> manifest reverse transform
//!
//! One-time migration aid for apps that still carry a hand-written
//! `docker-compose.yml`: reconstructs a v1-shaped manifest from the compose
//! services matching the app's naming convention plus the app's registry
//! entry. Deliberately lossy, see [`manifest_from_compose`].

use std::collections::BTreeMap;

use crate::compose::{ComposeConfig, ComposeService, PLATFORM_NETWORK};
use crate::error::CoreError;
use crate::manifest::{Container, V1Manifest};
use crate::registry::RegistryEntry;
use crate::Result;

/// Environment keys the v1 transpiler injects; stripped on the way back
const PLATFORM_ENV: &[&str] = &["APP_ID", "APP_DATA_DIR", "NODE_ROOT"];

/// Reconstruct a v1 manifest from a compose document and a registry snapshot.
///
/// Services named `<appId>_<name>` become containers named `<name>`; a legacy
/// service named exactly `<appId>` becomes a container named `main`. Metadata
/// comes from the registry snapshot, since compose carries none of it.
///
/// Known-lossy fields:
/// - permission tags: their read-only `/mnt/...` mounts are dropped, the
///   tags themselves cannot be recovered from compose
/// - the platform-network flag is recovered heuristically from network
///   membership
/// - `requires`/`required_by` collapse into plain `depends_on` edges
/// - host paths under the app's data directory fold back to relative form
///   only when the service carries the injected `APP_DATA_DIR` variable
pub fn manifest_from_compose(
    compose: &ComposeConfig,
    app_id: &str,
    registry: &[RegistryEntry],
) -> Result<V1Manifest> {
    let entry = registry
        .iter()
        .find(|e| e.id == app_id)
        .ok_or_else(|| {
            CoreError::reference(app_id, "app is not present in the registry snapshot")
        })?;

    let prefix = format!("{}_", app_id);
    let mut containers = Vec::new();

    for (service_name, service) in compose.services.iter() {
        let name = if let Some(stripped) = service_name.strip_prefix(&prefix) {
            stripped.to_string()
        } else if service_name == app_id {
            "main".to_string()
        } else {
            continue;
        };
        containers.push(container_from_service(&name, service, &prefix));
    }

    if containers.is_empty() {
        return Err(CoreError::schema(
            app_id,
            "compose document contains no services matching the app",
        ));
    }

    Ok(V1Manifest {
        name: entry.name.clone(),
        metadata: entry.metadata.clone(),
        containers,
    })
}

/// Render a reconstructed manifest as a version-tagged `app.yml` document
pub fn manifest_to_yaml(manifest: &V1Manifest) -> Result<String> {
    let mut doc = serde_yaml::Mapping::new();
    doc.insert(
        serde_yaml::Value::String("version".to_string()),
        serde_yaml::Value::Number(1.into()),
    );
    if let serde_yaml::Value::Mapping(fields) = serde_yaml::to_value(manifest)? {
        doc.extend(fields);
    }
    Ok(serde_yaml::to_string(&serde_yaml::Value::Mapping(doc))?)
}

fn container_from_service(name: &str, service: &ComposeService, prefix: &str) -> Container {
    let ports = service
        .ports
        .iter()
        .filter_map(|entry| entry.split(':').next()?.parse().ok())
        .collect();

    let environment: BTreeMap<String, String> = service
        .environment
        .iter()
        .filter(|(key, _)| !PLATFORM_ENV.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let app_data_dir = service.environment.get("APP_DATA_DIR");
    let volumes = service
        .volumes
        .iter()
        .filter(|entry| !is_permission_mount(entry))
        .map(|entry| relativize(entry, app_data_dir.map(String::as_str)))
        .collect();

    let depends_on = service
        .depends_on
        .iter()
        .filter_map(|target| target.strip_prefix(prefix))
        .map(str::to_string)
        .collect();

    Container {
        name: name.to_string(),
        image: service.image.clone(),
        permissions: Vec::new(),
        ports,
        volumes,
        environment,
        command: service.command.clone(),
        stop_signal: service.stop_signal.clone(),
        stop_grace_period: service.stop_grace_period.clone(),
        depends_on,
        requires: Vec::new(),
        required_by: Vec::new(),
        restart: service
            .restart
            .clone()
            .filter(|r| r != "unless-stopped"),
        user: service.user.clone(),
        network_mode: service.network_mode.clone(),
        main: service.networks.iter().any(|n| n == PLATFORM_NETWORK),
    }
}

/// A generated permission mount: read-only bind targeting `/mnt/...`
fn is_permission_mount(entry: &str) -> bool {
    let mut parts = entry.split(':');
    let _host = parts.next();
    let target = parts.next().unwrap_or("");
    let mode = parts.next();
    target.starts_with("/mnt/") && mode == Some("ro")
}

/// Fold a bind path under the app data dir back into the relative form the
/// v1 dialect uses
fn relativize(entry: &str, app_data_dir: Option<&str>) -> String {
    if let Some(data_dir) = app_data_dir {
        if let Some((host, target)) = entry.split_once(':') {
            if let Some(sub) = host.strip_prefix(data_dir).and_then(|s| s.strip_prefix('/')) {
                return format!("{}:{}", sub, target);
            }
        }
    }
    entry.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose_from_v1;
    use crate::manifest::{AppManifest, CapabilityIndex};
    use crate::registry::RegistryEntry;
    use std::path::Path;

    fn registry_for(yaml: &str, app_id: &str) -> Vec<RegistryEntry> {
        let manifest = AppManifest::parse(yaml, app_id).unwrap();
        vec![RegistryEntry {
            id: app_id.to_string(),
            name: manifest.name().to_string(),
            metadata: manifest.metadata().clone(),
            ports: vec![],
            installable: true,
        }]
    }

    const APP: &str = r#"
version: 1
name: My App
containers:
  - name: web
    image: nginx:latest
    ports: [80]
    main: true
    volumes:
      - config:/etc/app
  - name: db
    image: postgres:16
    dependsOn: [web]
    environment:
      POSTGRES_DB: app
metadata:
  title: My App
  version: "2.0.0"
"#;

    #[test]
    fn test_round_trip_from_generated_compose() {
        let AppManifest::V1(manifest) = AppManifest::parse(APP, "myapp").unwrap() else {
            panic!("expected v1");
        };
        let compose = compose_from_v1(
            &manifest,
            "myapp",
            Path::new("/home/node"),
            &CapabilityIndex::default(),
        )
        .unwrap();

        let registry = registry_for(APP, "myapp");
        let rebuilt = manifest_from_compose(&compose, "myapp", &registry).unwrap();

        assert_eq!(rebuilt.name, "My App");
        assert_eq!(rebuilt.containers.len(), 2);

        let web = &rebuilt.containers[0];
        assert_eq!(web.name, "web");
        assert_eq!(web.image, "nginx:latest");
        assert_eq!(web.ports, vec![80]);
        assert!(web.main);
        assert_eq!(web.volumes, vec!["config:/etc/app"]);

        let db = &rebuilt.containers[1];
        assert_eq!(db.name, "db");
        assert_eq!(db.depends_on, vec!["web"]);
        // Injected platform variables do not leak back into the manifest
        assert_eq!(db.environment.len(), 1);
        assert_eq!(db.environment["POSTGRES_DB"], "app");
    }

    #[test]
    fn test_legacy_single_service_becomes_main_container() {
        let yaml = r#"
version: "3.8"
services:
  myapp:
    image: nginx:latest
    ports:
      - "8080:80"
"#;
        let compose = ComposeConfig::from_yaml(yaml).unwrap();
        let registry = registry_for(APP, "myapp");
        let rebuilt = manifest_from_compose(&compose, "myapp", &registry).unwrap();

        assert_eq!(rebuilt.containers.len(), 1);
        assert_eq!(rebuilt.containers[0].name, "main");
        assert_eq!(rebuilt.containers[0].ports, vec![8080]);
    }

    #[test]
    fn test_manifest_to_yaml_round_trips_through_parse() {
        let AppManifest::V1(manifest) = AppManifest::parse(APP, "myapp").unwrap() else {
            panic!("expected v1");
        };
        let yaml = manifest_to_yaml(&manifest).unwrap();
        assert!(yaml.starts_with("version: 1\n"), "tag must lead the document");

        let reparsed = AppManifest::parse(&yaml, "myapp").unwrap();
        assert_eq!(reparsed.version(), 1);
        assert_eq!(reparsed.name(), "My App");
    }

    #[test]
    fn test_app_missing_from_registry_is_reference_error() {
        let compose = ComposeConfig::new();
        let err = manifest_from_compose(&compose, "ghost", &[]).unwrap_err();
        assert!(matches!(err, CoreError::Reference { .. }));
    }

    #[test]
    fn test_permission_mounts_dropped() {
        let yaml = r#"
version: "3.8"
services:
  myapp_web:
    image: nginx:latest
    volumes:
      - /home/node/app-data/files:/mnt/files:ro
      - /srv/keep:/keep
"#;
        let compose = ComposeConfig::from_yaml(yaml).unwrap();
        let registry = registry_for(APP, "myapp");
        let rebuilt = manifest_from_compose(&compose, "myapp", &registry).unwrap();

        assert_eq!(rebuilt.containers[0].volumes, vec!["/srv/keep:/keep"]);
    }
}
