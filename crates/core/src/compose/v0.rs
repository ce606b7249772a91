//! Legacy (version 0) manifest transpiler
//!
//! The v0 dialect describes exactly one container with top-level fields, so
//! the output is always a single service named after the app id. Environment
//! values pass through verbatim; variable interpolation is the concern of the
//! tooling that consumes the file.

use crate::compose::{named_volume, ComposeConfig, ComposeService, Volume};
use crate::manifest::V0Manifest;
use crate::Result;

/// Volume entry used when a v0 manifest declares no mounts
const DEFAULT_MOUNT: &str = "data:/data";

/// Convert a v0 manifest into a compose document with one service
pub fn compose_from_v0(manifest: &V0Manifest, app_id: &str) -> Result<ComposeConfig> {
    let mut config = ComposeConfig::new();

    let volumes = if manifest.mounts.is_empty() {
        vec![DEFAULT_MOUNT.to_string()]
    } else {
        manifest.mounts.clone()
    };

    for entry in &volumes {
        if let Some(name) = named_volume(entry) {
            config.volumes.entry(name.to_string()).or_insert(Volume {});
        }
    }

    config.services.insert(
        app_id,
        ComposeService {
            image: manifest.image.clone(),
            ports: vec![format!("{}:{}", manifest.port, manifest.port)],
            volumes,
            environment: manifest.environment.clone(),
            restart: Some("unless-stopped".to_string()),
            ..Default::default()
        },
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::AppManifest;

    fn parse_v0(yaml: &str) -> V0Manifest {
        match AppManifest::parse(yaml, "example").unwrap() {
            AppManifest::V0(m) => m,
            AppManifest::V1(_) => panic!("expected v0"),
        }
    }

    const BASE: &str = r#"
name: example
image: nginx:latest
port: 8080
metadata:
  title: Example
  version: "1.0.0"
"#;

    #[test]
    fn test_exactly_one_service_named_app_id() {
        let manifest = parse_v0(BASE);
        let config = compose_from_v0(&manifest, "example").unwrap();

        assert_eq!(config.services.len(), 1);
        let service = config.services.get("example").unwrap();
        assert_eq!(service.image, "nginx:latest");
        assert_eq!(service.ports, vec!["8080:8080"]);
        assert_eq!(service.restart.as_deref(), Some("unless-stopped"));
        assert!(service.depends_on.is_empty());
    }

    #[test]
    fn test_default_mount_when_none_declared() {
        let manifest = parse_v0(BASE);
        let config = compose_from_v0(&manifest, "example").unwrap();

        let service = config.services.get("example").unwrap();
        assert_eq!(service.volumes, vec!["data:/data"]);
        assert!(config.volumes.contains_key("data"));
    }

    #[test]
    fn test_declared_mounts_pass_through() {
        let yaml = format!("{}mounts:\n  - /srv/media:/media\n  - cache:/cache\n", BASE);
        let manifest = parse_v0(&yaml);
        let config = compose_from_v0(&manifest, "example").unwrap();

        let service = config.services.get("example").unwrap();
        assert_eq!(service.volumes, vec!["/srv/media:/media", "cache:/cache"]);
        // Only the named volume gets a top-level declaration
        assert_eq!(config.volumes.len(), 1);
        assert!(config.volumes.contains_key("cache"));
    }

    #[test]
    fn test_environment_verbatim() {
        let yaml = format!("{}environment:\n  PUID: \"1000\"\n  TZ: $TZ\n", BASE);
        let manifest = parse_v0(&yaml);
        let config = compose_from_v0(&manifest, "example").unwrap();

        let service = config.services.get("example").unwrap();
        assert_eq!(service.environment["PUID"], "1000");
        // No interpolation happens at this layer
        assert_eq!(service.environment["TZ"], "$TZ");
    }
}
