//! App manifest types
//!
//! An `app.yml` comes in two dialects, distinguished by an integer `version`
//! tag: version 0 describes a single implicit container with top-level
//! `image`/`port` fields, version 1 describes an explicit list of containers
//! with intra-app dependencies. Dispatch always happens on the tag, never on
//! which fields happen to be present.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::Result;

/// Capability tags the platform provides itself. Requesting one of these
/// succeeds without resolving to another app and produces no data mount.
pub const BUILT_IN_CAPABILITIES: &[&str] = &["network", "gpu"];

/// Shared per-app metadata, identical across manifest versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Display title of the app
    pub title: String,
    /// App release version, used by update checks (not the manifest dialect)
    pub version: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gallery: Vec<String>,
    /// Other app ids this app needs installed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Capability tags this app requires (resolved against `implements`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    /// Capability tag this app exposes to other apps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implements: Option<String>,
    #[serde(default)]
    pub requires_password: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_password: Option<String>,
    #[serde(default = "default_true")]
    pub compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Accept numeric and boolean environment values and carry them as strings,
/// so `PORT: 8080` works without quoting
pub(crate) fn de_environment<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = BTreeMap::<String, serde_yaml::Value>::deserialize(deserializer)?;
    let mut environment = BTreeMap::new();
    for (key, value) in raw {
        let value = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => {
                return Err(D::Error::custom(format!(
                    "environment value for '{}' is not a scalar",
                    key
                )));
            }
        };
        environment.insert(key, value);
    }
    Ok(environment)
}

/// A version 0 manifest: one implicit container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V0Manifest {
    pub name: String,
    pub metadata: Metadata,
    pub image: String,
    pub port: u16,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "de_environment"
    )]
    pub environment: BTreeMap<String, String>,
    /// `host:container` volume entries, passed through verbatim
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<String>,
}

/// A version 1 manifest: explicit, dependency-aware container list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V1Manifest {
    pub name: String,
    pub metadata: Metadata,
    pub containers: Vec<Container>,
}

/// One container spec inside a version 1 manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    /// Capability tags this container needs mounted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    /// Published ports (container port equals host port)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
    /// `host:container[:mode]` entries; relative host paths resolve under
    /// the app's data directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "de_environment"
    )]
    pub environment: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_grace_period: Option<String>,
    /// Sibling containers this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Sibling containers this one requires (same edge direction as
    /// `depends_on`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// Sibling containers that require this one (reverse edge)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    /// Marks the container that also joins the shared platform network
    /// (reverse-proxy discovery). At most one per app.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub main: bool,
}

/// A parsed app manifest, tagged by dialect version
#[derive(Debug, Clone)]
pub enum AppManifest {
    V0(V0Manifest),
    V1(V1Manifest),
}

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u32,
}

impl AppManifest {
    /// Parse a manifest from YAML text.
    ///
    /// The integer `version` tag is probed first (absent means 0), then the
    /// matching variant is deserialized. Structural checks that need no
    /// catalog context run immediately, so a successfully parsed manifest is
    /// always internally consistent.
    pub fn parse(text: &str, app_id: &str) -> Result<Self> {
        let probe: VersionProbe = serde_yaml::from_str(text)
            .map_err(|e| CoreError::schema(app_id, e.to_string()))?;

        let manifest = match probe.version {
            0 => Self::V0(
                serde_yaml::from_str(text).map_err(|e| CoreError::schema(app_id, e.to_string()))?,
            ),
            1 => Self::V1(
                serde_yaml::from_str(text).map_err(|e| CoreError::schema(app_id, e.to_string()))?,
            ),
            v => {
                return Err(CoreError::schema(
                    app_id,
                    format!("unsupported manifest version {}", v),
                ));
            }
        };

        manifest.check_structure(app_id)?;
        Ok(manifest)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::V0(m) => &m.name,
            Self::V1(m) => &m.name,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::V0(m) => &m.metadata,
            Self::V1(m) => &m.metadata,
        }
    }

    /// Manifest dialect version tag
    pub fn version(&self) -> u32 {
        match self {
            Self::V0(_) => 0,
            Self::V1(_) => 1,
        }
    }

    /// Run the catalog-independent structural checks
    pub fn check_structure(&self, app_id: &str) -> Result<()> {
        match self {
            Self::V0(_) => Ok(()),
            Self::V1(m) => m.check_structure(app_id),
        }
    }
}

impl V1Manifest {
    /// Validate container names, intra-app references, port uniqueness, and
    /// the single-platform-network rule
    pub fn check_structure(&self, app_id: &str) -> Result<()> {
        if self.containers.is_empty() {
            return Err(CoreError::schema(app_id, "no containers declared"));
        }

        let mut names = BTreeSet::new();
        for container in &self.containers {
            if !names.insert(container.name.as_str()) {
                return Err(CoreError::conflict(
                    app_id,
                    format!("duplicate container name '{}'", container.name),
                ));
            }
        }

        // Every dependency edge must point at a declared sibling
        for container in &self.containers {
            for target in container
                .depends_on
                .iter()
                .chain(&container.requires)
                .chain(&container.required_by)
            {
                if !names.contains(target.as_str()) {
                    return Err(CoreError::reference(
                        app_id,
                        format!(
                            "container '{}' references unknown sibling '{}'",
                            container.name, target
                        ),
                    ));
                }
            }
        }

        // Ports are unique per app, across all of its containers
        let mut ports = BTreeSet::new();
        for container in &self.containers {
            for port in &container.ports {
                if !ports.insert(*port) {
                    return Err(CoreError::conflict(
                        app_id,
                        format!("port {} declared more than once", port),
                    ));
                }
            }
        }

        let main_count = self.containers.iter().filter(|c| c.main).count();
        if main_count > 1 {
            return Err(CoreError::conflict(
                app_id,
                "more than one container joins the platform network",
            ));
        }

        // network_mode replaces the networks list entirely, so a main
        // container could never actually join the platform network
        for container in &self.containers {
            if container.main && container.network_mode.is_some() {
                return Err(CoreError::conflict(
                    app_id,
                    format!(
                        "container '{}' sets networkMode but is marked main",
                        container.name
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Intra-app dependency adjacency: container name -> sibling names it
    /// depends on, in stable order. `requires` counts as a forward edge and
    /// `required_by` as the matching reverse edge.
    pub fn dependency_edges(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut edges: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for container in &self.containers {
            edges.entry(container.name.as_str()).or_default();
        }
        for container in &self.containers {
            let name = container.name.as_str();
            for target in container.depends_on.iter().chain(&container.requires) {
                edges.entry(name).or_default().insert(target.as_str());
            }
            for source in &container.required_by {
                edges.entry(source.as_str()).or_default().insert(name);
            }
        }
        edges
    }
}

/// Resolves capability tags to the app that implements them.
///
/// Built from the metadata of every validated app; used both for permission
/// mounts during compose generation and for the `installable` flag during
/// registry aggregation.
#[derive(Debug, Clone, Default)]
pub struct CapabilityIndex {
    providers: BTreeMap<String, String>,
}

impl CapabilityIndex {
    pub fn from_manifests<'a, I>(apps: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Metadata)>,
    {
        let mut providers = BTreeMap::new();
        for (id, metadata) in apps {
            if let Some(tag) = &metadata.implements {
                // First app to claim a tag wins; ids arrive sorted
                providers
                    .entry(tag.clone())
                    .or_insert_with(|| id.to_string());
            }
        }
        Self { providers }
    }

    /// The app id implementing `tag`, if any
    pub fn provider(&self, tag: &str) -> Option<&str> {
        self.providers.get(tag).map(String::as_str)
    }

    pub fn is_built_in(tag: &str) -> bool {
        BUILT_IN_CAPABILITIES.contains(&tag)
    }

    /// Whether `tag` resolves at all, to an app or to a built-in capability
    pub fn resolves(&self, tag: &str) -> bool {
        Self::is_built_in(tag) || self.providers.contains_key(tag)
    }
}
