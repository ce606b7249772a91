//! Compose output model
//!
//! The transpilers produce a [`ComposeConfig`], an in-memory
//! `docker-compose.yml`. Services preserve container declaration order, so
//! generated files diff cleanly against previous runs.

mod v0;
mod v1;

pub use v0::compose_from_v0;
pub use v1::compose_from_v1;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::Result;

/// Compose file format version emitted by the transpilers
pub const COMPOSE_VERSION: &str = "3.8";

/// Name of the shared network joined by each app's main container
pub const PLATFORM_NETWORK: &str = "platform";

/// One service entry in a compose document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeService {
    pub image: String,
    /// `host:container` port publications
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    // Hand-written compose files may carry unquoted scalars here
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "crate::manifest::de_environment"
    )]
    pub environment: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_grace_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
}

/// Top-level network declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,
}

/// Top-level named volume declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {}

/// Service-name -> service mapping preserving insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceMap {
    entries: Vec<(String, ComposeService)>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, service: ComposeService) {
        self.entries.push((name.into(), service));
    }

    pub fn get(&self, name: &str) -> Option<&ComposeService> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComposeService)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl Serialize for ServiceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, service) in &self.entries {
            map.serialize_entry(name, service)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ServiceMap {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct ServiceMapVisitor;

        impl<'de> Visitor<'de> for ServiceMapVisitor {
            type Value = ServiceMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of service name to service spec")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut map = ServiceMap::new();
                while let Some((name, service)) =
                    access.next_entry::<String, ComposeService>()?
                {
                    map.insert(name, service);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ServiceMapVisitor)
    }
}

/// A complete compose document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeConfig {
    pub version: String,
    pub services: ServiceMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, Network>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, Volume>,
}

impl ComposeConfig {
    pub fn new() -> Self {
        Self {
            version: COMPOSE_VERSION.to_string(),
            ..Default::default()
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Host ports published by any service, in service order
    pub fn published_ports(&self) -> Vec<u16> {
        let mut ports = Vec::new();
        for (_, service) in self.services.iter() {
            for entry in &service.ports {
                let host = entry.split(':').next().unwrap_or(entry);
                if let Ok(port) = host.parse() {
                    ports.push(port);
                }
            }
        }
        ports
    }

    /// Write the document to `path` via a temp file in the same directory,
    /// so a failed write never leaves a truncated compose file behind
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        let tmp = path.with_extension("yml.tmp");
        fs::write(&tmp, &yaml).map_err(|e| CoreError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| CoreError::io(path, e))?;
        Ok(())
    }
}

/// The named volume referenced by a `host:container` entry, if the host side
/// is a volume name rather than a bind path
pub(crate) fn named_volume(entry: &str) -> Option<&str> {
    let host = entry.split(':').next()?;
    if host.is_empty()
        || host.starts_with('/')
        || host.starts_with('.')
        || host.starts_with('$')
    {
        None
    } else {
        Some(host)
    }
}
