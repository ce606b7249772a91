//! berth-core: app catalog management for a home-server node
//!
//! This crate turns a directory of declarative app manifests (`app.yml`)
//! into container-orchestration configuration and derived registry
//! documents. It validates manifests, transpiles the v0 and v1 dialects to
//! compose files, and aggregates the catalog into `registry.json` and
//! `apps.json`. It only ever produces configuration; starting and stopping
//! containers is the caller's business.

mod adapter;
mod compose;
mod error;
mod manifest;
mod registry;
mod update;
mod validate;

pub use adapter::{manifest_from_compose, manifest_to_yaml};
pub use compose::{
    compose_from_v0, compose_from_v1, ComposeConfig, ComposeService, Network, ServiceMap, Volume,
    COMPOSE_VERSION, PLATFORM_NETWORK,
};
pub use error::CoreError;
pub use manifest::{
    AppManifest, CapabilityIndex, Container, Metadata, V0Manifest, V1Manifest,
    BUILT_IN_CAPABILITIES,
};
pub use registry::{build_registry, to_registry_json, RegistryBuild, RegistryEntry, SimpleEntry};
pub use update::{
    apps_dir, update_catalog, UpdateReport, COMPOSE_FILE, REGISTRY_FILE, SIMPLE_REGISTRY_FILE,
};
pub use validate::{load_manifest, manifest_path, validate_apps, AppFailure, Validation, MANIFEST_FILE};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
