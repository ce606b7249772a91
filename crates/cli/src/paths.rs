//! Node tree layout
//!
//! A node root contains `apps/` (manifests, compose files, registries),
//! `app-data/` (per-app persistent data), `db/user.json` (install state),
//! and `.env` (variables handed to the container tooling).

use std::path::{Path, PathBuf};

use berth_core::{COMPOSE_FILE, MANIFEST_FILE, REGISTRY_FILE, SIMPLE_REGISTRY_FILE};

#[derive(Debug, Clone)]
pub struct NodePaths {
    root: PathBuf,
}

impl NodePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.root.join("apps")
    }

    pub fn app_dir(&self, app_id: &str) -> PathBuf {
        self.apps_dir().join(app_id)
    }

    pub fn manifest_file(&self, app_id: &str) -> PathBuf {
        self.app_dir(app_id).join(MANIFEST_FILE)
    }

    pub fn compose_file(&self, app_id: &str) -> PathBuf {
        self.app_dir(app_id).join(COMPOSE_FILE)
    }

    pub fn registry_file(&self) -> PathBuf {
        self.apps_dir().join(REGISTRY_FILE)
    }

    pub fn simple_registry_file(&self) -> PathBuf {
        self.apps_dir().join(SIMPLE_REGISTRY_FILE)
    }

    pub fn app_data_dir(&self, app_id: &str) -> PathBuf {
        self.root.join("app-data").join(app_id)
    }

    pub fn user_file(&self) -> PathBuf {
        self.root.join("db").join("user.json")
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }
}
