//! Install-state changes and app data cleanup

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::{style, Term};
use walkdir::WalkDir;

use crate::paths::NodePaths;
use crate::state::UserData;

pub fn cmd_install(paths: &NodePaths, app: &str) -> Result<()> {
    let mut state = UserData::load(&paths.user_file())?;
    state.install(app);
    state.save(&paths.user_file())?;

    let term = Term::stderr();
    term.write_line(&format!("{} Installed {}", style("::").green().bold(), app))?;
    Ok(())
}

pub fn cmd_uninstall(paths: &NodePaths, app: &str) -> Result<()> {
    let mut state = UserData::load(&paths.user_file())?;
    state.remove(app);
    state.save(&paths.user_file())?;

    delete_app_data(&paths.app_data_dir(app))?;

    let term = Term::stderr();
    term.write_line(&format!(
        "{} Uninstalled {}",
        style("::").green().bold(),
        app
    ))?;
    Ok(())
}

/// Delete an app's data directory, making everything writable first so the
/// removal cannot trip over files the app marked read-only
fn delete_app_data(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let mut permissions = entry.metadata()?.permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            permissions.set_mode(permissions.mode() | 0o200);
        }
        #[cfg(not(unix))]
        permissions.set_readonly(false);
        fs::set_permissions(entry.path(), permissions)
            .with_context(|| format!("failed to chmod {}", entry.path().display()))?;
    }

    fs::remove_dir_all(dir).with_context(|| format!("failed to delete {}", dir.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_app_data_clears_read_only() {
        let root = TempDir::new().unwrap();
        let data = root.path().join("app");
        fs::create_dir_all(data.join("nested")).unwrap();
        let file = data.join("nested").join("locked.txt");
        fs::write(&file, "x").unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();
        }

        delete_app_data(&data).unwrap();
        assert!(!data.exists());
    }

    #[test]
    fn test_delete_missing_dir_is_fine() {
        let root = TempDir::new().unwrap();
        delete_app_data(&root.path().join("nope")).unwrap();
    }
}
