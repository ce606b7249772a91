//! Parallel start/stop of installed apps
//!
//! One thread per app, all joined before returning: each app's invocation is
//! independent and a failure in one never blocks or cancels the others.

use std::thread;

use anyhow::{bail, Result};
use console::{style, Term};

use super::compose::run_compose;
use crate::paths::NodePaths;
use crate::state::UserData;

pub fn cmd_start(paths: &NodePaths) -> Result<()> {
    run_installed(paths, &["up", "--detach"], "Starting")
}

pub fn cmd_stop(paths: &NodePaths) -> Result<()> {
    run_installed(paths, &["rm", "--force", "--stop"], "Stopping")
}

fn run_installed(paths: &NodePaths, args: &[&str], action: &str) -> Result<()> {
    let term = Term::stderr();
    // No state file means nothing is installed; do nothing
    let state = UserData::load(&paths.user_file())?;

    let mut handles = Vec::new();
    for app in state.installed_apps {
        term.write_line(&format!("{} app {}...", action, app))?;
        let paths = paths.clone();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        handles.push(thread::spawn(move || {
            let result = run_compose(&paths, &app, &args);
            (app, result)
        }));
    }

    // Barrier: every app finishes before we report anything, even when a
    // worker panics
    let mut failed = 0;
    for handle in handles {
        match handle.join() {
            Ok((_, Ok(()))) => {}
            Ok((app, Err(error))) => {
                failed += 1;
                term.write_line(&format!(
                    "{} {}: {:#}",
                    style("error:").red().bold(),
                    app,
                    error
                ))?;
            }
            Err(_) => {
                failed += 1;
                term.write_line(&format!(
                    "{} compose worker panicked",
                    style("error:").red().bold()
                ))?;
            }
        }
    }

    if failed > 0 {
        bail!("{} app(s) failed", failed);
    }
    Ok(())
}
