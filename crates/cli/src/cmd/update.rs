//! Implementation of the `berth update` command.
//!
//! Validates the catalog, writes both registry documents, and regenerates
//! every valid app's compose file. All the actual work happens in berth-core;
//! this layer only chooses paths and prints the outcome.

use anyhow::Result;
use console::{style, Term};

use berth_core::update_catalog;

use crate::paths::NodePaths;

pub fn cmd_update(paths: &NodePaths, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    term.write_line(&format!(
        "{} Updating catalog at {}",
        style("::").cyan().bold(),
        paths.root().display()
    ))?;

    let report = update_catalog(paths.root())?;

    term.write_line(&format!(
        "{} Wrote registry to {}",
        style("::").cyan().bold(),
        paths.registry_file().display()
    ))?;
    term.write_line(&format!(
        "{} Wrote version information to {}",
        style("::").cyan().bold(),
        paths.simple_registry_file().display()
    ))?;

    if verbose {
        for app in &report.written {
            term.write_line(&format!(
                "  {} {}",
                style("+").green().bold(),
                paths.compose_file(app).display()
            ))?;
        }
    }

    for failure in &report.failures {
        term.write_line(&format!(
            "{} Skipped app '{}': {}",
            style("warning:").yellow().bold(),
            failure.id,
            failure.error
        ))?;
    }

    term.write_line(&format!(
        "{} Generated configuration for {} app(s)",
        style("::").green().bold(),
        report.written.len()
    ))?;

    Ok(())
}
