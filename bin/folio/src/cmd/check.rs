//! Check command - validate configuration and content without writing

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, bail};
use folio_generator::{BuildReport, Builder};

use super::load_config;

/// Run the check command.
///
/// Runs every build stage except writing and fails when any internal link
/// is broken.
pub fn run(config_path: &Path) -> Result<BuildReport> {
    tracing::info!(?config_path, "Checking configuration and content");

    println!("Checking configuration...");
    let (config, root) = load_config(config_path)?;
    println!("  ✓ Configuration valid");

    println!("\nChecking content...");
    let report = Builder::new(config, root).check().wrap_err("Check failed")?;
    let stats = &report.stats;
    println!(
        "  ✓ {} pages, {} listings and {} assets rendered",
        stats.pages, stats.listings, stats.assets
    );
    if report.skipped_drafts > 0 {
        println!("  ℹ {} draft(s) skipped", report.skipped_drafts);
    }

    println!("\nChecking internal links...");
    if report.is_clean() {
        println!("  ✓ No broken links");
    } else {
        for link in &report.broken_links {
            println!("  ✗ {}: {}", link.source, link.target);
        }
        bail!("Found {} broken internal link(s)", report.broken_links.len());
    }

    println!();
    println!("✓ All checks passed");
    Ok(report)
}
