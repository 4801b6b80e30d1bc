//! Build command - generates the static site

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use folio_generator::{BuildReport, Builder};

use super::load_config;

/// Command-line overrides for `[build]`.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions<'a> {
    pub output: Option<&'a Path>,
    pub drafts: bool,
    pub strict: bool,
}

/// Run the build command.
pub fn run(config_path: &Path, options: &BuildOptions<'_>) -> Result<BuildReport> {
    tracing::info!(?config_path, ?options, "Starting build");

    let (mut config, root) = load_config(config_path)?;
    config.build.drafts |= options.drafts;
    config.build.strict |= options.strict;

    let mut builder = Builder::new(config, root);
    if let Some(output) = options.output {
        builder = builder.with_output_dir(output);
    }

    let report = builder.build().wrap_err("Build failed")?;
    report.log_summary();
    print_report(&report, builder.output_dir());
    Ok(report)
}

fn print_report(report: &BuildReport, output: &Path) {
    let stats = &report.stats;
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:      {}", stats.pages);
    println!("  Listings:   {}", stats.listings);
    println!("  Assets:     {}", stats.assets);
    println!("  Files:      {}", stats.artifacts);
    if report.skipped_drafts > 0 {
        println!("  Drafts:     {} skipped", report.skipped_drafts);
    }
    if !report.broken_links.is_empty() {
        println!("  Broken:     {} internal link(s)", report.broken_links.len());
    }
    println!();
    println!("  Duration:   {:.2}s", stats.duration_ms as f64 / 1000.0);
    println!("  Output:     {}", output.display());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::fixtures;

    #[test]
    fn test_build_writes_site() {
        let (dir, config_path) = fixtures::project("Hello there.");
        let report = run(&config_path, &BuildOptions::default()).unwrap();

        assert!(report.written);
        assert_eq!(report.stats.pages, 1);
        assert!(dir.path().join("public/posts/hello.html").exists());
        assert!(dir.path().join("public/feed.xml").exists());
    }

    #[test]
    fn test_build_output_override_and_strict() {
        let (dir, config_path) = fixtures::project("[missing](/posts/missing)");
        let output = dir.path().join("dist");

        let report = run(
            &config_path,
            &BuildOptions {
                output: Some(&output),
                ..BuildOptions::default()
            },
        )
        .unwrap();
        assert_eq!(report.broken_links.len(), 1);
        assert!(output.join("index.html").exists());

        let strict = BuildOptions {
            strict: true,
            ..BuildOptions::default()
        };
        assert!(run(&config_path, &strict).is_err());
    }
}
