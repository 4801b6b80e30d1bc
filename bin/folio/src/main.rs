//! folio CLI
//!
//! Multilingual static site generator for Markdown content.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use folio::cmd::{self, build::BuildOptions};

/// Command-line interface for folio.
#[derive(Parser)]
#[command(name = "folio", version, about = "A multilingual static site generator")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "folio.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        /// Output directory, overriding `build.output_dir`
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Include draft pages
        #[arg(long)]
        drafts: bool,
        /// Fail on broken internal links
        #[arg(long)]
        strict: bool,
    },
    /// Run the build without writing and report broken links
    Check,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    folio::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output, drafts, strict } => {
            let options = BuildOptions {
                output: output.as_deref(),
                drafts,
                strict,
            };
            cmd::build::run(&cli.config, &options)?;
        }
        Commands::Check => {
            cmd::check::run(&cli.config)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let cli = Cli::parse_from(["folio", "build", "--output", "dist"]);

        assert_eq!(cli.config, PathBuf::from("folio.toml"));
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Build { output, drafts, strict } => {
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert!(!drafts);
                assert!(!strict);
            }
            Commands::Check => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_flags() {
        let cli = Cli::parse_from(["folio", "build", "--drafts", "--strict"]);
        match cli.command {
            Commands::Build { output, drafts, strict } => {
                assert!(output.is_none());
                assert!(drafts);
                assert!(strict);
            }
            Commands::Check => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let cli = Cli::parse_from(["folio", "--config", "site.toml", "check"]);
        assert!(matches!(cli.command, Commands::Check));
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["folio", "-vvv", "build"]);
        assert_eq!(cli.verbose, 3);
        let cli = Cli::parse_from(["folio", "check", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
