//! Command implementations.

pub mod build;
pub mod check;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use folio_core::Config;

/// Load the configuration, layering `FOLIO__*` environment overrides.
///
/// Returns the config and the project root, the directory holding the file.
pub fn load_config(config_path: &Path) -> Result<(Config, PathBuf)> {
    let config = Config::load_with_env(config_path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", config_path.display()))?;
    let root = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    tracing::debug!(root = %root.display(), "loaded configuration");
    Ok((config, root))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::{fs, path::PathBuf};

    use tempfile::TempDir;

    pub const CONFIG: &str = r#"
[site]
title = "CLI Site"
base_url = "https://example.com"

[[collections]]
name = "posts"
has_date = true
has_rss = true
listed = true
"#;

    /// A project with one post; returns the dir and its config path.
    pub fn project(post_body: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, CONFIG).unwrap();
        let posts = dir.path().join("content/posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(
            posts.join("2026-03-01-hello.md"),
            format!("---\ntitle: Hello\n---\n{post_body}\n"),
        )
        .unwrap();
        (dir, config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_root() {
        let (dir, config_path) = fixtures::project("Hi");
        let (config, root) = load_config(&config_path).unwrap();
        assert_eq!(config.site.title, "CLI Site");
        assert_eq!(root, dir.path());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(format!("{err:?}").contains("Failed to load configuration"));
    }
}
