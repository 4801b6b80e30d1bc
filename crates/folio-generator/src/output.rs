//! In-memory output set.
//!
//! Every artifact of a build lands here before anything touches the output
//! directory. Paths are relative to the output root and may be written once.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Output errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Two artifacts claimed the same output path.
    #[error("output collision: `{}` written by {first} and {second}", path.display())]
    Collision {
        path: PathBuf,
        first: String,
        second: String,
    },
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// What an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Html,
    Markdown,
    Xml,
    Json,
    Text,
    /// Copied or processed static file.
    Static,
}

/// One file of the published site.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    /// Path relative to the output root.
    pub path: PathBuf,

    pub bytes: Vec<u8>,

    pub kind: ArtifactKind,

    /// What produced the artifact, for collision messages.
    pub origin: String,
}

impl BuildArtifact {
    /// Create an artifact from text.
    pub fn text(
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        kind: ArtifactKind,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            bytes: content.into().into_bytes(),
            kind,
            origin: origin.into(),
        }
    }

    /// The artifact as UTF-8 text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Site-relative URL of the artifact, `/` separated.
    pub fn url(&self) -> String {
        format!("/{}", self.path.to_string_lossy().replace('\\', "/"))
    }
}

/// Write-once collection of build artifacts keyed by output path.
#[derive(Debug, Default)]
pub struct OutputSet {
    artifacts: BTreeMap<PathBuf, BuildArtifact>,
}

impl OutputSet {
    /// Create an empty output set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact, failing if its path is already taken.
    pub fn insert(&mut self, artifact: BuildArtifact) -> Result<()> {
        if let Some(existing) = self.artifacts.get(&artifact.path) {
            return Err(OutputError::Collision {
                path: artifact.path,
                first: existing.origin.clone(),
                second: artifact.origin,
            });
        }
        self.artifacts.insert(artifact.path.clone(), artifact);
        Ok(())
    }

    pub fn get(&self, path: &Path) -> Option<&BuildArtifact> {
        self.artifacts.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.artifacts.contains_key(path)
    }

    /// Artifacts in path order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildArtifact> {
        self.artifacts.values()
    }

    /// Mutable access for in-place rewriting passes.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BuildArtifact> {
        self.artifacts.values_mut()
    }

    /// Artifacts of one kind in path order.
    pub fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &BuildArtifact> {
        self.artifacts.values().filter(move |a| a.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
