//! Static asset processing.
//!
//! Files under the static directory are published below `static/`, with
//! optional content fingerprints for cache busting. Images go through an
//! [`ImageProcessor`] when `[images]` is configured.

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use folio_core::config::ImagesConfig;
use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    links::{is_internal, path_part, rewrite_references},
    output::{ArtifactKind, BuildArtifact},
};

/// Output directory and URL prefix of static files.
pub const STATIC_PREFIX: &str = "static";

/// Path of the fingerprint manifest in the output.
pub const MANIFEST_PATH: &str = "asset-manifest.json";

const FINGERPRINT_EXTENSIONS: &[&str] = &[
    "css", "js", "woff", "woff2", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif",
];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap_or_else(|e| unreachable!("img pattern is valid: {e}")));

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),

    /// The image collaborator rejected a file.
    #[error("image processing failed for {}: {message}", path.display())]
    Image { path: PathBuf, message: String },

    #[error("manifest serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Site-relative asset URLs mapped to their published URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssetManifest {
    assets: BTreeMap<String, String>,
}

impl AssetManifest {
    /// Create a new empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, original: impl Into<String>, published: impl Into<String>) {
        self.assets.insert(original.into(), published.into());
    }

    /// Published URL of an asset.
    #[must_use]
    pub fn get(&self, original: &str) -> Option<&str> {
        self.assets.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Serialize manifest to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rewrite references to fingerprinted assets in an HTML document.
    ///
    /// Query strings and fragments are kept.
    pub fn rewrite_html(&self, html: &str) -> String {
        if self.assets.iter().all(|(from, to)| from == to) {
            return html.to_string();
        }
        rewrite_references(html, |reference| {
            if !is_internal(reference) {
                return None;
            }
            let path = path_part(reference);
            let published = self.get(path).filter(|p| *p != path)?;
            Some(format!("{published}{}", &reference[path.len()..]))
        })
    }
}

/// One file produced by an [`ImageProcessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Path relative to the static directory, `/` separated.
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Image collaborator. Receives each source image and returns the files to
/// publish in its place; the first one is the image the original URL maps to.
pub trait ImageProcessor: Send + Sync + fmt::Debug {
    fn process(&self, path: &str, bytes: Vec<u8>, config: &ImagesConfig) -> Result<Vec<ProcessedImage>>;
}

/// Publishes images unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughImages;

impl ImageProcessor for PassthroughImages {
    fn process(&self, path: &str, bytes: Vec<u8>, _config: &ImagesConfig) -> Result<Vec<ProcessedImage>> {
        Ok(vec![ProcessedImage {
            path: path.to_string(),
            bytes,
        }])
    }
}

/// Processed static files and their manifest.
#[derive(Debug, Default)]
pub struct ProcessedAssets {
    pub manifest: AssetManifest,
    pub artifacts: Vec<BuildArtifact>,
}

/// Collects static files as artifacts, fingerprinting them when enabled.
#[derive(Debug)]
pub struct AssetProcessor<'a> {
    fingerprint: bool,
    images: &'a dyn ImageProcessor,
    images_config: Option<&'a ImagesConfig>,
}

impl<'a> AssetProcessor<'a> {
    #[must_use]
    pub fn new(fingerprint: bool, images: &'a dyn ImageProcessor, images_config: Option<&'a ImagesConfig>) -> Self {
        Self {
            fingerprint,
            images,
            images_config,
        }
    }

    /// Process every file below `source_dir`. Hidden entries are skipped.
    pub fn process(&self, source_dir: &Path) -> Result<ProcessedAssets> {
        let mut processed = ProcessedAssets::default();
        if !source_dir.is_dir() {
            debug!(dir = %source_dir.display(), "static directory missing, skipping");
            return Ok(processed);
        }
        info!(source = %source_dir.display(), "processing assets");

        for entry in WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() {
                self.process_file(source_dir, entry.path(), &mut processed)?;
            }
        }

        if self.fingerprint {
            processed.artifacts.push(BuildArtifact::text(
                MANIFEST_PATH,
                processed.manifest.to_json()?,
                ArtifactKind::Json,
                "asset manifest",
            ));
        }

        info!(count = processed.manifest.len(), "assets processed");
        Ok(processed)
    }

    fn process_file(&self, base_dir: &Path, file_path: &Path, processed: &mut ProcessedAssets) -> Result<()> {
        let relative = file_path
            .strip_prefix(base_dir)
            .map_err(|_| AssetError::InvalidPath(file_path.to_path_buf()))?
            .to_string_lossy()
            .replace('\\', "/");
        let bytes = fs::read(file_path)?;
        let extension = extension_of(&relative);

        let files = match self.images_config {
            Some(config) if IMAGE_EXTENSIONS.contains(&extension.as_str()) => {
                self.images.process(&relative, bytes, config)?
            }
            _ => vec![ProcessedImage {
                path: relative.clone(),
                bytes,
            }],
        };

        for (index, file) in files.into_iter().enumerate() {
            let published = if self.fingerprint && FINGERPRINT_EXTENSIONS.contains(&extension_of(&file.path).as_str()) {
                fingerprinted_name(&file.path, &compute_hash(&file.bytes))
            } else {
                file.path.clone()
            };

            let original_url = format!("/{STATIC_PREFIX}/{}", file.path);
            let published_url = format!("/{STATIC_PREFIX}/{published}");
            if index == 0 {
                processed.manifest.add(format!("/{STATIC_PREFIX}/{relative}"), published_url.clone());
            }
            if file.path != relative {
                processed.manifest.add(original_url, published_url.clone());
            }

            debug!(src = %file_path.display(), dest = %published_url, "collected asset");
            processed.artifacts.push(BuildArtifact {
                path: PathBuf::from(STATIC_PREFIX).join(&published),
                bytes: file.bytes,
                kind: ArtifactKind::Static,
                origin: file_path.display().to_string(),
            });
        }
        Ok(())
    }
}

fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// `css/site.css` with hash `abcd1234` becomes `css/site.abcd1234.css`.
fn fingerprinted_name(path: &str, hash: &str) -> String {
    let (dir, name) = path.rsplit_once('/').map_or(("", path), |(d, n)| (d, n));
    let renamed = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}.{hash}.{ext}"),
        _ => format!("{name}.{hash}"),
    };
    if dir.is_empty() {
        renamed
    } else {
        format!("{dir}/{renamed}")
    }
}

/// Short FNV-1a hash of file contents.
fn compute_hash(bytes: &[u8]) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")[..8].to_string()
}

/// Add `loading="lazy"` to every `<img>` without a `loading` attribute.
pub fn add_lazy_loading(html: &str) -> String {
    IMG_TAG
        .replace_all(html, |caps: &Captures<'_>| {
            let tag = &caps[0];
            if tag.to_ascii_lowercase().contains("loading=") {
                tag.to_string()
            } else {
                format!("<img loading=\"lazy\"{}", &tag[4..])
            }
        })
        .into_owned()
}
