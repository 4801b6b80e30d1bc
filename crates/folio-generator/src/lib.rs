//! folio generator library
//!
//! The static site build pipeline.
//!
//! # Modules
//!
//! - [`loader`] - Content discovery and frontmatter parsing
//! - [`i18n`] - Translation grouping and URL assignment
//! - [`shortcode`] - Inline and body shortcode expansion
//! - [`pagination`] - Collection and tag listings
//! - [`template`] - Template language and registry
//! - [`html`] - Page, listing and home rendering
//! - [`output`] - Write-once in-memory output set
//! - [`links`] - Internal link validation
//! - [`rss`], [`sitemap`], [`llms`], [`robots`] - Whole-site aggregates
//! - [`assets`] - Static files, fingerprinting and images
//! - [`pipeline`], [`stages`] - Stage scheduling
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod html;
pub mod i18n;
pub mod links;
pub mod llms;
pub mod loader;
pub mod output;
pub mod pagination;
pub mod pipeline;
pub mod robots;
pub mod rss;
pub mod shortcode;
pub mod sitemap;
pub mod stages;
pub mod template;

#[cfg(test)]
mod test_support;

pub use assets::{AssetManifest, AssetProcessor, ImageProcessor, PassthroughImages};
pub use build::{BuildError, BuildReport, BuildStats, Builder};
pub use html::HtmlGenerator;
pub use links::{BrokenLink, LinkGraph};
pub use output::{ArtifactKind, BuildArtifact, OutputSet};
pub use pipeline::{Pipeline, Resource, Stage};
pub use shortcode::{ShortcodeProcessor, ShortcodeRegistry};
pub use template::{RenderContext, TemplateRegistry};
