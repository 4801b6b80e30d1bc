//! folio core library
//!
//! Configuration, content types, frontmatter, data files and URL helpers
//! shared by the folio build pipeline.

pub mod config;
pub mod content;
pub mod data;
pub mod error;
pub mod frontmatter;
pub mod url;
pub mod value;

pub use config::{CollectionConfig, Config};
pub use content::{Alternate, ContentPath, Page, TocEntry};
pub use error::{CoreError, Result};
pub use frontmatter::{Frontmatter, ParsedDocument, parse_frontmatter};
