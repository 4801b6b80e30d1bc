//! Stage scheduling.
//!
//! A [`Pipeline`] is an ordered list of stages. Each stage declares the
//! [`Resource`]s it reads and writes, and construction rejects any order in
//! which a stage reads a resource before every other writer of it has run.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

/// Shared build state a stage can read or produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Raw pages and excluded drafts.
    Content,
    /// Templates, shortcodes and the markdown renderer.
    Registries,
    /// The data file tree.
    Data,
    /// Pages with resolved URLs and alternates.
    Pages,
    /// Listing pages and generated home pages.
    Listings,
    /// The static asset manifest.
    Assets,
    /// Pages carrying rendered HTML and Markdown.
    RenderedPages,
    /// Per-document artifacts in the output set.
    Output,
    /// Broken link findings.
    LinkReport,
    /// Feeds, sitemap, search index, llms files and robots.txt.
    Aggregates,
    /// The written output directory.
    Site,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Pipeline construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A stage reads a resource that a later stage still writes.
    #[error("stage `{stage}` reads {resource} before `{writer}` writes it")]
    OrderViolation {
        stage: &'static str,
        resource: Resource,
        writer: &'static str,
    },

    /// Nothing in the pipeline produces a resource a stage reads.
    #[error("stage `{stage}` reads {resource}, which no stage writes")]
    MissingWriter {
        stage: &'static str,
        resource: Resource,
    },
}

/// One step of a build over a shared context `C`.
pub trait Stage<C>: Send + Sync {
    fn name(&self) -> &'static str;

    fn reads(&self) -> &'static [Resource];

    fn writes(&self) -> &'static [Resource];

    fn run(&self, ctx: &mut C) -> crate::build::Result<()>;
}

/// A validated stage order.
pub struct Pipeline<C> {
    stages: Vec<Box<dyn Stage<C>>>,
}

impl<C> Pipeline<C> {
    /// Validate and create a pipeline.
    ///
    /// A stage may update a resource it also reads; every other writer of
    /// that resource must come earlier.
    pub fn new(stages: Vec<Box<dyn Stage<C>>>) -> Result<Self, PipelineError> {
        for (position, stage) in stages.iter().enumerate() {
            for &resource in stage.reads() {
                let mut writers = stages
                    .iter()
                    .enumerate()
                    .filter(|(i, s)| *i != position && s.writes().contains(&resource))
                    .peekable();

                if writers.peek().is_none() && !stage.writes().contains(&resource) {
                    return Err(PipelineError::MissingWriter {
                        stage: stage.name(),
                        resource,
                    });
                }
                if let Some((_, writer)) = writers.find(|(i, _)| *i > position) {
                    return Err(PipelineError::OrderViolation {
                        stage: stage.name(),
                        resource,
                        writer: writer.name(),
                    });
                }
            }
        }
        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self, ctx: &mut C) -> crate::build::Result<()> {
        let total = self.stages.len();
        for (index, stage) in self.stages.iter().enumerate() {
            info!(stage = stage.name(), step = index + 1, total, "running stage");
            stage.run(ctx)?;
            debug!(stage = stage.name(), "stage complete");
        }
        Ok(())
    }
}

impl<C> fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}
