use crate::engine::RasterEngine;
use crate::{
    AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, Error, RenderOutput, Result,
    StyleConfig,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Everything needed for one render, owned so it can move to a worker thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderJob {
    pub content: AnnouncementContent,
    /// `None` picks the default layout for the content's title
    pub layout: Option<AnnouncementLayout>,
    pub style: StyleConfig,
    pub background: Option<PathBuf>,
}

impl RenderJob {
    /// Job using the default layout for `content`.
    pub fn new(content: AnnouncementContent) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }

    /// The layout this job renders with.
    pub fn resolved_layout(&self) -> AnnouncementLayout {
        match &self.layout {
            Some(layout) => layout.clone(),
            None => AnnouncementLayout::defaults_for(&self.content),
        }
    }
}

/// An async-friendly front for a [`RasterEngine`].
///
/// Renders are CPU-bound, so each one runs on Tokio's blocking pool. A
/// semaphore caps how many run at once; callers beyond the cap wait for a
/// permit.
#[derive(Clone)]
pub struct AsyncRenderer {
    engine: Arc<RasterEngine>,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl AsyncRenderer {
    /// Allow one concurrent render per CPU.
    pub fn new(engine: RasterEngine) -> Self {
        Self::with_concurrency(engine, num_cpus::get())
    }

    pub fn with_concurrency(engine: RasterEngine, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            engine: Arc::new(engine),
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.limit
    }

    pub fn engine(&self) -> &RasterEngine {
        &self.engine
    }

    /// Render a single job on the blocking pool.
    pub async fn render(&self, job: RenderJob) -> Result<RenderOutput> {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| Error::Other(format!("Render queue closed: {}", e)))?;

        let engine = Arc::clone(&self.engine);
        let layout = job.resolved_layout();
        tokio::task::spawn_blocking(move || {
            engine.render(
                &job.content,
                &layout,
                &job.style,
                job.background.as_deref(),
            )
        })
        .await
        .map_err(|e| Error::Other(format!("Render task failed: {}", e)))?
    }

    /// Render many jobs concurrently. Results come back in input order; one
    /// failing job does not affect the others.
    pub async fn render_batch(&self, jobs: Vec<RenderJob>) -> Vec<Result<RenderOutput>> {
        log::debug!(
            "Rendering batch of {} jobs, {} at a time",
            jobs.len(),
            self.limit
        );
        join_all(jobs.into_iter().map(|job| self.render(job))).await
    }
}
