use std::sync::Arc;

use shelf_core::ArticleRecord;
use shelf_logging::{shelf_debug, shelf_warn};
use thiserror::Error;

use crate::extract::{ExtractionChain, ExtractionError};
use crate::fetch::{Fetcher, ProgressSink};
use crate::render::{RenderError, Renderer};
use crate::store::{ManifestStore, StoreError};
use crate::{EngineEvent, FetchError, JobFailure, JobId, JobProgress, Stage};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("failed to render PDF: {0}")]
    Render(#[from] RenderError),
    #[error("failed to store article: {0}")]
    Storage(#[from] StoreError),
    #[error("background task failed: {0}")]
    Worker(String),
}

impl ArchiveError {
    pub fn stage(&self) -> Stage {
        match self {
            ArchiveError::Fetch(_) => Stage::Downloading,
            ArchiveError::Extraction(_) => Stage::Extracting,
            ArchiveError::Render(_) => Stage::Rendering,
            ArchiveError::Storage(_) | ArchiveError::Worker(_) => Stage::Storing,
        }
    }
}

impl From<&ArchiveError> for JobFailure {
    fn from(err: &ArchiveError) -> Self {
        JobFailure {
            stage: err.stage(),
            message: err.to_string(),
        }
    }
}

/// Fetch -> extract -> render -> store for one URL.
pub struct Archiver {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<ExtractionChain>,
    renderer: Arc<dyn Renderer>,
    store: Arc<ManifestStore>,
}

impl Archiver {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: ExtractionChain,
        renderer: Arc<dyn Renderer>,
        store: Arc<ManifestStore>,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            renderer,
            store,
        }
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    pub async fn archive(
        &self,
        job_id: JobId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ArticleRecord, ArchiveError> {
        let fetched = self.fetcher.fetch(job_id, url, sink).await?;

        progress(sink, job_id, Stage::Extracting);
        let extractor = self.extractor.clone();
        let source_url = url.to_string();
        let article = tokio::task::spawn_blocking(move || {
            extractor.extract_bytes(
                &fetched.bytes,
                fetched.metadata.content_type.as_deref(),
                &source_url,
            )
        })
        .await
        .map_err(|err| ArchiveError::Worker(err.to_string()))??;
        shelf_debug!(
            "job {} extracted {:?} via {}",
            job_id,
            article.title,
            article.strategy
        );

        progress(sink, job_id, Stage::Rendering);
        let renderer = self.renderer.clone();
        let (title, content_html, article_url) = (
            article.title.clone(),
            article.content_html,
            article.url.clone(),
        );
        let pdf = tokio::task::spawn_blocking(move || {
            renderer.render(&title, &content_html, &article_url)
        })
        .await
        .map_err(|err| ArchiveError::Worker(err.to_string()))??;

        progress(sink, job_id, Stage::Storing);
        let store = self.store.clone();
        let record = tokio::task::spawn_blocking(move || {
            store.add_article(&article.title, &article.url, &article.domain, &pdf)
        })
        .await
        .map_err(|err| ArchiveError::Worker(err.to_string()))?
        .inspect_err(|err| shelf_warn!("job {} could not be stored: {}", job_id, err))?;

        progress(sink, job_id, Stage::Done);
        Ok(record)
    }
}

fn progress(sink: &dyn ProgressSink, job_id: JobId, stage: Stage) {
    sink.emit(EngineEvent::Progress(JobProgress {
        job_id,
        stage,
        bytes: None,
    }));
}
