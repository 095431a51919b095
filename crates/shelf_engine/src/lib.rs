//! Shelf engine: article extraction, the manifest store and the archive pipeline.
mod archive;
mod config;
mod decode;
mod engine;
mod extract;
mod fetch;
mod persist;
mod render;
mod store;
mod types;

pub use archive::{ArchiveError, Archiver};
pub use config::{ConfigError, ShelfConfig, DEFAULT_DATA_DIR, DEFAULT_LOG_FILE};
pub use decode::{decode_html, DecodedHtml};
pub use engine::EngineHandle;
pub use extract::{
    extract_article, resolve_title, ExtractedArticle, ExtractionChain, ExtractionError,
    ExtractionMode, ExtractionStrategy, FullTextStrategy, ReadabilityStrategy, StrategyError,
    StructuralStrategy, MIN_CONTENT_CHARS,
};
pub use fetch::{
    ChannelProgressSink, FetchSettings, Fetcher, NoopProgressSink, ProgressSink, ReqwestFetcher,
    BROWSER_USER_AGENT,
};
pub use persist::{AtomicFileWriter, FileLock, LockMode, PersistError};
pub use render::{print_document, RenderError, RenderSettings, Renderer, WkhtmltopdfRenderer};
pub use store::{ManifestStore, StoreConfig, StoreError, BLOB_DIRNAME, MANIFEST_FILENAME};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, JobFailure, JobId,
    JobProgress, Stage,
};
