//! Article extraction: raw HTML in, title plus a self-contained content fragment out.
//!
//! Content comes from an ordered [`ExtractionChain`] of strategies. Each one
//! may error or come back empty; the chain logs that and moves on, and only
//! fails when every strategy is exhausted.

mod dom;
mod fulltext;
mod readability;
mod structural;
mod title;

use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use scraper::Html;
use shelf_core::domain_of;
use shelf_logging::{shelf_debug, shelf_warn};
use thiserror::Error;

use crate::decode::decode_html;

pub use fulltext::FullTextStrategy;
pub use readability::ReadabilityStrategy;
pub use structural::StructuralStrategy;
pub use title::resolve_title;

/// Results shorter than this are not worth a PDF.
pub const MIN_CONTENT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub content_html: String,
    pub url: String,
    pub domain: String,
    /// Name of the strategy that produced `content_html`.
    pub strategy: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("could not extract article content from this URL ({url})")]
    NoContent { url: String },
}

/// Failure inside a single strategy. Never escapes the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("invalid selector `{css}`: {message}")]
    Selector { css: String, message: String },
    #[error("strategy panicked: {0}")]
    Panicked(String),
}

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "nothing usable here", not an error.
    fn extract_content(&self, html: &str) -> Result<Option<String>, StrategyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// structural -> readability -> full-text
    #[default]
    Standard,
    /// readability -> full-text -> body
    Strict,
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown extraction mode `{other}`")),
        }
    }
}

pub struct ExtractionChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ExtractionChain {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Structural search first, then readability and full-text.
    ///
    /// Structural ends in the `<body>` fallback, so the later strategies only
    /// run when the body itself has no visible text. Scored extraction over
    /// pages with a misleading first container is the strict chain's job.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(StructuralStrategy::new()),
            Box::new(ReadabilityStrategy::default()),
            Box::new(FullTextStrategy::default()),
        ])
    }

    /// Readability, then full-text, then the bare `<body>`.
    pub fn strict() -> Self {
        Self::new(vec![
            Box::new(ReadabilityStrategy::default()),
            Box::new(FullTextStrategy::default()),
            Box::new(StructuralStrategy::body_fallback()),
        ])
    }

    pub fn for_mode(mode: ExtractionMode) -> Self {
        match mode {
            ExtractionMode::Standard => Self::standard(),
            ExtractionMode::Strict => Self::strict(),
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extracts title and content from already-decoded HTML.
    pub fn extract(&self, html: &str, source_url: &str) -> Result<ExtractedArticle, ExtractionError> {
        let title = guarded("title", || Ok(Some(resolve_title(&Html::parse_document(html)))))
            .ok()
            .flatten()
            .unwrap_or_else(|| shelf_core::UNTITLED.to_string());

        for strategy in &self.strategies {
            match guarded(strategy.name(), || strategy.extract_content(html)) {
                Ok(Some(content)) if dom::has_visible_text(&content) => {
                    shelf_debug!(
                        "{} produced {} chars for {}",
                        strategy.name(),
                        content.len(),
                        source_url
                    );
                    return Ok(ExtractedArticle {
                        title,
                        content_html: content,
                        url: source_url.to_string(),
                        domain: domain_of(source_url),
                        strategy: strategy.name(),
                    });
                }
                Ok(_) => shelf_debug!("{} found no content in {}", strategy.name(), source_url),
                Err(err) => shelf_debug!("{} failed on {}: {}", strategy.name(), source_url, err),
            }
        }

        Err(ExtractionError::NoContent {
            url: source_url.to_string(),
        })
    }

    /// Decodes fetched bytes, then extracts.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        source_url: &str,
    ) -> Result<ExtractedArticle, ExtractionError> {
        let decoded = decode_html(bytes, content_type);
        if decoded.had_errors {
            shelf_debug!(
                "{} had malformed {} sequences; replaced",
                source_url,
                decoded.encoding_label
            );
        }
        self.extract(&decoded.html, source_url)
    }
}

impl Default for ExtractionChain {
    fn default() -> Self {
        Self::standard()
    }
}

/// Extracts with the standard chain.
pub fn extract_article(html: &str, source_url: &str) -> Result<ExtractedArticle, ExtractionError> {
    ExtractionChain::standard().extract(html, source_url)
}

// Parsers are third-party code fed hostile input; a panic in one strategy
// must not take the whole chain down.
fn guarded<T>(
    name: &str,
    run: impl FnOnce() -> Result<T, StrategyError>,
) -> Result<T, StrategyError> {
    panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        shelf_warn!("{} panicked: {}", name, message);
        Err(StrategyError::Panicked(message))
    })
}
