use scraper::{ElementRef, Html};

use super::dom::{link_density, normalized_text, selector, strip_non_content};
use super::{ExtractionStrategy, StrategyError, MIN_CONTENT_CHARS};

const CONTAINERS: &str = "div, section, article, main, td, body";
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "pre", "blockquote", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "figure",
];

/// Text-density pick: the container whose direct paragraph-like children hold
/// the most non-link text.
#[derive(Debug, Clone, Copy)]
pub struct FullTextStrategy {
    min_chars: usize,
}

impl Default for FullTextStrategy {
    fn default() -> Self {
        Self {
            min_chars: MIN_CONTENT_CHARS,
        }
    }
}

impl ExtractionStrategy for FullTextStrategy {
    fn name(&self) -> &'static str {
        "full-text"
    }

    fn extract_content(&self, html: &str) -> Result<Option<String>, StrategyError> {
        let mut doc = Html::parse_document(html);
        strip_non_content(&mut doc)?;

        let containers = selector(CONTAINERS)?;
        let links = selector("a")?;

        let mut best: Option<(ElementRef<'_>, f64)> = None;
        for container in doc.select(&containers) {
            let direct_text: usize = container
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| {
                    let name = child.value().name();
                    PARAGRAPH_TAGS.iter().any(|tag| *tag == name)
                })
                .map(|child| normalized_text(child).chars().count())
                .sum();
            if direct_text == 0 {
                continue;
            }
            let weighted = direct_text as f64 * (1.0 - link_density(container, &links));
            if best.map_or(true, |(_, top)| weighted > top) {
                best = Some((container, weighted));
            }
        }

        match best {
            Some((winner, weighted)) if weighted >= self.min_chars as f64 => {
                Ok(Some(winner.html()))
            }
            _ => Ok(None),
        }
    }
}
