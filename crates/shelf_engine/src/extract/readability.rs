use std::collections::HashMap;
use std::sync::OnceLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::dom::{link_density, normalized_text, selector, strip_non_content};
use super::{ExtractionStrategy, StrategyError, MIN_CONTENT_CHARS};

const MIN_PARAGRAPH_CHARS: usize = 25;
const CLASS_WEIGHT: f64 = 25.0;

const POSITIVE_PATTERNS: &str =
    r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story)";
const NEGATIVE_PATTERNS: &str = r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|share|social)";

/// Readability-style scoring: paragraphs vote for their parent and grandparent
/// containers, and the highest scoring container wins.
///
/// The winner is discarded when its serialized HTML is shorter than
/// `min_chars`.
#[derive(Debug, Clone, Copy)]
pub struct ReadabilityStrategy {
    min_chars: usize,
}

impl Default for ReadabilityStrategy {
    fn default() -> Self {
        Self {
            min_chars: MIN_CONTENT_CHARS,
        }
    }
}

impl ReadabilityStrategy {
    pub fn with_min_chars(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl ExtractionStrategy for ReadabilityStrategy {
    fn name(&self) -> &'static str {
        "readability"
    }

    fn extract_content(&self, html: &str) -> Result<Option<String>, StrategyError> {
        let mut doc = Html::parse_document(html);
        strip_non_content(&mut doc)?;

        let paragraphs = selector("p, pre, td")?;
        let links = selector("a")?;

        // Document order of first vote, so ties resolve to the earliest container.
        let mut order: Vec<NodeId> = Vec::new();
        let mut scores: HashMap<NodeId, f64> = HashMap::new();
        let mut vote = |container: ElementRef<'_>, points: f64| {
            let score = scores.entry(container.id()).or_insert_with(|| {
                order.push(container.id());
                initial_score(container)
            });
            *score += points;
        };

        for paragraph in doc.select(&paragraphs) {
            let text = normalized_text(paragraph);
            let len = text.chars().count();
            if len < MIN_PARAGRAPH_CHARS {
                continue;
            }
            let points = 1.0 + text.matches(',').count() as f64 + (len / 100).min(3) as f64;

            let parent = paragraph.parent().and_then(ElementRef::wrap);
            let grandparent = parent.and_then(|p| p.parent()).and_then(ElementRef::wrap);
            if let Some(parent) = parent {
                vote(parent, points);
            }
            if let Some(grandparent) = grandparent {
                vote(grandparent, points / 2.0);
            }
        }

        let mut best: Option<(ElementRef<'_>, f64)> = None;
        for id in order {
            let Some(container) = doc.tree.get(id).and_then(ElementRef::wrap) else {
                continue;
            };
            let score = scores[&id] * (1.0 - link_density(container, &links));
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((container, score));
            }
        }

        let Some((winner, _)) = best else {
            return Ok(None);
        };
        let content = winner.html();
        if content.chars().count() < self.min_chars {
            return Ok(None);
        }
        Ok(Some(content))
    }
}

fn initial_score(element: ElementRef<'_>) -> f64 {
    let base = match element.value().name() {
        "article" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    base + class_weight(element)
}

fn class_weight(element: ElementRef<'_>) -> f64 {
    static POSITIVE: OnceLock<Option<Regex>> = OnceLock::new();
    static NEGATIVE: OnceLock<Option<Regex>> = OnceLock::new();
    let (Some(positive), Some(negative)) = (
        POSITIVE.get_or_init(|| Regex::new(POSITIVE_PATTERNS).ok()),
        NEGATIVE.get_or_init(|| Regex::new(NEGATIVE_PATTERNS).ok()),
    ) else {
        return 0.0;
    };

    let mut weight = 0.0;
    for attr in ["id", "class"] {
        if let Some(value) = element.value().attr(attr) {
            if negative.is_match(value) {
                weight -= CLASS_WEIGHT;
            }
            if positive.is_match(value) {
                weight += CLASS_WEIGHT;
            }
        }
    }
    weight
}
