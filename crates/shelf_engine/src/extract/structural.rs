use scraper::Html;

use super::dom::{has_visible_text, selector, strip_non_content};
use super::{ExtractionStrategy, StrategyError};

/// Content roots tried in order before falling back to `<body>`.
const CONTENT_ROOTS: &[&str] = &[
    "article",
    "main",
    "div.content",
    "div.post",
    "div.entry",
    "div.post-content",
    ".article-body",
];

/// Picks the first semantic or conventionally-classed content container.
///
/// A container with no visible text once scripts are stripped is passed over
/// and the search moves on to the next selector.
///
/// With `body_only` the container search is skipped and the strategy only
/// offers the `<body>`, which is how the strict chain uses it as a last resort.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralStrategy {
    body_only: bool,
}

impl StructuralStrategy {
    pub fn new() -> Self {
        Self { body_only: false }
    }

    pub fn body_fallback() -> Self {
        Self { body_only: true }
    }
}

impl ExtractionStrategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        if self.body_only {
            "structural-body"
        } else {
            "structural"
        }
    }

    fn extract_content(&self, html: &str) -> Result<Option<String>, StrategyError> {
        let mut doc = Html::parse_document(html);
        strip_non_content(&mut doc)?;

        let roots: &[&str] = if self.body_only { &[] } else { CONTENT_ROOTS };
        for css in roots {
            let sel = selector(css)?;
            if let Some(found) = doc.select(&sel).next() {
                let fragment = found.html();
                if has_visible_text(&fragment) {
                    return Ok(Some(fragment));
                }
            }
        }
        let body = selector("body")?;
        Ok(Some(match doc.select(&body).next() {
            Some(found) => found.html(),
            None => doc.html(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_beats_main_and_body() {
        let html = "<html><body><main><p>main</p></main><article><p>story</p></article></body></html>";
        let out = StructuralStrategy::new().extract_content(html).unwrap().unwrap();
        assert!(out.starts_with("<article>"));
        assert!(out.contains("story"));
        assert!(!out.contains("main"));
    }

    #[test]
    fn class_selectors_follow_priority_list() {
        let html = r#"<html><body><div class="entry">entry</div><div class="post">post</div></body></html>"#;
        let out = StructuralStrategy::new().extract_content(html).unwrap().unwrap();
        assert_eq!(out, r#"<div class="post">post</div>"#);
    }

    #[test]
    fn empty_container_is_passed_over() {
        let html = r#"<html><body><article><script>embed()</script></article><main>  </main><div class="content"><p>note</p></div></body></html>"#;
        let out = StructuralStrategy::new().extract_content(html).unwrap().unwrap();
        assert_eq!(out, r#"<div class="content"><p>note</p></div>"#);
    }

    #[test]
    fn body_fallback_ignores_containers() {
        let html = "<html><body><article>a</article><p>b</p></body></html>";
        let out = StructuralStrategy::body_fallback().extract_content(html).unwrap().unwrap();
        assert!(out.starts_with("<body>"));
        assert!(out.contains("<p>b</p>"));
    }
}
