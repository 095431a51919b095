use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use super::StrategyError;

/// Elements that never carry article text, or would pull external resources into the PDF.
pub(crate) const NON_CONTENT: &str = "script, style, nav, header, footer, noscript, iframe, link";

pub(crate) fn selector(css: &str) -> Result<Selector, StrategyError> {
    Selector::parse(css).map_err(|err| StrategyError::Selector {
        css: css.to_string(),
        message: format!("{err:?}"),
    })
}

/// Detaches every element matching [`NON_CONTENT`] from the tree.
pub(crate) fn strip_non_content(doc: &mut Html) -> Result<usize, StrategyError> {
    let sel = selector(NON_CONTENT)?;
    let ids: Vec<NodeId> = doc.select(&sel).map(|el| el.id()).collect();
    for id in &ids {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    Ok(ids.len())
}

/// Element text with runs of whitespace collapsed to single spaces.
pub(crate) fn normalized_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Share of the element's text that sits inside links, from 0.0 to 1.0.
pub(crate) fn link_density(element: ElementRef<'_>, links: &Selector) -> f64 {
    let total = normalized_text(element).chars().count();
    if total == 0 {
        return 0.0;
    }
    let linked: usize = element
        .select(links)
        .map(|a| normalized_text(a).chars().count())
        .sum();
    (linked as f64 / total as f64).min(1.0)
}

/// True when an HTML fragment renders at least one non-whitespace character.
pub(crate) fn has_visible_text(fragment: &str) -> bool {
    let parsed = Html::parse_fragment(fragment);
    let mut text = parsed.root_element().text();
    text.any(|t| !t.trim().is_empty())
}
