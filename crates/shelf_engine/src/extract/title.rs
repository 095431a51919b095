use scraper::Html;
use shelf_core::UNTITLED;
use shelf_logging::shelf_debug;

use super::dom::{normalized_text, selector};
use super::StrategyError;

type TitleLookup = fn(&Html) -> Result<Option<String>, StrategyError>;

/// `<title>` -> first `<h1>` -> `og:title` -> "Untitled".
///
/// A lookup that fails is skipped, as is one that finds only whitespace.
pub fn resolve_title(doc: &Html) -> String {
    const LOOKUPS: [(&str, TitleLookup); 3] = [
        ("title", title_tag),
        ("h1", first_heading),
        ("og:title", open_graph_title),
    ];

    for (name, lookup) in LOOKUPS {
        match lookup(doc) {
            Ok(Some(title)) => return title,
            Ok(None) => {}
            Err(err) => shelf_debug!("title lookup {} failed: {}", name, err),
        }
    }
    UNTITLED.to_string()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn title_tag(doc: &Html) -> Result<Option<String>, StrategyError> {
    let sel = selector("title")?;
    Ok(doc
        .select(&sel)
        .next()
        .and_then(|t| non_empty(&t.text().collect::<String>())))
}

fn first_heading(doc: &Html) -> Result<Option<String>, StrategyError> {
    let sel = selector("h1")?;
    Ok(doc
        .select(&sel)
        .next()
        .and_then(|h1| non_empty(&normalized_text(h1))))
}

fn open_graph_title(doc: &Html) -> Result<Option<String>, StrategyError> {
    let sel = selector(r#"meta[property="og:title"]"#)?;
    Ok(doc
        .select(&sel)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(non_empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_of(html: &str) -> String {
        resolve_title(&Html::parse_document(html))
    }

    #[test]
    fn title_tag_is_trimmed() {
        assert_eq!(
            title_of("<html><head><title>\n  Hello World \t</title></head><body><h1>H</h1></body></html>"),
            "Hello World"
        );
    }

    #[test]
    fn blank_title_falls_through_to_h1() {
        assert_eq!(
            title_of("<html><head><title>   </title></head><body><h1> Big <em>news</em> </h1></body></html>"),
            "Big news"
        );
    }

    #[test]
    fn open_graph_is_third_choice() {
        let html = r#"<html><head><meta property="og:title" content=" From OG "></head><body><p>x</p></body></html>"#;
        assert_eq!(title_of(html), "From OG");
    }

    #[test]
    fn untitled_when_nothing_matches() {
        assert_eq!(title_of("<html><body><p>text</p></body></html>"), UNTITLED);
    }
}
