use serde::{Deserialize, Serialize};
use url::Url;

/// Title used when nothing better could be found.
pub const UNTITLED: &str = "Untitled";

/// One persisted entry of the manifest.
///
/// Field names are the on-disk JSON keys and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub domain: String,
    /// Local ISO-8601 timestamp; lexicographic order is chronological order.
    pub saved_at: String,
    pub filename: String,
}

impl ArticleRecord {
    /// Blob filename for a record id.
    pub fn filename_for(id: &str) -> String {
        format!("{id}.pdf")
    }
}

/// Orders records for display: newest `saved_at` first.
pub fn sort_newest_first(records: &mut [ArticleRecord]) {
    records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
}

/// Host of `url` with a single leading `www.` removed.
///
/// Unparseable input is handled by cutting the authority out of the text, so
/// the result is always usable as a display label.
pub fn domain_of(url: &str) -> String {
    let host = match Url::parse(url) {
        Ok(parsed) => parsed.host_str().map(str::to_string),
        Err(_) => None,
    }
    .unwrap_or_else(|| authority_of(url).to_string());

    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

fn authority_of(raw: &str) -> &str {
    let trimmed = raw.trim();
    let after_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(after_scheme);
    let without_user = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);
    without_user
        .split(':')
        .next()
        .unwrap_or(without_user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_www_prefix() {
        assert_eq!(domain_of("https://www.example.com/a"), "example.com");
        assert_eq!(domain_of("https://www.www.example.com/a"), "www.example.com");
    }

    #[test]
    fn keeps_other_subdomains() {
        assert_eq!(domain_of("https://sub.example.com/a"), "sub.example.com");
        assert_eq!(domain_of("https://example.www.com/"), "example.www.com");
    }

    #[test]
    fn ignores_port_and_userinfo() {
        assert_eq!(domain_of("http://user:pw@www.example.com:8080/x"), "example.com");
    }

    #[test]
    fn unparseable_url_falls_back_to_text() {
        assert_eq!(domain_of("www.example.com/path"), "example.com");
        assert_eq!(domain_of("ftp//broken"), "ftp");
    }

    #[test]
    fn newest_first_orders_by_saved_at_descending() {
        let record = |id: &str, saved_at: &str| ArticleRecord {
            id: id.to_string(),
            title: id.to_string(),
            url: format!("https://example.com/{id}"),
            domain: "example.com".to_string(),
            saved_at: saved_at.to_string(),
            filename: ArticleRecord::filename_for(id),
        };
        let mut records = vec![
            record("b", "2024-01-02T08:00:00.000000"),
            record("c", "2024-03-01T08:00:00.000000"),
            record("a", "2023-12-31T23:59:59.999999"),
        ];
        sort_newest_first(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn filename_uses_id_stem() {
        assert_eq!(ArticleRecord::filename_for("abc"), "abc.pdf");
    }
}
