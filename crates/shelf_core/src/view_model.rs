use chrono::{DateTime, NaiveDateTime};

use crate::record::{sort_newest_first, ArticleRecord};

/// Rows shown per reading-list page.
pub const PER_PAGE: usize = 20;

const MAX_DOWNLOAD_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRowView {
    pub id: String,
    pub title: String,
    pub domain: String,
    pub url: String,
    pub formatted_date: String,
}

/// One page of the reading list, newest articles first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingListPage {
    pub rows: Vec<ArticleRowView>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl ReadingListPage {
    /// Builds page `requested` (1-based, clamped into range) of `records`.
    pub fn build(mut records: Vec<ArticleRecord>, requested: usize) -> Self {
        sort_newest_first(&mut records);

        let total = records.len();
        let total_pages = total.div_ceil(PER_PAGE).max(1);
        let page = requested.clamp(1, total_pages);

        let rows = records
            .into_iter()
            .skip((page - 1) * PER_PAGE)
            .take(PER_PAGE)
            .map(|record| ArticleRowView {
                formatted_date: format_saved_date(&record.saved_at),
                id: record.id,
                title: record.title,
                domain: record.domain,
                url: record.url,
            })
            .collect();

        Self {
            rows,
            page,
            total_pages,
            total,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }
}

/// Formats a stored timestamp as `Jan 05, 2024`; unparseable input is returned as-is.
pub fn format_saved_date(saved_at: &str) -> String {
    const DISPLAY: &str = "%b %d, %Y";
    if let Ok(naive) = saved_at.parse::<NaiveDateTime>() {
        return naive.format(DISPLAY).to_string();
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(saved_at) {
        return zoned.format(DISPLAY).to_string();
    }
    saved_at.to_string()
}

/// Attachment filename for a downloaded PDF: the first 50 characters of the title.
pub fn download_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .take(MAX_DOWNLOAD_TITLE_CHARS)
        .map(|c| match c {
            '/' | '\\' | '"' | '\0'..='\u{1F}' => '_',
            other => other,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        "article.pdf".to_string()
    } else {
        format!("{stem}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_naive_and_zoned_timestamps() {
        assert_eq!(format_saved_date("2024-01-05T10:11:12.123456"), "Jan 05, 2024");
        assert_eq!(format_saved_date("2024-01-05T10:11:12"), "Jan 05, 2024");
        assert_eq!(format_saved_date("2023-11-30T22:00:00+02:00"), "Nov 30, 2023");
        assert_eq!(format_saved_date("yesterday"), "yesterday");
    }

    #[test]
    fn download_filename_truncates_and_sanitizes() {
        let long = "a".repeat(80);
        assert_eq!(download_filename(&long), format!("{}.pdf", "a".repeat(50)));
        assert_eq!(download_filename("Why \"X\" / Y"), "Why _X_ _ Y.pdf");
        assert_eq!(download_filename("   "), "article.pdf");
    }
}
