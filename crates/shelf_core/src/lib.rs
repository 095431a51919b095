//! Shelf core: the article data model and pure reading-list helpers.
mod record;
mod submission;
mod view_model;

pub use record::{domain_of, sort_newest_first, ArticleRecord, UNTITLED};
pub use submission::{validate_submitted_url, SubmissionError};
pub use view_model::{
    download_filename, format_saved_date, ArticleRowView, ReadingListPage, PER_PAGE,
};
