use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("URL is required")]
    Missing,
    #[error("Invalid URL scheme")]
    InvalidScheme,
}

/// Checks a user-submitted URL before any network work is done.
///
/// Returns the trimmed URL. Only `http://` and `https://` are accepted.
pub fn validate_submitted_url(raw: &str) -> Result<String, SubmissionError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(SubmissionError::Missing);
    }
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(SubmissionError::InvalidScheme);
    }
    Ok(url.to_string())
}
