use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Network unreachable: {0}")]
    Unreachable(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "unknown url".to_string());
            NetworkError::Timeout(url)
        } else {
            NetworkError::Transport(err)
        }
    }
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
pub(crate) fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= MAX_ERROR_BODY_LENGTH {
        return text.into_owned();
    }
    let mut cut = MAX_ERROR_BODY_LENGTH;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &text[..cut], body.len())
}
