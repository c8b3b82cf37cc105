use bytes::Bytes;
use reqwest::StatusCode;

/// Body of the response served when neither the store nor the network can
/// answer and the fallback asset is missing too.
pub const NETWORK_ERROR_BODY: &str = "Network error happened";

/// A fully buffered HTTP response.
///
/// The body is `Bytes`, so reading it never consumes it and `clone` is a
/// reference count bump. Code that needs one copy for the store and one for
/// the caller still clones explicitly at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// The terminal fallback: 408 with a plain-text explanation.
    pub fn network_error() -> Self {
        Self::new(
            StatusCode::REQUEST_TIMEOUT,
            vec![("Content-Type".to_string(), "text/plain".to_string())],
            NETWORK_ERROR_BODY,
        )
    }

    /// Look up a header value, ignoring name case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Equality that ignores headers which change on every fetch.
    pub fn same_content(&self, other: &Response) -> bool {
        self.status == other.status
            && self.body == other.body
            && stable_headers(self) == stable_headers(other)
    }
}

/// Headers that differ between two fetches of the same resource.
const VOLATILE_HEADERS: [&str; 3] = ["date", "age", "expires"];

fn stable_headers(r: &Response) -> Vec<(String, &str)> {
    let mut headers: Vec<(String, &str)> = r
        .headers
        .iter()
        .filter(|(k, _)| !VOLATILE_HEADERS.iter().any(|v| k.eq_ignore_ascii_case(v)))
        .map(|(k, v)| (k.to_ascii_lowercase(), v.as_str()))
        .collect();
    headers.sort();
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_response() {
        let resp = Response::network_error();
        assert_eq!(resp.status.as_u16(), 408);
        assert_eq!(resp.content_type(), Some("text/plain"));
        assert!(!resp.body.is_empty());
        assert!(!resp.is_success());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let resp = Response::new(
            StatusCode::OK,
            vec![("content-type".to_string(), "image/png".to_string())],
            Bytes::new(),
        );
        assert_eq!(resp.header("Content-Type"), Some("image/png"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_same_content_ignores_date_header() {
        let a = Response::new(
            StatusCode::OK,
            vec![
                ("Date".to_string(), "Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
                ("Content-Type".to_string(), "text/html".to_string()),
            ],
            "<html></html>",
        );
        let mut b = a.clone();
        b.headers[0].1 = "Tue, 02 Jan 2024 00:00:00 GMT".to_string();
        assert!(a.same_content(&b));

        b.body = Bytes::from_static(b"<html>changed</html>");
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_same_content_header_order_and_case() {
        let a = Response::new(
            StatusCode::OK,
            vec![
                ("Content-Type".to_string(), "image/png".to_string()),
                ("ETag".to_string(), "\"abc\"".to_string()),
            ],
            "png",
        );
        let b = Response::new(
            StatusCode::OK,
            vec![
                ("etag".to_string(), "\"abc\"".to_string()),
                ("content-type".to_string(), "image/png".to_string()),
                ("Age".to_string(), "12".to_string()),
            ],
            "png",
        );
        assert!(a.same_content(&a.clone()));
        assert!(a.same_content(&b));

        let mut c = b.clone();
        c.headers[1].1 = "image/webp".to_string();
        assert!(!a.same_content(&c));
    }
}
