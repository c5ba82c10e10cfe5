use serde::{Deserialize, Serialize};
use url::Url;

/// Opaque identifier for one piece of displayed content.
///
/// Derived deterministically from the host page's address; stable while that
/// content stays on screen and different exactly when the content changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the content identifier from a host address, if it has one.
///
/// Three address shapes carry an identifier: a `v` query parameter on a watch
/// page, a short-host path (`youtu.be/<id>`), and an `/embed/<id>` path.
/// Anything else resolves to `None` and the caller skips evaluation.
#[must_use]
pub fn derive(address: &str) -> Option<ContentId> {
    let url = Url::parse(address).ok()?;

    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "v") {
        return non_empty(&value);
    }

    let host = url.host_str()?;
    let mut segments = url.path_segments()?;

    if host.eq_ignore_ascii_case("youtu.be") {
        return non_empty(segments.next().unwrap_or_default());
    }

    while let Some(segment) = segments.next() {
        if segment == "embed" {
            return non_empty(segments.next().unwrap_or_default());
        }
    }

    None
}

fn non_empty(raw: &str) -> Option<ContentId> {
    if raw.is_empty() {
        None
    } else {
        Some(ContentId::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_from_watch_query_param() {
        let id = derive("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn derives_from_query_param_with_extra_params() {
        let id = derive("https://www.youtube.com/watch?t=42&v=abc123&list=PL1").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn derives_from_short_host() {
        let id = derive("https://youtu.be/abc123?t=9").unwrap();
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn derives_from_embed_path() {
        let id = derive("https://www.youtube.com/embed/xyz789?autoplay=1").unwrap();
        assert_eq!(id.as_str(), "xyz789");
    }

    #[test]
    fn browse_page_has_no_identifier() {
        assert!(derive("https://www.youtube.com/feed/subscriptions").is_none());
    }

    #[test]
    fn empty_identifier_is_rejected() {
        assert!(derive("https://www.youtube.com/watch?v=").is_none());
        assert!(derive("https://youtu.be/").is_none());
    }

    #[test]
    fn garbage_address_is_rejected() {
        assert!(derive("not a url at all").is_none());
    }

    #[test]
    fn same_content_same_identifier() {
        let a = derive("https://www.youtube.com/watch?v=abc123").unwrap();
        let b = derive("https://youtu.be/abc123").unwrap();
        assert_eq!(a, b);
    }
}
