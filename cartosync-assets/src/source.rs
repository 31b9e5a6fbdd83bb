//! Classification of image references.

use camino::Utf8Path;

const INLINE_PREFIX: &str = "data:image";

/// Where an image reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// A `data:image/...` URI carrying the encoded bytes.
    Inline(&'a str),
    /// An `http://` or `https://` URL.
    Remote(&'a str),
    /// A filesystem path.
    Local(&'a Utf8Path),
}

impl<'a> ImageSource<'a> {
    /// Classify `reference` by prefix. Matching is case-sensitive and
    /// everything that is neither inline nor remote is treated as a path.
    #[must_use]
    pub fn classify(reference: &'a str) -> Self {
        if reference.starts_with(INLINE_PREFIX) {
            Self::Inline(reference)
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            Self::Remote(reference)
        } else {
            Self::Local(Utf8Path::new(reference))
        }
    }

    /// Short name for log messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Inline(_) => "inline",
            Self::Remote(_) => "remote",
            Self::Local(_) => "local",
        }
    }
}

/// Base64 payload of an inline data URI: everything after the first comma.
pub(crate) fn inline_payload(reference: &str) -> Option<&str> {
    reference.split_once(',').map(|(_, payload)| payload.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("data:image/png;base64,AAAA", "inline")]
    #[case("https://example.org/pin.png", "remote")]
    #[case("http://example.org/pin.png", "remote")]
    #[case("assets/pin.png", "local")]
    #[case("/var/icons/pin.png", "local")]
    #[case("HTTPS://example.org/pin.png", "local")]
    #[case("data:text/plain,hello", "local")]
    fn classifies_by_prefix(#[case] reference: &str, #[case] expected: &str) {
        assert_eq!(ImageSource::classify(reference).kind(), expected);
    }

    #[rstest]
    fn local_keeps_the_path_verbatim() {
        assert_eq!(
            ImageSource::classify("icons/a b.png"),
            ImageSource::Local(Utf8Path::new("icons/a b.png"))
        );
    }

    #[rstest]
    #[case("data:image/png;base64,QUJD", Some("QUJD"))]
    #[case("data:image/png;base64, QUJD\n", Some("QUJD"))]
    #[case("data:image/png;base64", None)]
    fn extracts_inline_payload(#[case] reference: &str, #[case] expected: Option<&str>) {
        assert_eq!(inline_payload(reference), expected);
    }
}
