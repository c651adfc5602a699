//! Caption extraction from message bodies.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)] // Pattern is a compile-time constant
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("valid bracket pattern"));

/// Cleans body text for display under a picture.
///
/// Line breaks are removed and bracketed runs such as `[image: IMG_001.jpg]`,
/// which mail clients insert for inline content, become a single space.
#[must_use]
pub fn clean_caption(text: &str) -> String {
    let joined = text.replace("\r\n", "");
    BRACKETED.replace_all(&joined, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_caption_strips_brackets() {
        assert_eq!(
            clean_caption("Happy birthday![image: cake.jpg]\r\nLove, G"),
            "Happy birthday! Love, G"
        );
    }

    #[test]
    fn test_clean_caption_non_greedy() {
        assert_eq!(clean_caption("[a]mid[b]"), " mid ");
    }

    #[test]
    fn test_clean_caption_plain() {
        assert_eq!(clean_caption("just text"), "just text");
        assert_eq!(clean_caption(""), "");
    }
}
