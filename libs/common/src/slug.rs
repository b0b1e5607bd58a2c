//! URL slugs for forum posts.

use chrono::{DateTime, Utc};

/// Maximum length of the title-derived part of a slug, in characters.
pub const MAX_SLUG_BASE_CHARS: usize = 200;

/// Derive the title part of a slug.
///
/// Keeps ASCII lowercase letters, digits, Hangul syllables, whitespace and
/// hyphens; whitespace runs become a single hyphen, hyphen runs collapse and
/// leading/trailing hyphens are dropped before truncation.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
            continue;
        }
        if !is_slug_char(c) {
            continue;
        }
        if pending_hyphen && !out.is_empty() {
            out.push('-');
        }
        pending_hyphen = false;
        out.push(c);
    }

    out.chars().take(MAX_SLUG_BASE_CHARS).collect()
}

/// Build a post slug from its title, suffixed with the creation time in
/// milliseconds so that posts with identical titles stay distinct.
///
/// The hyphen is always present, so a title with no slug characters yields
/// `-<millis>`.
pub fn post_slug(title: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", slugify(title), at.timestamp_millis())
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn strips_punctuation_and_collapses_separators() {
        assert_eq!(slugify("  Rust -- is, great!!  "), "rust-is-great");
        assert_eq!(slugify("a - - b"), "a-b");
    }

    #[test]
    fn keeps_hangul() {
        assert_eq!(slugify("약사 커뮤니티 공지"), "약사-커뮤니티-공지");
    }

    #[test]
    fn drops_other_scripts() {
        assert_eq!(slugify("café ünïcode"), "caf-ncode");
    }

    #[test]
    fn truncates_to_limit() {
        let long = "a".repeat(500);
        assert_eq!(slugify(&long).chars().count(), MAX_SLUG_BASE_CHARS);
    }

    #[test]
    fn post_slug_appends_timestamp() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(post_slug("First Post", at), "first-post-1700000000123");
    }

    #[test]
    fn post_slug_keeps_hyphen_for_empty_title_part() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(post_slug("!!!", at), "-1700000000123");
        assert_eq!(post_slug("", at), "-1700000000123");
    }
}
