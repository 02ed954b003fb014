//! URL fragment routing: `#<slug>`, `#<slug>/q`, or `#4m32s`.

use std::fmt;

use crate::duration::{format_duration_fragment, parse_duration};

const QUESTION_SUFFIX: &str = "/q";

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// No fragment: plain playback.
    Empty,
    /// A bare duration to seek to.
    Time(f64),
    Bookmark(String),
    Question(String),
}

impl Fragment {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().trim_start_matches('#').trim_matches('/');
        if raw.is_empty() {
            return Fragment::Empty;
        }

        if let Some(slug) = raw.strip_suffix(QUESTION_SUFFIX) {
            return Fragment::Question(slug.to_string());
        }

        let looks_like_time = raw.starts_with(|c: char| c.is_ascii_digit());
        if looks_like_time {
            if let Ok(seconds) = parse_duration(raw) {
                return Fragment::Time(seconds);
            }
        }

        Fragment::Bookmark(raw.to_string())
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Empty => Ok(()),
            Fragment::Time(seconds) => f.write_str(&format_duration_fragment(*seconds)),
            Fragment::Bookmark(slug) => f.write_str(slug),
            Fragment::Question(slug) => write!(f, "{slug}{QUESTION_SUFFIX}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_form() {
        assert_eq!(Fragment::parse(""), Fragment::Empty);
        assert_eq!(Fragment::parse("#"), Fragment::Empty);
        assert_eq!(Fragment::parse("#4m32s"), Fragment::Time(272.0));
        assert_eq!(
            Fragment::parse("adding-fractions"),
            Fragment::Bookmark("adding-fractions".into())
        );
        assert_eq!(
            Fragment::parse("#what-is-2-2/q"),
            Fragment::Question("what-is-2-2".into())
        );
    }

    #[test]
    fn digit_led_slugs_stay_bookmarks() {
        assert_eq!(
            Fragment::parse("3-ways-to-add"),
            Fragment::Bookmark("3-ways-to-add".into())
        );
    }

    #[test]
    fn displays_back_to_fragment() {
        assert_eq!(Fragment::Question("q".into()).to_string(), "q/q");
        assert_eq!(Fragment::Time(90.0).to_string(), "1m30s");
        assert_eq!(Fragment::Empty.to_string(), "");
    }
}
