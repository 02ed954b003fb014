/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Lowercase alphanumeric slug with single dashes, used in URL fragments
/// and template keys. Non-ASCII letters are kept.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(261.7), "04:21");
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("What is 2 + 2?"), "what-is-2-2");
        assert_eq!(slugify("  Derivatives: Intro "), "derivatives-intro");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Что такое 2+2?"), "что-такое-2-2");
        assert_eq!(slugify("微分 入門"), "微分-入門");
    }
}
