//! Missing-data tokens.
//!
//! Two kinds of "no form" must never be collapsed: `?` means nobody has coded
//! this cell yet, `-` means the source attests that the language has no such
//! word. Other non-empty values without letters or digits (`/`, `–`) are read
//! as absence too.

pub const UNKNOWN: &str = "?";
pub const ABSENT: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaKind {
    /// Not coded: skipped on import, never given a cognateset.
    Unknown,
    /// Attested absence: a real, codable value.
    Absent,
}

/// Classify a value; `None` means it is an ordinary form.
pub fn classify(value: &str) -> Option<NaKind> {
    let value = value.trim();
    if value.is_empty() || value == UNKNOWN {
        Some(NaKind::Unknown)
    } else if !value.chars().any(char::is_alphanumeric) {
        Some(NaKind::Absent)
    } else {
        None
    }
}

/// Whether a (possibly missing) transcription counts as not coded.
pub fn is_uncoded(value: Option<&str>) -> bool {
    value.map_or(true, |v| classify(v) == Some(NaKind::Unknown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_mark_and_blank_are_unknown() {
        assert_eq!(classify("?"), Some(NaKind::Unknown));
        assert_eq!(classify("  "), Some(NaKind::Unknown));
        assert!(is_uncoded(None));
    }

    #[test]
    fn dash_and_punctuation_are_absence() {
        assert_eq!(classify("-"), Some(NaKind::Absent));
        assert_eq!(classify("–"), Some(NaKind::Absent));
        assert_eq!(classify("/"), Some(NaKind::Absent));
        assert!(!is_uncoded(Some("-")));
    }

    #[test]
    fn forms_are_not_na() {
        assert_eq!(classify("ɓɛ́sɛ̃(nk)"), None);
        assert_eq!(classify("-ba"), None);
    }
}
