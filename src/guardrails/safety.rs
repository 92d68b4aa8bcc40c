/// Keywords that reject an agent output wherever they appear.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "illegal",
    "drugs",
    "weapons",
    "explicit",
    "offensive",
    "discriminatory",
];

/// First denylisted keyword found in `text`, case-insensitively.
pub fn find_sensitive_keyword(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    SENSITIVE_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lowered.contains(keyword))
}

pub fn is_content_safe(text: &str) -> bool {
    find_sensitive_keyword(text).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_substrings_case_insensitively() {
        assert_eq!(find_sensitive_keyword("No WEAPONS allowed"), Some("weapons"));
        assert_eq!(find_sensitive_keyword("an illegally parked car"), Some("illegal"));
        assert!(is_content_safe("Sunny beaches and tapas"));
    }
}
