use regex::Regex;
use std::sync::OnceLock;

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"))
}

fn url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://(?:[a-zA-Z0-9$-_@.&+!*\\(),]|%[0-9a-fA-F]{2})+").expect("static regex")
    })
}

fn disallowed_char() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s.,?'\-]").expect("static regex"))
}

/// Clean a free-text description: drop HTML tags, then URLs, then any
/// character that is not a word character, whitespace or `. , ? ' -`, and
/// trim. Applying it twice gives the same text.
pub fn sanitize_description(text: &str) -> String {
    let without_tags = html_tag().replace_all(text, "");
    let without_urls = url().replace_all(&without_tags, "");
    let cleaned = disallowed_char().replace_all(&without_urls, "");
    cleaned.trim().to_string()
}
