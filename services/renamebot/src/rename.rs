//! Filename computation. Everything here is pure so the rename pipeline can
//! be tested without touching Telegram or Redis.

use std::sync::LazyLock;

use regex::Regex;

/// Characters Telegram-side filesystems cannot digest; a requested name
/// containing any of them is rejected outright.
pub const INVALID_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[(][^\])]*[\])]").expect("bracketed regex"));
static QUALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(480p|720p|1080p|2160p|4k|x264|x265|h\.?264|h\.?265|hevc|avc|web-?dl|web-?rip|bd-?rip|br-?rip|dvd-?rip|hd-?rip|blu-?ray|aac|dts|10bit|8bit)\b",
    )
    .expect("quality regex")
});
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[._\-]+").expect("separator regex"));

/// Tokens flagged by `/analyze` as rename candidates.
const ANALYZE_TOKENS: [&str; 7] = ["720p", "1080p", "x264", "x265", "hevc", "webrip", "bdrip"];

pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains(INVALID_FILENAME_CHARS)
}

/// Splits `movie.mkv` into `("movie", ".mkv")`. A name without a usable
/// extension comes back whole, with an empty extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem, &name[stem.len()..])
        }
        _ => (name, ""),
    }
}

/// Parses the pipe-separated `find[:replace]` rule string. Each pair splits
/// on its FIRST colon; a missing replacement means deletion. Pairs with an
/// empty find part are dropped.
pub fn parse_remove_rules(rule: &str) -> Vec<(&str, &str)> {
    rule.split('|')
        .filter_map(|pair| {
            let (find, replace) = match pair.split_once(':') {
                Some((find, replace)) => (find, replace),
                None => (pair, ""),
            };
            (!find.is_empty()).then_some((find, replace))
        })
        .collect()
}

fn apply_remove_rules(stem: &str, rules: &[(&str, &str)]) -> String {
    let mut out = stem.to_string();
    for (find, replace) in rules {
        out = out.replace(find, replace);
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pattern-based rename: remove/replace rules on the name portion, then
/// whitespace collapse, then prefix and suffix. The extension is preserved.
pub fn build_auto_name(
    filename: &str,
    prefix: Option<&str>,
    suffix: Option<&str>,
    remove_rule: Option<&str>,
) -> String {
    let (stem, ext) = split_extension(filename);
    let mut stem = stem.to_string();

    if let Some(rule) = remove_rule {
        stem = apply_remove_rules(&stem, &parse_remove_rules(rule));
    }
    let mut stem = collapse_whitespace(&stem);

    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        stem = format!("{prefix} {stem}");
    }
    if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
        stem = format!("{stem} {suffix}");
    }

    format!("{}{}", stem.trim(), ext)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Heuristic "AI" rename: strips bracketed release tags, quality/codec
/// tokens and years, collapses separators, drops short filler words and
/// title-cases the rest. Falls back to the original name when the cleanup
/// leaves nothing.
pub fn ai_suggest_name(filename: &str) -> String {
    let (stem, ext) = split_extension(filename);

    let cleaned = BRACKETED.replace_all(stem, " ");
    let cleaned = QUALITY.replace_all(&cleaned, " ");
    let cleaned = YEAR.replace_all(&cleaned, " ");
    let cleaned = SEPARATORS.replace_all(&cleaned, " ");

    let words: Vec<String> = cleaned
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .map(title_case)
        .collect();

    if words.is_empty() {
        filename.to_string()
    } else {
        format!("{}{}", words.join(" "), ext)
    }
}

/// Findings for `/analyze`: empty means the name looks fine.
pub fn analyze_filename(name: &str) -> Vec<String> {
    let mut findings = Vec::new();

    if name.len() > 100 {
        findings.push("Filename is too long".to_string());
    }
    if name.contains("..") {
        findings.push("Contains double dots".to_string());
    }
    if name.matches('.').count() > 1 {
        findings.push("Multiple extensions detected".to_string());
    }

    let lowered = name.to_lowercase();
    for token in ANALYZE_TOKENS {
        if lowered.contains(token) {
            findings.push(format!("Contains '{token}' - consider removing"));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_suffix_wrap_the_stem() {
        assert_eq!(
            build_auto_name("movie.mkv", Some("[HD]"), Some("@Channel"), None),
            "[HD] movie @Channel.mkv"
        );
    }

    #[test]
    fn remove_rules_replace_and_delete_in_order() {
        assert_eq!(
            build_auto_name("the apple pie.mkv", None, None, Some("apple:banana|the:")),
            "banana pie.mkv"
        );
    }

    #[test]
    fn rules_split_on_the_first_colon_only() {
        // "sun:a:b" replaces "sun" with the literal "a:b"
        assert_eq!(parse_remove_rules("sun:a:b"), vec![("sun", "a:b")]);
        // a pair without a colon is a plain removal
        assert_eq!(parse_remove_rules("junk"), vec![("junk", "")]);
    }

    #[test]
    fn empty_finds_are_ignored() {
        assert_eq!(parse_remove_rules("|:x|a:b"), vec![("a", "b")]);
    }

    #[test]
    fn removal_rules_are_idempotent_when_not_reentrant() {
        let rule = Some("WEBRip:|x264:");
        let once = build_auto_name("show WEBRip x264.mkv", None, None, rule);
        let twice = build_auto_name(&once, None, None, rule);
        assert_eq!(once, twice);
        assert_eq!(once, "show.mkv");
    }

    #[test]
    fn reentrant_rules_are_not_idempotent() {
        // the replacement reintroduces the find pattern
        let rule = Some("a:aa");
        let once = build_auto_name("cat.mkv", None, None, rule);
        let twice = build_auto_name(&once, None, None, rule);
        assert_eq!(once, "caat.mkv");
        assert_ne!(once, twice);
    }

    #[test]
    fn the_extension_is_never_rewritten() {
        // a rule matching the extension must not touch it
        assert_eq!(
            build_auto_name("mkv collection.mkv", None, None, Some("mkv:")),
            "collection.mkv"
        );
    }

    #[test]
    fn whitespace_collapses_after_removal() {
        assert_eq!(
            build_auto_name("a  b   c.mp4", None, None, Some("b:")),
            "a c.mp4"
        );
    }

    #[test]
    fn names_without_extension_survive() {
        assert_eq!(build_auto_name("README", Some("[x]"), None, None), "[x] README");
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
    }

    #[test]
    fn reserved_characters_are_rejected() {
        for ch in super::INVALID_FILENAME_CHARS {
            let name = format!("movie{ch}.mkv");
            assert!(!is_valid_filename(&name), "{name:?} should be invalid");
        }
        assert!(!is_valid_filename(""));
        assert!(is_valid_filename("movie (2020).mkv"));
    }

    #[test]
    fn ai_cleanup_strips_release_noise() {
        assert_eq!(
            ai_suggest_name("The.Movie.2020.1080p.WEBRip.x264.mkv"),
            "The Movie.mkv"
        );
        assert_eq!(
            ai_suggest_name("[Group] Some_Show - HEVC.mkv"),
            "Some Show.mkv"
        );
    }

    #[test]
    fn ai_falls_back_when_nothing_is_left() {
        assert_eq!(ai_suggest_name("1080p.mkv"), "1080p.mkv");
    }

    #[test]
    fn analyze_flags_known_issues() {
        let findings = analyze_filename("Movie..2020.1080p.mkv");
        assert!(findings.iter().any(|f| f.contains("double dots")));
        assert!(findings.iter().any(|f| f.contains("Multiple extensions")));
        assert!(findings.iter().any(|f| f.contains("1080p")));
        assert!(analyze_filename("movie.mkv").is_empty());
    }
}
