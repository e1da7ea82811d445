//! Generator reference stripping
//!
//! The text generator's own claims about provenance are never trusted:
//! any chapter/day/lab mention it produces is removed before the
//! engine's governed reference list is attached.

use regex::Regex;
use std::sync::OnceLock;

fn arrow_joined_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(day|chapter|lab)\s+\d+\s*(?:→|->)\s*(day|chapter|lab)\s+\d+\b")
            .unwrap()
    })
}

fn day_chapter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bday\s+\d+\s*,?\s*chapter\s+\d+\b").unwrap())
}

fn chapter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bchapter\s+\d+\b").unwrap())
}

fn day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bday\s+\d+\b").unwrap())
}

fn lab_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\blab\s+\d+\b").unwrap())
}

/// Remove all generator-authored chapter/day/lab mentions from `text`.
///
/// Patterns are applied widest-first so arrow-joined and combined forms
/// do not leave partial fragments behind.
pub fn strip_references(text: &str) -> String {
    let mut out = text.to_string();
    for re in [
        arrow_joined_re(),
        day_chapter_re(),
        chapter_re(),
        day_re(),
        lab_re(),
    ] {
        out = re.replace_all(&out, "").into_owned();
    }
    tidy(&out)
}

/// Collapse the whitespace and punctuation debris left by removals
fn tidy(text: &str) -> String {
    static EMPTY_PARENS: OnceLock<Regex> = OnceLock::new();
    static SPACE_RUNS: OnceLock<Regex> = OnceLock::new();
    static SPACE_BEFORE_PUNCT: OnceLock<Regex> = OnceLock::new();

    let empty_parens = EMPTY_PARENS.get_or_init(|| Regex::new(r"\(\s*\)|\[\s*\]").unwrap());
    let space_runs = SPACE_RUNS.get_or_init(|| Regex::new(r"[ \t]{2,}").unwrap());
    let space_before_punct =
        SPACE_BEFORE_PUNCT.get_or_init(|| Regex::new(r"\s+([.,;:!?])").unwrap());

    let out = empty_parens.replace_all(text, "");
    let out = space_runs.replace_all(&out, " ");
    let out = space_before_punct.replace_all(&out, "$1");
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_day_alone() {
        assert_eq!(
            strip_references("Covered in Day 20 of the course."),
            "Covered in of the course."
        );
    }

    #[test]
    fn test_strips_chapter_alone() {
        let out = strip_references("Chapter 1 and Chapter 2 explain this.");
        assert!(!out.contains("Chapter 1"));
        assert!(!out.contains("Chapter 2"));
        assert!(out.contains("explain this."));
    }

    #[test]
    fn test_strips_lab_alone() {
        let out = strip_references("Practice this in Lab 3 today.");
        assert!(!out.contains("Lab 3"));
        assert!(out.contains("today."));
    }

    #[test]
    fn test_strips_arrow_joined() {
        let out = strip_references("See Day 20 → Chapter 1 for details.");
        assert!(!out.contains("Day 20"));
        assert!(!out.contains("Chapter 1"));
        assert!(out.contains("for details."));
    }

    #[test]
    fn test_strips_ascii_arrow() {
        let out = strip_references("See Day 20 -> Chapter 1 for details.");
        assert!(!out.contains("Day"));
        assert!(!out.contains("Chapter"));
    }

    #[test]
    fn test_strips_day_chapter_combo() {
        let out = strip_references("As shown in Day 3, Chapter 2, tags matter.");
        assert!(!out.contains("Day 3"));
        assert!(!out.contains("Chapter 2"));
        assert!(out.contains("tags matter."));
    }

    #[test]
    fn test_all_required_forms() {
        let text = "Day 20 intro. Chapter 1 and Chapter 2 follow. Lab 3 is hands-on. Day 20 → Chapter 1 chains them.";
        let out = strip_references(text);
        for fragment in ["Day 20", "Chapter 1", "Chapter 2", "Lab 3"] {
            assert!(!out.contains(fragment), "'{}' survived: {}", fragment, out);
        }
        assert!(out.contains("intro."));
        assert!(out.contains("follow."));
        assert!(out.contains("hands-on."));
        assert!(out.contains("chains them."));
    }

    #[test]
    fn test_leaves_unrelated_text_unchanged() {
        let text = "Canonical tags consolidate duplicate URLs; use them on every template.";
        assert_eq!(strip_references(text), text);
    }

    #[test]
    fn test_does_not_strip_bare_words() {
        // "day" and "chapter" without numbers are ordinary words
        let text = "Later in the day, read the next chapter carefully.";
        assert_eq!(strip_references(text), text);
    }

    #[test]
    fn test_removes_empty_parens() {
        let out = strip_references("Use canonical tags (Chapter 2) everywhere.");
        assert!(!out.contains("Chapter"));
        assert!(!out.contains("()"));
        assert_eq!(out, "Use canonical tags everywhere.");
    }

    #[test]
    fn test_no_space_before_punctuation() {
        let out = strip_references("This is covered in Chapter 2.");
        assert_eq!(out, "This is covered in.");
    }
}
