//! Independent predicates the classifier scores sections with.
//!
//! Every function here works on already-cleaned plain text or a title string,
//! so each signal can be tested without any markup involved.

use std::sync::LazyLock;

use regex::Regex;

/// Administrative and front/back-matter labels. These must be the whole
/// title, give or take a trailing designator ("Appendix B", "Notes 2").
static EXCLUDED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*(?:
            cover | front\s*cover | back\s*cover
          | (?:half[\s-]*)?title\s*page | half[\s-]*title
          | dedication
          | acknowledge?ments? | preface | foreword | introduction | prologue | epilogue
          | (?:table\s+of\s+)?contents | toc
          | bibliography | index | glossary | appendix | appendices
          | (?:end\s*|foot\s*)?notes | credits
          | publisher'?s?\s+note | edition(?:\s+notice)?
          | legal(?:\s+notices?)? | disclaimer
        )
        (?:\s+(?:\d{1,3}|[ivxlc]{1,6}|[a-z]))?
        \s*[.:]?\s*$",
    )
    .expect("Failed to compile excluded title regex")
});

/// Labels that run on into a name or a notice ("Also by Jane Doe",
/// "Copyright © 2021"). Matched at the start of the title.
static EXCLUDED_TITLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*(?:
            copyright | isbn
          | also\s+by | other\s+(?:books|titles)\s+by | books\s+by
          | about\s+the\s+(?:authors?|publishers?|illustrators?|translators?)
        )\b",
    )
    .expect("Failed to compile excluded title prefix regex")
});

/// Pure navigation labels. These must be the whole title.
static NAVIGATION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:next|previous|prev|home|back|forward|start|begin)\s*[.:>»<«]*\s*$")
        .expect("Failed to compile navigation title regex")
});

static CHAPTER_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:chapter|chap\.|part|book|section|episode|canto|letter)\b")
        .expect("Failed to compile chapter keyword regex")
});

/// A bare Arabic or upper-case Roman numeral, optionally followed by a
/// separator and a name ("12", "IV.", "3: The Storm").
static NUMBERED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<num>\d{1,4}|M{0,4}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3}))\s*(?:[.:)\-–—]|$)",
    )
    .expect("Failed to compile numbered title regex")
});

static SPEECH_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:said|says|asked|asks|replied|answered|whispered|shouted|muttered|murmured|cried|exclaimed|called|yelled|sighed|laughed)\b",
    )
    .expect("Failed to compile speech verb regex")
});

static QUOTED_DIALOGUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:"[^"\n]{2,}"|“[^”\n]{2,}”|«[^»\n]{2,}»)"#)
        .expect("Failed to compile dialogue regex")
});

static TEMPORAL_CONNECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:suddenly|meanwhile|afterwards|afterward|moments later|later that|the next (?:day|morning|evening|night)|that night|once upon a time|at last|all at once)\b",
    )
    .expect("Failed to compile temporal connective regex")
});

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether a title names front/back matter or page navigation.
pub fn is_excluded_title(title: &str) -> bool {
    EXCLUDED_TITLE.is_match(title)
        || EXCLUDED_TITLE_PREFIX.is_match(title)
        || NAVIGATION_TITLE.is_match(title)
}

/// Whether a title reads like a chapter label: "Chapter 3", "Part One",
/// "XII", "7. The Harbour".
pub fn matches_chapter_title(title: &str) -> bool {
    if CHAPTER_KEYWORD.is_match(title) {
        return true;
    }
    NUMBERED_TITLE
        .captures(title)
        .and_then(|caps| caps.name("num"))
        .is_some_and(|num| !num.as_str().is_empty())
}

/// Reported speech, quoted dialogue or temporal connectives.
pub fn has_narrative_markers(text: &str) -> bool {
    SPEECH_VERB.is_match(text) || QUOTED_DIALOGUE.is_match(text) || TEMPORAL_CONNECTIVE.is_match(text)
}

/// Share of word tokens that start with an upper-case letter.
///
/// Leading punctuation is ignored, so `"Anna` counts as capitalized.
pub fn proper_noun_density(text: &str) -> f64 {
    let mut words = 0usize;
    let mut capitalized = 0usize;
    for token in text.split_whitespace() {
        words += 1;
        if token
            .chars()
            .find(|c| c.is_alphabetic())
            .is_some_and(char::is_uppercase)
        {
            capitalized += 1;
        }
    }
    if words == 0 {
        0.0
    } else {
        capitalized as f64 / words as f64
    }
}
