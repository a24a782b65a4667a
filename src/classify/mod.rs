//! Chapter classification.
//!
//! Every section first passes two hard gates, an excluded-title check and a
//! minimum word count. Survivors are scored from the predicates in
//! [`signals`] and become chapters at or above
//! [`ClassifierConfig::score_threshold`]. When nothing qualifies the longest
//! sections are taken instead, so a book with any text always yields at least
//! one chapter.

pub mod signals;

use std::collections::HashSet;

use log::{debug, info};

use crate::book::{Chapter, ClassificationResult, ExcludedSection, Section, Toc, TocSource};

/// Thresholds used by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Sections below this many words are never chapters.
    pub min_words: usize,
    /// Word count that earns the substantial-length bonus.
    pub preferred_words: usize,
    /// Word count that must be exceeded for the raw-length bonus.
    pub long_words: usize,
    /// Titles shorter than this many characters count as short.
    pub short_title_chars: usize,
    /// Word count a short-titled section must exceed for its bonus.
    pub short_title_min_words: usize,
    /// Capitalized-token ratio that must be exceeded.
    pub proper_noun_density: f64,
    pub score_threshold: u32,
    /// How many sections the longest-sections fallback may select.
    pub fallback_limit: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_words: 100,
            preferred_words: 200,
            long_words: 1000,
            short_title_chars: 20,
            short_title_min_words: 500,
            proper_noun_density: 0.02,
            score_threshold: 3,
            fallback_limit: 10,
        }
    }
}

impl ClassifierConfig {
    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    pub fn with_score_threshold(mut self, threshold: u32) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_fallback_limit(mut self, limit: usize) -> Self {
        self.fallback_limit = limit;
        self
    }
}

const TITLE_PATTERN_WEIGHT: u32 = 3;
const SUBSTANTIAL_LENGTH_WEIGHT: u32 = 2;
const NARRATIVE_MARKERS_WEIGHT: u32 = 2;
const PROPER_NOUN_WEIGHT: u32 = 1;
const LONG_TEXT_WEIGHT: u32 = 1;
const SHORT_TITLE_WEIGHT: u32 = 1;

/// Which scoring signals fired for a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub title_pattern: bool,
    pub substantial_length: bool,
    pub narrative_markers: bool,
    pub proper_nouns: bool,
    pub long_text: bool,
    pub short_title: bool,
}

impl Signals {
    /// Evaluate every signal for a section's title and text.
    pub fn evaluate(title: Option<&str>, content: &str, config: &ClassifierConfig) -> Self {
        let words = signals::word_count(content);
        let title = title.map(str::trim).filter(|t| !t.is_empty());

        Self {
            title_pattern: title.is_some_and(signals::matches_chapter_title),
            substantial_length: words >= config.preferred_words,
            narrative_markers: signals::has_narrative_markers(content),
            proper_nouns: signals::proper_noun_density(content) > config.proper_noun_density,
            long_text: words > config.long_words,
            short_title: title.is_some_and(|t| t.chars().count() < config.short_title_chars)
                && words > config.short_title_min_words,
        }
    }

    pub fn score(&self) -> u32 {
        [
            (self.title_pattern, TITLE_PATTERN_WEIGHT),
            (self.substantial_length, SUBSTANTIAL_LENGTH_WEIGHT),
            (self.narrative_markers, NARRATIVE_MARKERS_WEIGHT),
            (self.proper_nouns, PROPER_NOUN_WEIGHT),
            (self.long_text, LONG_TEXT_WEIGHT),
            (self.short_title, SHORT_TITLE_WEIGHT),
        ]
        .iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, weight)| weight)
        .sum()
    }
}

/// Outcome for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Chapter { score: u32 },
    ExcludedTitle,
    TooShort { words: usize },
    LowScore { score: u32 },
}

impl Verdict {
    pub fn is_chapter(&self) -> bool {
        matches!(self, Verdict::Chapter { .. })
    }

    /// Audit reason for a rejection; `None` for chapters.
    pub fn reason(&self, config: &ClassifierConfig) -> Option<String> {
        match self {
            Verdict::Chapter { .. } => None,
            Verdict::ExcludedTitle => Some("title matches excluded title pattern".to_string()),
            Verdict::TooShort { words } => Some(format!(
                "below minimum word count ({words} < {})",
                config.min_words
            )),
            Verdict::LowScore { score } => Some(format!(
                "score {score} below threshold {}",
                config.score_threshold
            )),
        }
    }
}

/// Run both gates and, if they pass, the scorer.
pub fn judge(title: Option<&str>, content: &str, config: &ClassifierConfig) -> Verdict {
    if title.is_some_and(signals::is_excluded_title) {
        return Verdict::ExcludedTitle;
    }

    let words = signals::word_count(content);
    if words < config.min_words {
        return Verdict::TooShort { words };
    }

    let score = Signals::evaluate(title, content, config).score();
    if score >= config.score_threshold {
        Verdict::Chapter { score }
    } else {
        Verdict::LowScore { score }
    }
}

/// Partition sections into chapters and audited exclusions.
///
/// Sections without a title borrow one from `toc` when an entry points at
/// their href. Sections sharing an id are considered once. Chapters come back
/// in spine order with a non-empty title: the section's own, or "Chapter N"
/// by position in the result.
pub fn classify_sections(
    sections: Vec<Section>,
    toc: &Toc,
    config: &ClassifierConfig,
) -> ClassificationResult {
    let mut seen = HashSet::new();
    let mut candidates: Vec<Section> = sections
        .into_iter()
        .filter(|section| seen.insert(section.id.clone()))
        .collect();
    candidates.sort_by_key(|section| section.order);

    for section in &mut candidates {
        if section.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            section.title = toc_title(toc, &section.href).map(str::to_string);
        }
    }

    let total_sections = candidates.len();
    let mut chapter_indices = Vec::new();
    let mut low_score = Vec::new();
    let mut excluded = Vec::new();

    for (index, section) in candidates.iter().enumerate() {
        let verdict = judge(section.title.as_deref(), &section.content, config);
        debug!("{} ({}): {verdict:?}", section.display_title(), section.href);
        if matches!(verdict, Verdict::LowScore { .. }) {
            low_score.push(index);
        }
        match verdict.reason(config) {
            None => chapter_indices.push(index),
            Some(reason) => excluded.push((index, reason)),
        }
    }

    let used_fallback = chapter_indices.is_empty() && !candidates.is_empty();
    let chapters = if used_fallback {
        // Sections that cleared both gates are preferred; only when none did
        // does every candidate compete.
        let pool = if low_score.is_empty() {
            (0..candidates.len()).collect()
        } else {
            low_score
        };
        let selected = longest_sections(&candidates, pool, config.fallback_limit.max(1));
        info!(
            "No section qualified as a chapter; falling back to the {} longest",
            selected.len()
        );
        excluded.retain(|(index, _)| !selected.contains(index));

        let mut chapters: Vec<Chapter> = selected
            .iter()
            .enumerate()
            .map(|(rank, &index)| into_chapter(&candidates[index], format!("Chapter {}", rank + 1)))
            .collect();
        chapters.sort_by_key(|chapter| chapter.order);
        chapters
    } else {
        chapter_indices
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                let section = &candidates[index];
                let title = section
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Chapter {}", position + 1));
                into_chapter(section, title)
            })
            .collect()
    };

    let excluded_sections: Vec<ExcludedSection> = excluded
        .into_iter()
        .map(|(index, reason)| ExcludedSection {
            title: candidates[index].display_title(),
            reason,
        })
        .collect();

    ClassificationResult {
        chapter_count: chapters.len(),
        chapters,
        excluded_sections,
        total_sections,
        used_fallback,
    }
}

/// Up to `limit` of `indices`, longest content first. Ties keep spine order.
fn longest_sections(sections: &[Section], mut indices: Vec<usize>, limit: usize) -> Vec<usize> {
    indices.sort_by_key(|&i| std::cmp::Reverse(sections[i].content.chars().count()));
    indices.truncate(limit);
    indices
}

fn into_chapter(section: &Section, title: String) -> Chapter {
    Chapter {
        id: section.id.clone(),
        title,
        content: section.content.clone(),
        href: section.href.clone(),
        order: section.order,
    }
}

/// TOC label for a manifest href.
///
/// The loader already titles sections from the TOC by archive path. This
/// lookup serves sections built by callers, which only carry the
/// manifest-relative href: entry targets are archive paths, so the href
/// matches when it is the whole path or its trailing segments.
fn toc_title<'a>(toc: &'a Toc, href: &str) -> Option<&'a str> {
    if toc.source == TocSource::Spine || href.is_empty() {
        return None;
    }
    let suffix = format!("/{href}");
    toc.iter()
        .find(|entry| {
            let target = entry.target_path();
            target == href || target.ends_with(&suffix)
        })
        .map(|entry| entry.label.as_str())
        .filter(|label| !label.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::TocEntry;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn section(order: usize, title: Option<&str>, content: String) -> Section {
        Section {
            id: format!("s{order}"),
            title: title.map(str::to_string),
            content,
            href: format!("s{order}.xhtml"),
            order,
        }
    }

    fn no_toc() -> Toc {
        Toc {
            source: TocSource::Spine,
            entries: Vec::new(),
        }
    }

    #[test]
    fn test_signal_weights() {
        let all = Signals {
            title_pattern: true,
            substantial_length: true,
            narrative_markers: true,
            proper_nouns: true,
            long_text: true,
            short_title: true,
        };
        assert_eq!(all.score(), 10);
        assert_eq!(Signals::default().score(), 0);
        assert_eq!(
            Signals {
                title_pattern: true,
                ..Signals::default()
            }
            .score(),
            3
        );
    }

    #[test]
    fn test_signals_for_long_short_titled_text() {
        let config = ClassifierConfig::default();
        let signals = Signals::evaluate(Some("The Storm"), &words(1200), &config);
        assert!(!signals.title_pattern);
        assert!(signals.substantial_length);
        assert!(!signals.narrative_markers);
        assert!(!signals.proper_nouns);
        assert!(signals.long_text);
        assert!(signals.short_title);
        assert_eq!(signals.score(), 4);
    }

    #[test]
    fn test_excluded_title_wins_over_score() {
        let config = ClassifierConfig::default();
        let content = format!("\"Hello,\" Anna said. {}", words(3000));
        assert_eq!(judge(Some("Copyright"), &content, &config), Verdict::ExcludedTitle);
    }

    #[test]
    fn test_min_words_gate_ignores_title_pattern() {
        let config = ClassifierConfig::default();
        assert_eq!(
            judge(Some("Chapter 1"), &words(99), &config),
            Verdict::TooShort { words: 99 }
        );
    }

    #[test]
    fn test_threshold() {
        let config = ClassifierConfig::default();
        assert_eq!(
            judge(Some("Chapter 1"), &words(100), &config),
            Verdict::Chapter { score: 3 }
        );
        assert_eq!(
            judge(None, &words(250), &config),
            Verdict::LowScore { score: 2 }
        );
        let stricter = ClassifierConfig::default().with_score_threshold(4);
        assert_eq!(
            judge(Some("Chapter 1"), &words(100), &stricter),
            Verdict::LowScore { score: 3 }
        );
    }

    #[test]
    fn test_reasons() {
        let config = ClassifierConfig::default();
        assert!(Verdict::ExcludedTitle.reason(&config).unwrap().contains("title"));
        assert_eq!(
            Verdict::TooShort { words: 5 }.reason(&config).unwrap(),
            "below minimum word count (5 < 100)"
        );
        assert_eq!(
            Verdict::LowScore { score: 2 }.reason(&config).unwrap(),
            "score 2 below threshold 3"
        );
        assert_eq!(Verdict::Chapter { score: 5 }.reason(&config), None);
    }

    #[test]
    fn test_front_matter_and_chapters() {
        let sections = vec![
            section(0, Some("Cover"), "Cover art".into()),
            section(1, Some("Title Page"), "The Book by Someone".into()),
            section(2, Some("Copyright"), "All rights reserved.".into()),
            section(3, Some("Chapter 1"), format!("\"Run,\" she said. {}", words(246))),
            section(4, Some("Chapter 2"), words(300)),
        ];

        let result = classify_sections(sections, &no_toc(), &ClassifierConfig::default());

        let titles: Vec<_> = result.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Chapter 1", "Chapter 2"]);
        assert_eq!(result.total_sections, 5);
        assert_eq!(result.chapter_count, 2);
        assert!(!result.used_fallback);
        assert_eq!(result.excluded_sections.len(), 3);
        assert!(
            result
                .excluded_sections
                .iter()
                .all(|e| e.reason.contains("excluded title pattern"))
        );
        assert_eq!(result.excluded_sections[0].to_string(), "Cover: title matches excluded title pattern");
    }

    #[test]
    fn test_title_starting_with_label_is_still_scored() {
        let sections = vec![
            section(0, Some("Cover Story"), format!("\"Run,\" she said. {}", words(2996))),
            section(1, Some("Chapter 2"), words(300)),
        ];

        let result = classify_sections(sections, &no_toc(), &ClassifierConfig::default());

        let titles: Vec<_> = result.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Cover Story", "Chapter 2"]);
        assert!(result.excluded_sections.is_empty());
    }

    #[test]
    fn test_fallback_takes_longest_and_restores_spine_order() {
        let sections = vec![
            section(0, None, words(20)),
            section(1, Some("Dedication"), words(90)),
            section(2, None, words(40)),
            section(3, None, words(10)),
        ];
        let config = ClassifierConfig::default().with_fallback_limit(2);

        let result = classify_sections(sections, &no_toc(), &config);

        assert!(result.used_fallback);
        let picked: Vec<_> = result
            .chapters
            .iter()
            .map(|c| (c.id.as_str(), c.title.as_str()))
            .collect();
        // s1 is longest (rank 1), s2 second (rank 2); output is in spine order.
        assert_eq!(picked, [("s1", "Chapter 1"), ("s2", "Chapter 2")]);
        assert_eq!(result.excluded_sections.len(), 2);
        assert_eq!(result.total_sections, 4);
    }

    #[test]
    fn test_fallback_prefers_sections_past_both_gates() {
        let mut sections: Vec<_> = (0..4).map(|i| section(i, None, words(40))).collect();
        sections.insert(2, section(9, None, words(4000)));
        let result = classify_sections(sections, &no_toc(), &ClassifierConfig::default());

        assert!(!result.used_fallback, "4000 words scores on length alone");

        let mut sections: Vec<_> = (0..4).map(|i| section(i, None, words(40))).collect();
        sections.push(section(4, None, words(250)));
        let result = classify_sections(sections, &no_toc(), &ClassifierConfig::default());

        assert!(result.used_fallback);
        assert_eq!(result.chapters.len(), 1);
        assert_eq!(result.chapters[0].id, "s4");
        assert_eq!(result.chapters[0].title, "Chapter 1");
        assert_eq!(result.excluded_sections.len(), 4);
    }

    #[test]
    fn test_fallback_single_long_section() {
        let mut sections: Vec<_> = (0..4).map(|i| section(i, None, words(30))).collect();
        sections.push(section(4, Some("Musings"), words(99)));
        let result = classify_sections(sections, &no_toc(), &ClassifierConfig::default());

        assert!(result.used_fallback);
        assert_eq!(result.chapters.len(), 5);
        assert_eq!(result.chapters[4].title, "Chapter 1");
        assert_eq!(result.chapters[4].id, "s4");
    }

    #[test]
    fn test_empty_input() {
        let result = classify_sections(Vec::new(), &no_toc(), &ClassifierConfig::default());
        assert!(result.chapters.is_empty());
        assert!(!result.used_fallback);
        assert_eq!(result.total_sections, 0);
    }

    #[test]
    fn test_untitled_chapters_are_numbered_by_position() {
        let long = format!("Suddenly it rained. {}", words(300));
        let sections = vec![
            section(0, Some("Preface"), words(300)),
            section(1, None, long.clone()),
            section(2, Some("  "), long),
        ];

        let result = classify_sections(sections, &no_toc(), &ClassifierConfig::default());
        let titles: Vec<_> = result.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Chapter 1", "Chapter 2"]);
    }

    #[test]
    fn test_duplicate_ids_and_unsorted_input() {
        let mut later = section(5, Some("Chapter 2"), words(150));
        later.id = "b".into();
        let mut earlier = section(1, Some("Chapter 1"), words(150));
        earlier.id = "a".into();
        let mut dup = earlier.clone();
        dup.order = 9;

        let result = classify_sections(
            vec![later, earlier, dup],
            &no_toc(),
            &ClassifierConfig::default(),
        );

        let ids: Vec<_> = result.chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(result.total_sections, 2);
    }

    #[test]
    fn test_titles_borrowed_from_toc() {
        let toc = Toc {
            source: TocSource::Ncx,
            entries: vec![TocEntry::new("Chapter One", "OEBPS/s0.xhtml#top")],
        };
        let sections = vec![section(0, None, words(120))];

        let result = classify_sections(sections, &toc, &ClassifierConfig::default());
        assert!(!result.used_fallback);
        assert_eq!(result.chapters[0].title, "Chapter One");
    }
}
