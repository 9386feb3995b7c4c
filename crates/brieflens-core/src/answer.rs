//! Keyword-scored extractive answering.
//!
//! Produces an answer by selecting whole sentences from the retrieved
//! context rather than generating text. The same context and question
//! always produce the same answer.
//!
//! # Algorithm
//!
//! 1. Split the context into sentences at `.`, `!` or `?` followed by
//!    whitespace.
//! 2. Extract query keywords: lowercase alphanumeric tokens longer than
//!    two characters, mapped through a small synonym table.
//! 3. Score each sentence by the number of whole-word occurrences of each
//!    keyword or its plural (`kw` or `kw` + `s`).
//! 4. Stable sort by score, descending.
//! 5. Append sentences while the answer fits in `max_length` characters.
//!    Zero-score sentences are skipped when there are keywords, and a
//!    sentence identical to one already selected is skipped (overlapping
//!    chunks repeat text). The first sentence that does not fit is cut and
//!    closed with `...` when at least [`MIN_FRAGMENT_CHARS`] characters of
//!    it fit in front of the ellipsis; then assembly stops.
//! 6. If nothing was selected, answer [`NOT_SPECIFIED`].
//!
//! Keywords are every token longer than two characters, with no stopword
//! list, so words such as `what`, `are` and `the` count. A question whose
//! content words are absent can still select sentences through them.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::NOT_SPECIFIED;

/// Default answer length budget in characters.
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 600;

const ELLIPSIS: &str = "...";

/// Shortest sentence fragment kept in front of the ellipsis. Shorter
/// remainders are dropped and the answer ends at the last whole sentence.
pub const MIN_FRAGMENT_CHARS: usize = 8;

static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence pattern compiles"));

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("keyword pattern compiles"));

/// Query word rewrites applied before scoring.
const SYNONYMS: &[(&str, &str)] = &[
    ("customers", "clients"),
    ("customer", "client"),
    ("docs", "documents"),
    ("doc", "document"),
    ("files", "documents"),
];

/// Map a keyword through the synonym table.
pub fn canonical_keyword(word: &str) -> &str {
    SYNONYMS
        .iter()
        .find(|(from, _)| *from == word)
        .map_or(word, |(_, to)| *to)
}

/// Split `text` into trimmed, non-empty sentences, keeping terminal punctuation.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        // the punctuation mark is always one byte
        let end = m.start() + 1;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Extract de-duplicated keywords from a question, in first-seen order.
pub fn query_keywords(question: &str) -> Vec<String> {
    let lower = question.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();
    for m in KEYWORD_RE.find_iter(&lower) {
        let word = m.as_str();
        if word.len() <= 2 {
            continue;
        }
        let kw = canonical_keyword(word).to_string();
        if !keywords.contains(&kw) {
            keywords.push(kw);
        }
    }
    keywords
}

/// Compiled per-question keyword matchers.
struct KeywordMatcher {
    patterns: Vec<Regex>,
}

impl KeywordMatcher {
    fn new(keywords: &[String]) -> Self {
        let patterns = keywords
            .iter()
            .filter_map(|kw| Regex::new(&format!(r"\b{}s?\b", regex::escape(kw))).ok())
            .collect();
        Self { patterns }
    }

    fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Total keyword occurrences in `sentence`.
    fn score(&self, sentence: &str) -> usize {
        let lower = sentence.to_lowercase();
        self.patterns
            .iter()
            .map(|p| p.find_iter(&lower).count())
            .sum()
    }
}

/// Score a sentence against a keyword list.
pub fn score_sentence(sentence: &str, keywords: &[String]) -> usize {
    KeywordMatcher::new(keywords).score(sentence)
}

/// Build an extractive answer to `question` from `context`.
///
/// Never returns more than `max_length` characters. Returns
/// [`NOT_SPECIFIED`] when the context is blank or no sentence qualifies.
pub fn extract_answer(context: &str, question: &str, max_length: usize) -> String {
    if context.trim().is_empty() {
        return NOT_SPECIFIED.to_string();
    }

    let matcher = KeywordMatcher::new(&query_keywords(question));
    let mut scored: Vec<(&str, usize)> = split_sentences(context)
        .into_iter()
        .map(|s| (s, matcher.score(s)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let mut answer = String::new();
    let mut used = 0usize;
    let mut seen: HashSet<&str> = HashSet::new();
    for (sentence, score) in scored {
        if score == 0 && !matcher.is_empty() {
            // sorted, so every remaining sentence scores zero too
            break;
        }
        if !seen.insert(sentence) {
            continue;
        }
        let sep = if answer.is_empty() { 0 } else { 1 };
        let len = sentence.chars().count();
        if used + sep + len <= max_length {
            if sep == 1 {
                answer.push(' ');
            }
            answer.push_str(sentence);
            used += sep + len;
            continue;
        }

        let room = max_length.saturating_sub(used + sep + ELLIPSIS.len());
        if room >= MIN_FRAGMENT_CHARS {
            let fragment: String = sentence.chars().take(room).collect();
            if sep == 1 {
                answer.push(' ');
            }
            answer.push_str(fragment.trim_end());
            answer.push_str(ELLIPSIS);
        }
        break;
    }

    if answer.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_context_is_not_specified() {
        assert_eq!(extract_answer("", "q", 100), NOT_SPECIFIED);
        assert_eq!(extract_answer("  \n ", "anything", 100), NOT_SPECIFIED);
    }

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("First one. Second!  Third?\nFourth without end");
        assert_eq!(s, vec!["First one.", "Second!", "Third?", "Fourth without end"]);
    }

    #[test]
    fn test_split_keeps_abbreviation_like_tokens_without_space() {
        let s = split_sentences("Version 1.2 shipped. Done.");
        assert_eq!(s, vec!["Version 1.2 shipped.", "Done."]);
    }

    #[test]
    fn test_keywords_synonyms_and_length() {
        let kws = query_keywords("How many customers have docs on file? An ox.");
        assert_eq!(kws, vec!["how", "many", "clients", "have", "documents", "file"]);
    }

    #[test]
    fn test_keywords_deduplicated() {
        assert_eq!(query_keywords("lease LEASE lease"), vec!["lease"]);
    }

    #[test]
    fn test_score_counts_plurals_on_word_boundaries() {
        let kws = vec!["complaint".to_string()];
        assert_eq!(score_sentence("Two complaints and one complaint.", &kws), 2);
        assert_eq!(score_sentence("Complaintant is not a word here.", &kws), 0);
    }

    #[test]
    fn test_best_sentence_first() {
        let ctx = "The lease runs five years. Johnson filed a complaint. \
                   Johnson Corporation seeks damages from Smith.";
        let answer = extract_answer(ctx, "What did Johnson Corporation file?", 60);
        assert!(answer.starts_with("Johnson Corporation seeks damages from Smith. Johnson"));
        assert!(!answer.contains("lease"));
    }

    #[test]
    fn test_ties_keep_original_order() {
        let ctx = "Rent is due monthly. Rent increases yearly.";
        let answer = extract_answer(ctx, "rent", 200);
        assert_eq!(answer, "Rent is due monthly. Rent increases yearly.");
    }

    #[test]
    fn test_zero_score_sentences_skipped() {
        let ctx = "The tenant pays rent. The sky is blue.";
        assert_eq!(extract_answer(ctx, "tenant", 200), "The tenant pays rent.");
    }

    #[test]
    fn test_no_overlap_is_not_specified() {
        let ctx = "The tenant pays rent. The landlord maintains the roof.";
        assert_eq!(
            extract_answer(ctx, "quantum physics equations", 200),
            NOT_SPECIFIED
        );
    }

    #[test]
    fn test_no_keywords_takes_leading_sentences() {
        let ctx = "First sentence here. Second sentence here.";
        assert_eq!(extract_answer(ctx, "is it?", 25), "First sentence here.");
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        let ctx = "The arbitration clause requires binding arbitration in Delaware for all disputes.";
        let answer = extract_answer(ctx, "arbitration", 40);
        assert!(answer.ends_with("..."));
        assert!(answer.chars().count() <= 40);
        assert!(answer.starts_with("The arbitration clause"));
    }

    #[test]
    fn test_length_never_exceeds_budget() {
        let ctx = "Alpha contract term one. Beta contract term two is longer than the first. \
                   Gamma contract term three closes. Delta contract.";
        for max in [0, 5, 12, 20, 33, 50, 80, 200] {
            let answer = extract_answer(ctx, "contract term", max);
            if answer != NOT_SPECIFIED {
                assert!(
                    answer.chars().count() <= max,
                    "max={} answer={:?}",
                    max,
                    answer
                );
            }
        }
    }

    #[test]
    fn test_repeated_sentence_used_once() {
        let ctx = "Filler words here. The indemnification cap is two million dollars.\n\n\
                   The indemnification cap is two million dollars. More filler.";
        assert_eq!(
            extract_answer(ctx, "indemnification cap", 200),
            "The indemnification cap is two million dollars."
        );
    }

    #[test]
    fn test_short_remainder_dropped_without_ellipsis() {
        // 23 + 1 + 3 leaves 3 chars of room, under the fragment minimum
        let ctx = "Rent is due on the 1st. Rent is late after the fifth day.";
        let answer = extract_answer(ctx, "rent", 30);
        assert_eq!(answer, "Rent is due on the 1st.");
    }

    #[test]
    fn test_common_words_count_as_keywords() {
        let ctx = "What are the lease terms? The tenant pays rent.";
        let answer = extract_answer(ctx, "What are the quantum physics equations?", 200);
        assert_ne!(answer, NOT_SPECIFIED);
        assert!(answer.starts_with("What are the lease terms?"));
    }

    #[test]
    fn test_deterministic() {
        let ctx = "Payment is due in thirty days. Late payment accrues interest.";
        let a = extract_answer(ctx, "payment terms", 100);
        let b = extract_answer(ctx, "payment terms", 100);
        assert_eq!(a, b);
    }
}
