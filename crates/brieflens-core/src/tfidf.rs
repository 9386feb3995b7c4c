//! TF-IDF vectorizer and sparse chunk index.
//!
//! Chunks are the "documents" for IDF purposes. Terms are lowercase word
//! unigrams and bigrams, where a word is any run of two or more Unicode
//! word characters.
//!
//! # Weighting
//!
//! ```text
//! idf(t)     = ln((1 + n) / (1 + df(t))) + 1
//! w(t, c)    = count(t, c) × idf(t)
//! ```
//!
//! Rows are stored sparse with their L2 norms precomputed at build time so
//! that a query only costs one sparse dot product per chunk.
//!
//! The vocabulary is capped at `max_features` terms, keeping the most
//! frequent terms across the corpus. Building never fails: an empty chunk
//! list, or one in which no term survives tokenization, produces an index
//! that returns no hits.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::Chunk;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 50_000;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern compiles"));

/// Vectorizer tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TfidfParams {
    /// Maximum vocabulary size.
    pub max_features: usize,
    /// Longest n-gram, in words. Unigrams are always included.
    pub ngram_max: usize,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            ngram_max: 2,
        }
    }
}

/// Lowercase `text` and split it into word tokens of two or more characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// All n-grams of `tokens` from length 1 up to `max_n`, space-joined.
pub fn ngrams(tokens: &[String], max_n: usize) -> Vec<String> {
    let mut out = Vec::new();
    for n in 1..=max_n.max(1) {
        if n == 1 {
            out.extend(tokens.iter().cloned());
        } else {
            out.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
    }
    out
}

/// Term counts for a text.
fn term_counts(text: &str, max_n: usize) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in ngrams(&tokenize(text), max_n) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

/// A sparse vector as `(column, weight)` pairs sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from unsorted entries. Zero weights are dropped.
    pub fn from_entries(mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|(_, w)| *w != 0.0);
        entries.sort_by_key(|(col, _)| *col);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Sparse dot product (merge join over sorted columns).
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// A fitted vocabulary with IDF weights.
#[derive(Debug, Clone)]
pub struct Vectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_max: usize,
}

impl Vectorizer {
    /// Fit on `texts` and return the vectorizer together with one row per
    /// text. Returns `None` when no term survives tokenization.
    pub fn fit_transform(texts: &[&str], params: &TfidfParams) -> Option<(Self, Vec<SparseVector>)> {
        let counts: Vec<HashMap<String, usize>> = texts
            .iter()
            .map(|t| term_counts(t, params.ngram_max))
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        let mut total: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for (term, count) in doc {
                *df.entry(term.as_str()).or_insert(0) += 1;
                *total.entry(term.as_str()).or_insert(0) += count;
            }
        }
        if df.is_empty() {
            return None;
        }

        let mut terms: Vec<&str> = df.keys().copied().collect();
        if terms.len() > params.max_features {
            terms.sort_by(|a, b| total[b].cmp(&total[a]).then(a.cmp(b)));
            terms.truncate(params.max_features);
        }
        terms.sort_unstable();

        let n = texts.len() as f64;
        let idf: Vec<f64> = terms
            .iter()
            .map(|t| ((1.0 + n) / (1.0 + df[t] as f64)).ln() + 1.0)
            .collect();
        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();

        let vectorizer = Self {
            vocabulary,
            idf,
            ngram_max: params.ngram_max,
        };
        let rows = counts.iter().map(|c| vectorizer.weigh(c)).collect();
        Some((vectorizer, rows))
    }

    /// Vectorize `text` against the fitted vocabulary. Out-of-vocabulary
    /// terms contribute nothing.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&term_counts(text, self.ngram_max))
    }

    fn weigh(&self, counts: &HashMap<String, usize>) -> SparseVector {
        let entries = counts
            .iter()
            .filter_map(|(term, count)| {
                self.vocabulary
                    .get(term)
                    .map(|&col| (col, *count as f64 * self.idf[col]))
            })
            .collect();
        SparseVector::from_entries(entries)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// IDF weight of `term`, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&col| self.idf[col])
    }
}

/// The live retrieval index: chunks, their TF-IDF rows and row norms.
///
/// Row `i` of the matrix always describes `chunks()[i]`.
#[derive(Debug, Clone, Default)]
pub struct TfidfIndex {
    vectorizer: Option<Vectorizer>,
    rows: Vec<SparseVector>,
    norms: Vec<f64>,
    chunks: Vec<Chunk>,
}

impl TfidfIndex {
    /// An index with no chunks; every query against it returns nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fit the vectorizer over `chunks` and build the sparse matrix.
    pub fn build(chunks: Vec<Chunk>, params: &TfidfParams) -> Self {
        if chunks.is_empty() {
            return Self::empty();
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let (vectorizer, rows) = match Vectorizer::fit_transform(&texts, params) {
            Some((v, rows)) => (Some(v), rows),
            None => {
                tracing::warn!(
                    chunks = chunks.len(),
                    "no indexable terms in corpus; every query will return no hits"
                );
                (None, vec![SparseVector::default(); chunks.len()])
            }
        };
        let norms = rows.iter().map(SparseVector::norm).collect();

        Self {
            vectorizer,
            rows,
            norms,
            chunks,
        }
    }

    /// Vectorize a query with the fitted vocabulary.
    pub fn query_vector(&self, query: &str) -> SparseVector {
        match &self.vectorizer {
            Some(v) => v.transform(query),
            None => SparseVector::default(),
        }
    }

    pub fn vectorizer(&self) -> Option<&Vectorizer> {
        self.vectorizer.as_ref()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn norms(&self) -> &[f64] {
        &self.norms
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.as_ref().map_or(0, Vectorizer::vocabulary_len)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
