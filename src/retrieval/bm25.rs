//! Per-document BM25 index.
//!
//! Tokens are whitespace-split canonical text. Statistics live in `BTreeMap`s
//! so iteration order never depends on hashing.

use std::collections::BTreeMap;

use crate::constants::{BM25_B, BM25_K1};
use crate::hashing::canonicalize;

/// Splits canonical text on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    canonicalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    term_freqs: Vec<BTreeMap<String, u32>>,
    doc_lens: Vec<usize>,
    doc_freq: BTreeMap<String, usize>,
    avg_len: f64,
    k1: f64,
    b: f64,
}

impl LexicalIndex {
    /// Builds an index over `texts`; position `i` scores `texts[i]`.
    pub fn build<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::with_params(texts, BM25_K1, BM25_B)
    }

    pub fn with_params<S: AsRef<str>>(texts: &[S], k1: f64, b: f64) -> Self {
        let mut term_freqs = Vec::with_capacity(texts.len());
        let mut doc_lens = Vec::with_capacity(texts.len());
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for text in texts {
            let tokens = tokenize(text.as_ref());
            doc_lens.push(tokens.len());

            let mut tf: BTreeMap<String, u32> = BTreeMap::new();
            for token in tokens {
                *tf.entry(token).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(tf);
        }

        let total: usize = doc_lens.iter().sum();
        let avg_len = if doc_lens.is_empty() {
            0.0
        } else {
            total as f64 / doc_lens.len() as f64
        };

        Self {
            term_freqs,
            doc_lens,
            doc_freq,
            avg_len,
            k1,
            b,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    /// Lucene-style idf, never negative.
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.len() as f64;
        let df = self.doc_freq(term) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Scores every indexed passage against `query`, in index order.
    ///
    /// Repeated query terms contribute once per occurrence.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let terms = tokenize(query);
        let mut out = vec![0.0; self.len()];
        if terms.is_empty() || self.avg_len == 0.0 {
            return out;
        }

        for term in &terms {
            if self.doc_freq(term) == 0 {
                continue;
            }
            let idf = self.idf(term);
            for (i, tf_map) in self.term_freqs.iter().enumerate() {
                let Some(&tf) = tf_map.get(term) else {
                    continue;
                };
                let tf = tf as f64;
                let len_norm = 1.0 - self.b + self.b * (self.doc_lens[i] as f64 / self.avg_len);
                out[i] += idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * len_norm);
            }
        }
        out
    }
}
