//! Score normalization and fusion.

/// Min-max normalizes `scores` into `[0, 1]`.
///
/// A constant (or empty) input maps to all zeros.
pub fn min_max_normalize(scores: &[f64]) -> Vec<f64> {
    let Some(&first) = scores.first() else {
        return Vec::new();
    };
    let (min, max) = scores
        .iter()
        .fold((first, first), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|&s| (s - min) / range).collect()
}

/// `alpha * lexical + (1 - alpha) * semantic` over already-normalized arrays.
pub fn fuse(lexical: &[f64], semantic: &[f64], alpha: f64) -> Vec<f64> {
    debug_assert_eq!(lexical.len(), semantic.len());
    lexical
        .iter()
        .zip(semantic)
        .map(|(&l, &s)| alpha * l + (1.0 - alpha) * s)
        .collect()
}

/// Cosine similarity in `f64`. Mismatched, empty or zero-norm inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
    }
}
