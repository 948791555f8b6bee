//! Near-duplicate detection over cleaned review text.
//!
//! Every pair is compared, so a pass costs O(n²) edit-distance computations.
//! That is fine for a few thousand reviews and is a hard scaling limit beyond
//! that. Blocking or indexing schemes would change which member of a
//! near-duplicate chain survives.

use strsim::{levenshtein, normalized_levenshtein};
use tracing::debug;

/// Case-insensitive similarity in `[0, 100]`:
/// `100 * (1 - levenshtein(a, b) / max(len(a), len(b)))`.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase()) * 100.0
}

/// `similarity(a, b) >= threshold` for already case-folded inputs, evaluated
/// in integers so that exact boundaries such as 80/100 are not lost to
/// floating point rounding.
fn is_similar(a: &str, b: &str, threshold: u8) -> bool {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return true;
    }

    let distance = levenshtein(a, b);
    100 * (longest - distance) >= usize::from(threshold) * longest
}

/// Indices of texts to drop so that only the first of each near-duplicate
/// group remains.
///
/// The pass is greedy and order sensitive: once an index is marked it takes no
/// further part in comparisons, neither as the reference nor as a candidate.
/// With `A ~ B`, `B ~ C` but `A !~ C` in that order, `B` is removed against
/// `A` and `C` survives because it is never compared with `B`.
pub fn find_duplicate_indices<S: AsRef<str>>(texts: &[S], threshold: u8) -> Vec<usize> {
    let lowered: Vec<String> = texts.iter().map(|t| t.as_ref().to_lowercase()).collect();
    let mut removed = vec![false; lowered.len()];

    for i in 0..lowered.len() {
        if removed[i] {
            continue;
        }

        for j in (i + 1)..lowered.len() {
            if removed[j] {
                continue;
            }

            if is_similar(&lowered[i], &lowered[j], threshold) {
                debug!("Review {} duplicates review {}", j, i);
                removed[j] = true;
            }
        }
    }

    removed
        .iter()
        .enumerate()
        .filter_map(|(index, &is_removed)| is_removed.then_some(index))
        .collect()
}
