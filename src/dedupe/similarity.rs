//! Title similarity measures for the fuzzy matching stage.

use std::collections::BTreeSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

/// Similarity measure applied to normalized titles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Token-set ratio: tolerant of word order and of one title containing the other.
    #[default]
    TokenSet,
    /// Jaro-Winkler over the whole normalized string.
    JaroWinkler,
}

impl SimilarityMetric {
    /// Scores two normalized titles in `[0, 1]`. An empty title scores 0.
    pub fn score(self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::TokenSet => token_set_ratio(a, b),
            SimilarityMetric::JaroWinkler => {
                if a.trim().is_empty() || b.trim().is_empty() {
                    0.0
                } else {
                    jaro_winkler(a, b)
                }
            }
        }
    }
}

/// Token-set similarity of two whitespace-tokenized strings, in `[0, 1]`.
///
/// Duplicate tokens are collapsed. When the shared tokens cover one side
/// entirely the score is 1. Otherwise the best of three indel ratios is
/// returned: the two residues against each other, and the shared part
/// against the shared part extended by each residue.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 1.0;
    }

    // BTreeSet iteration is sorted, so the joined forms are canonical
    let diff_ab_joined = diff_ab.iter().join(" ");
    let diff_ba_joined = diff_ba.iter().join(" ");

    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let sect_len = intersection.iter().join(" ").chars().count();
    let separator = usize::from(sect_len != 0);

    let sect_ab_len = sect_len + separator + ab_len;
    let sect_ba_len = sect_len + separator + ba_len;

    let residue_distance = indel_distance(&diff_ab_joined, &diff_ba_joined);
    let result = normalized_similarity(residue_distance, sect_ab_len + sect_ba_len);

    if sect_len == 0 {
        return result;
    }

    let sect_ab_ratio = normalized_similarity(separator + ab_len, sect_len + sect_ab_len);
    let sect_ba_ratio = normalized_similarity(separator + ba_len, sect_len + sect_ba_len);

    result.max(sect_ab_ratio).max(sect_ba_ratio)
}

fn normalized_similarity(distance: usize, length_sum: usize) -> f64 {
    if length_sum == 0 {
        return 1.0;
    }
    1.0 - distance as f64 / length_sum as f64
}

/// Insertions plus deletions needed to turn `a` into `b`.
fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * longest_common_subsequence(&a, &b)
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
