//! Edit distance and name normalization for matching scraped names
//! against database entities.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Decomposed Levenshtein distance between two strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditCounts {
    /// Characters present only in the second string
    pub insertions: usize,
    /// Characters present only in the first string
    pub deletions: usize,
    /// Characters replaced by a different character
    pub substitutions: usize,
}

impl EditCounts {
    /// Total number of edits
    pub fn distance(&self) -> usize {
        self.insertions + self.deletions + self.substitutions
    }

    fn insert(mut self) -> Self {
        self.insertions += 1;
        self
    }

    fn delete(mut self) -> Self {
        self.deletions += 1;
        self
    }

    fn substitute(mut self) -> Self {
        self.substitutions += 1;
        self
    }
}

/// Compute the edits needed to turn `a` into `b`, counted over code points.
///
/// Full dynamic-programming table. When several operations reach a cell at
/// the same cost, deletion wins over insertion, and insertion over
/// substitution (or a free match).
pub fn distance(a: &str, b: &str) -> EditCounts {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let width = b.len() + 1;

    // table[i * width + j] holds the edits turning a[..i] into b[..j]
    let mut table = vec![EditCounts::default(); (a.len() + 1) * width];
    for i in 1..=a.len() {
        table[i * width] = table[(i - 1) * width].delete();
    }
    for j in 1..=b.len() {
        table[j] = table[j - 1].insert();
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let deletion = table[(i - 1) * width + j].delete();
            let insertion = table[i * width + j - 1].insert();
            let diagonal = table[(i - 1) * width + j - 1];
            let diagonal = if a[i - 1] == b[j - 1] {
                diagonal
            } else {
                diagonal.substitute()
            };

            let mut best = deletion;
            for candidate in [insertion, diagonal] {
                if candidate.distance() < best.distance() {
                    best = candidate;
                }
            }
            table[i * width + j] = best;
        }
    }

    table[a.len() * width + b.len()]
}

/// Fold `s` for name comparison: decompose, drop diacritics, lowercase.
///
/// Punctuation and spacing are preserved.
pub fn normalize(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
