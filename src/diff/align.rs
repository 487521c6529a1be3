//! Line alignment strategies.
//!
//! Both strategies return a monotonic list of matched `(old_index, new_index)`
//! pairs whose lines are equal. Small inputs get an exact longest common
//! subsequence; large inputs are anchored on lines unique to both sides.

use std::collections::HashMap;
use std::hash::Hash;

/// Align two line sequences, choosing the exact LCS when the DP table fits
/// within `max_lcs_cells` and the unique-line anchor approximation otherwise.
pub(crate) fn align<T: Eq + Hash>(old: &[T], new: &[T], max_lcs_cells: usize) -> Vec<(usize, usize)> {
    let cells = old.len().saturating_mul(new.len());
    if cells <= max_lcs_cells {
        lcs_alignment(old, new)
    } else {
        patience_alignment(old, new)
    }
}

/// Classic dynamic-programming LCS with backtracking from `(m, n)`.
///
/// The backtrack takes the diagonal whenever the two lines are equal,
/// otherwise moves toward the neighbour with the larger LCS length; ties
/// step in the old (row) direction.
pub(crate) fn lcs_alignment<T: PartialEq>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    let m = old.len();
    let n = new.len();
    let width = n + 1;
    let mut table = vec![0u32; (m + 1) * width];

    for i in 1..=m {
        for j in 1..=n {
            table[i * width + j] = if old[i - 1] == new[j - 1] {
                table[(i - 1) * width + (j - 1)] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + (j - 1)])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[m * width + n] as usize);
    let mut i = m;
    let mut j = n;
    while i > 0 && j > 0 {
        if old[i - 1] == new[j - 1] {
            pairs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if table[(i - 1) * width + j] >= table[i * width + (j - 1)] {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    pairs.reverse();
    pairs
}

#[derive(Default)]
struct Occurrence {
    old_count: usize,
    new_count: usize,
    old_index: usize,
    new_index: usize,
}

/// Anchor alignment on lines that occur exactly once on each side.
///
/// Repeated lines never anchor, so regions made of boilerplate come out as
/// remove/add blocks instead of aligning line by line.
pub(crate) fn patience_alignment<T: Eq + Hash>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    let mut occurrences: HashMap<&T, Occurrence> = HashMap::new();

    for (idx, line) in old.iter().enumerate() {
        let entry = occurrences.entry(line).or_default();
        entry.old_count += 1;
        entry.old_index = idx;
    }
    for (idx, line) in new.iter().enumerate() {
        // Lines absent from the old side can never anchor
        if let Some(entry) = occurrences.get_mut(line) {
            entry.new_count += 1;
            entry.new_index = idx;
        }
    }

    let mut pairs: Vec<(usize, usize)> = occurrences
        .values()
        .filter(|o| o.old_count == 1 && o.new_count == 1)
        .map(|o| (o.old_index, o.new_index))
        .collect();
    pairs.sort_unstable_by_key(|&(old_idx, _)| old_idx);

    longest_increasing_by_new(&pairs)
}

/// Longest strictly increasing subsequence of new indices (patience sorting)
fn longest_increasing_by_new(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; pairs.len()];

    for (idx, &(_, new_idx)) in pairs.iter().enumerate() {
        let pos = tails.partition_point(|&t| pairs[t].1 < new_idx);
        if pos > 0 {
            prev[idx] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(idx);
        } else {
            tails[pos] = idx;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(idx) = cursor {
        result.push(pairs[idx]);
        cursor = prev[idx];
    }
    result.reverse();
    result
}
