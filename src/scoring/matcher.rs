//! Character-level similarity ratio based on longest matching blocks.
//!
//! The ratio is `2·M / T` where `T` is the combined length of both strings
//! and `M` the number of characters covered by matching blocks. Blocks are
//! found recursively: take the longest common run, then recurse on the
//! pieces to its left and right.
//!
//! When the second string has 200 or more characters, characters occurring
//! in more than 1% of its positions (plus one) are "popular" and cannot seed
//! a match, though a match seeded elsewhere may still extend across them.

use std::collections::HashMap;

/// Minimum length of `b` at which popular characters are ignored as seeds.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity ratio in `[0, 1]` between `a` and `b`.
///
/// Two empty strings are identical (ratio 1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = Matcher::new(&a, &b).matching_characters();
    2.0 * matched as f64 / total as f64
}

struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each non-popular character of `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &ch) in b.iter().enumerate() {
            b2j.entry(ch).or_default().push(j);
        }
        if b.len() >= AUTOJUNK_MIN_LEN {
            let threshold = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= threshold);
        }
        Self { a, b, b2j }
    }

    /// Total size of all matching blocks.
    fn matching_characters(&self) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    /// Longest common run within `a[alo..ahi]` and `b[blo..bhi]` as
    /// `(start in a, start in b, length)`. Ties go to the earliest run in `a`,
    /// then the earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j == 0 { 0 } else { run_ending_at.get(&(j - 1)).copied().unwrap_or(0) };
                    let k = prev + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            run_ending_at = next;
        }

        // Popular characters never seed a run but may extend one.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_one() {
        assert!(approx(similarity_ratio("rust news", "rust news"), 1.0));
        assert!(approx(similarity_ratio("", ""), 1.0));
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert!(approx(similarity_ratio("abc", "xyz"), 0.0));
        assert!(approx(similarity_ratio("", "abc"), 0.0));
    }

    #[test]
    fn known_ratios() {
        assert!(approx(similarity_ratio("abcd", "acbd"), 0.75));
        assert!(approx(similarity_ratio("abxcd", "abd"), 0.75));
        assert!(approx(similarity_ratio("private", "private thread"), 2.0 * 7.0 / 21.0));
    }

    #[test]
    fn ratio_is_bounded() {
        let r = similarity_ratio("ai news", "new ai chips announced today");
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn popular_characters_do_not_seed_matches_in_long_text() {
        // 'x' makes up most of the long text, so it is popular and cannot seed
        // a match; the lone 'y' still matches.
        let long: String = std::iter::repeat('x').take(250).chain(std::iter::once('y')).collect();
        let r = similarity_ratio("xy", &long);
        // Only "y" seeds; extension backwards picks up one 'x' → 2 matched.
        assert!(approx(r, 2.0 * 2.0 / 253.0));

        let short: String = std::iter::repeat('x').take(50).collect();
        assert!(approx(similarity_ratio("xx", &short), 2.0 * 2.0 / 52.0));
    }

    #[test]
    fn unseeded_search_still_extends_from_range_start() {
        // No seed exists at all, but the run at the start of both ranges is
        // still picked up by forward extension.
        let long: String = std::iter::repeat('x').take(250).collect();
        assert!(approx(similarity_ratio("xx", &long), 2.0 * 2.0 / 252.0));
    }
}
