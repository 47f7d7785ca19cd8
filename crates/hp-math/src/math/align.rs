//! Insertion/deletion-only sequence alignment.
//!
//! Aligns two sequences using only matches, left-only elements (deleted from
//! the left) and right-only elements (inserted from the right). The optimal
//! alignment maximises matches, i.e. it follows a longest common
//! subsequence; its cost is `left.len() + right.len() - 2 * lcs`.
//!
//! Among equally cheap alignments the walk prefers, at every step, a match,
//! then a left-only element, then a right-only element. The left sequence's
//! elements therefore come first wherever the order is otherwise free.

/// One step of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignStep {
    /// `left[left]` is aligned with `right[right]`.
    Match { left: usize, right: usize },
    /// `left[i]` has no counterpart on the right.
    LeftOnly(usize),
    /// `right[j]` has no counterpart on the left.
    RightOnly(usize),
}

/// A complete alignment of two sequences, in merged order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    steps: Vec<AlignStep>,
}

impl Alignment {
    pub fn steps(&self) -> &[AlignStep] {
        &self.steps
    }

    /// Number of non-matching steps (the indel edit distance).
    pub fn cost(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| !matches!(s, AlignStep::Match { .. }))
            .count()
    }

}

/// Align `left` against `right` with insertions and deletions only.
///
/// `eq` decides whether two elements may be matched.
pub fn align_indel<L, R, F>(left: &[L], right: &[R], eq: F) -> Alignment
where
    F: Fn(&L, &R) -> bool,
{
    let n = left.len();
    let m = right.len();
    let width = m + 1;

    // suffix[i * width + j] = LCS length of left[i..] and right[j..]
    let mut suffix = vec![0usize; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            suffix[i * width + j] = if eq(&left[i], &right[j]) {
                suffix[(i + 1) * width + j + 1] + 1
            } else {
                suffix[(i + 1) * width + j].max(suffix[i * width + j + 1])
            };
        }
    }

    let mut steps = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        let here = suffix[i * width + j];
        if i < n && j < m && eq(&left[i], &right[j]) && here == suffix[(i + 1) * width + j + 1] + 1
        {
            steps.push(AlignStep::Match { left: i, right: j });
            i += 1;
            j += 1;
        } else if i < n && here == suffix[(i + 1) * width + j] {
            steps.push(AlignStep::LeftOnly(i));
            i += 1;
        } else {
            steps.push(AlignStep::RightOnly(j));
            j += 1;
        }
    }

    Alignment { steps }
}
