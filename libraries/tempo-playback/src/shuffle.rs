//! Shuffle permutations for queue play order
//!
//! The queue never reorders its tracks. Shuffling produces a permutation of
//! indices that is read on top of the canonical order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Random source for shuffling
///
/// Seeded when reproducible play orders are wanted (tests, demos).
pub(crate) fn shuffle_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Random permutation of `0..len` with `pinned` (if any) at position 0
///
/// Fisher-Yates over the remaining indices, so every ordering of the
/// unpinned tracks is equally likely.
pub(crate) fn pinned_permutation(len: usize, pinned: Option<usize>, rng: &mut StdRng) -> Vec<usize> {
    let mut rest: Vec<usize> = (0..len).filter(|&i| Some(i) != pinned).collect();
    rest.shuffle(rng);

    match pinned.filter(|&p| p < len) {
        Some(p) => {
            let mut order = Vec::with_capacity(len);
            order.push(p);
            order.extend(rest);
            order
        }
        None => rest,
    }
}
