//! Default direction sequences that maximize variety.

use crate::direction::{Direction, Pool};

/// `n` directions interleaving the face, edge and corner pools.
///
/// Entry `i` comes from pool `i mod 3`; the position inside that pool advances after
/// each full face→edge→corner cycle and wraps per pool. Deterministic in `n`; repeats
/// are permitted once a pool is exhausted.
pub fn diverse_default_dirs(n: usize) -> Vec<Direction> {
    (0..n)
        .map(|i| {
            let pool = Pool::ALL[i % Pool::ALL.len()].members();
            pool[(i / Pool::ALL.len()) % pool.len()]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction::*;
    use proptest::prelude::*;

    #[test]
    fn interleaves_pools() {
        assert_eq!(diverse_default_dirs(0), vec![]);
        assert_eq!(diverse_default_dirs(3), vec![F1, E1, C1]);
        assert_eq!(diverse_default_dirs(7), vec![F1, E1, C1, F2, E2, C2, F3]);
    }

    #[test]
    fn short_rows_have_no_repeats() {
        let dirs = diverse_default_dirs(18);
        let mut seen = std::collections::HashSet::new();
        assert!(dirs.iter().all(|d| seen.insert(*d)));
    }

    #[test]
    fn long_rows_cycle() {
        let dirs = diverse_default_dirs(40);
        // Faces wrap after six cycles.
        assert_eq!(dirs[18], F1);
        assert_eq!(dirs[24], F3);
        // Corners wrap after eight cycles.
        assert_eq!(dirs[26], C1);
    }

    proptest! {
        #[test]
        fn length_matches_request(n in 0usize..200) {
            let dirs = diverse_default_dirs(n);
            prop_assert_eq!(dirs.len(), n);
            prop_assert!(dirs.iter().all(|d| Direction::ALL.contains(d)));
        }
    }
}
