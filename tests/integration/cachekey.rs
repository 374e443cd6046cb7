//! Combination properties over every pair drawn from a small generator pool.

use modgraph::cachekey::{CacheKeyGenerator, GeneratorKind};

fn pool() -> Vec<CacheKeyGenerator> {
    let sets: [&[&str]; 5] = [&[], &["a"], &["b"], &["a", "b"], &["a", "c"]];
    let mut pool: Vec<CacheKeyGenerator> =
        sets.iter().map(|set| CacheKeyGenerator::features(set.iter().copied())).collect();
    pool.push(CacheKeyGenerator::unconstrained(GeneratorKind::Feature));
    pool.push(CacheKeyGenerator::provisional(GeneratorKind::Feature, Some(["z"])));
    pool
}

#[test]
fn test_combine_is_commutative() {
    for a in pool() {
        for b in pool() {
            if a.is_provisional() && b.is_provisional() && a != b {
                continue;
            }
            assert_eq!(a.clone().combine(b.clone()), b.clone().combine(a.clone()), "{a:?} + {b:?}");
        }
    }
}

#[test]
fn test_combine_is_associative() {
    let settled: Vec<_> = pool().into_iter().filter(|g| !g.is_provisional()).collect();
    for a in &settled {
        for b in &settled {
            for c in &settled {
                let left = a.clone().combine(b.clone()).combine(c.clone());
                let right = a.clone().combine(b.clone().combine(c.clone()));
                assert_eq!(left, right, "{a:?} + {b:?} + {c:?}");
            }
        }
    }
}

#[test]
fn test_provisional_never_wins() {
    let tentative = CacheKeyGenerator::provisional(GeneratorKind::Feature, Some(["a", "b", "c"]));
    for settled in pool().into_iter().filter(|g| !g.is_provisional()) {
        assert_eq!(tentative.clone().combine(settled.clone()), settled);
    }
}
