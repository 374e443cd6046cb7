//! The full set of cache key dimensions for one build artifact.

use crate::cachekey::generator::{BuildConditions, CacheKeyGenerator, GeneratorKind};
use crate::core::ModgraphError;
use std::collections::BTreeMap;

/// At most one generator per [`GeneratorKind`].
///
/// Adding a generator of a kind that is already present combines the two, so the set
/// converges on one generator per dimension covering every determinant observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyGeneratorSet {
    generators: BTreeMap<GeneratorKind, CacheKeyGenerator>,
}

impl KeyGeneratorSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `generator`, combining it with any existing one of the same kind.
    ///
    /// # Errors
    ///
    /// [`ModgraphError::ProvisionalConflict`] if both are provisional. The set is
    /// unchanged on error.
    pub fn add(&mut self, generator: CacheKeyGenerator) -> Result<(), ModgraphError> {
        let kind = generator.kind().clone();
        let combined = match self.generators.get(&kind) {
            Some(existing) => existing.clone().try_combine(generator)?,
            None => generator,
        };
        self.generators.insert(kind, combined);
        Ok(())
    }

    /// Add every generator of `other`.
    ///
    /// All or nothing: if any generator fails to combine, `self` is unchanged.
    pub fn merge(&mut self, other: Self) -> Result<(), ModgraphError> {
        let mut staged = self.clone();
        for generator in other.generators.into_values() {
            staged.add(generator)?;
        }
        *self = staged;
        Ok(())
    }

    /// The generator for `kind`, if any.
    pub fn get(&self, kind: &GeneratorKind) -> Option<&CacheKeyGenerator> {
        self.generators.get(kind)
    }

    /// Generators in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheKeyGenerator> {
        self.generators.values()
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// True if no dimension has been added.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// True if any member is still provisional.
    pub fn is_provisional(&self) -> bool {
        self.generators.values().any(CacheKeyGenerator::is_provisional)
    }

    /// Full cache key for `conditions`, fragments joined with `;` in kind order.
    ///
    /// `None` while any member is provisional: such a key must not be used to decide a
    /// cache hit.
    pub fn cache_key(&self, conditions: &BuildConditions) -> Option<String> {
        let fragments = self
            .generators
            .values()
            .map(|generator| generator.generate_key(conditions))
            .collect::<Option<Vec<_>>>()?;
        Some(fragments.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_kind_combines() {
        let mut set = KeyGeneratorSet::new();
        set.add(CacheKeyGenerator::features(["a"])).unwrap();
        set.add(CacheKeyGenerator::features(["b"])).unwrap();
        set.add(CacheKeyGenerator::locales(["en"])).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(&GeneratorKind::Feature), Some(&CacheKeyGenerator::features(["a", "b"])));
    }

    #[test]
    fn test_cache_key_order_is_stable() {
        let mut set = KeyGeneratorSet::new();
        set.add(CacheKeyGenerator::locales(["en"])).unwrap();
        set.add(CacheKeyGenerator::features(["dom"])).unwrap();

        let conditions = BuildConditions::default().with_feature("dom", true).with_locale("en");
        assert_eq!(set.cache_key(&conditions).unwrap(), "feature{dom};locale{en}");
    }

    #[test]
    fn test_provisional_member_blocks_key() {
        let mut set = KeyGeneratorSet::new();
        set.add(CacheKeyGenerator::features(["dom"])).unwrap();
        set.add(CacheKeyGenerator::provisional(GeneratorKind::Locale, Some(["en"]))).unwrap();
        assert!(set.is_provisional());
        assert!(set.cache_key(&BuildConditions::default()).is_none());

        // A settled locale generator supersedes the provisional one
        set.add(CacheKeyGenerator::locales(["fr"])).unwrap();
        assert!(!set.is_provisional());
        assert_eq!(set.cache_key(&BuildConditions::default()).unwrap(), "feature{};locale{}");
    }

    #[test]
    fn test_merge_reports_conflict() {
        let mut left = KeyGeneratorSet::new();
        left.add(CacheKeyGenerator::provisional(GeneratorKind::Feature, Some(["a"]))).unwrap();
        let mut right = KeyGeneratorSet::new();
        right.add(CacheKeyGenerator::provisional(GeneratorKind::Feature, Some(["b"]))).unwrap();
        assert!(matches!(left.merge(right), Err(ModgraphError::ProvisionalConflict { .. })));
    }

    #[test]
    fn test_failed_add_keeps_provisional_dimension() {
        let mut set = KeyGeneratorSet::new();
        set.add(CacheKeyGenerator::provisional(GeneratorKind::Feature, Some(["dom"]))).unwrap();
        set.add(CacheKeyGenerator::locales(["en"])).unwrap();
        let before = set.clone();

        let err = set
            .add(CacheKeyGenerator::provisional(GeneratorKind::Feature, Some(["touch"])))
            .unwrap_err();
        assert!(matches!(err, ModgraphError::ProvisionalConflict { .. }));
        assert_eq!(set, before);
        assert!(set.get(&GeneratorKind::Feature).is_some());
        assert!(set.cache_key(&BuildConditions::default()).is_none());
    }

    #[test]
    fn test_failed_merge_leaves_set_unchanged() {
        let mut left = KeyGeneratorSet::new();
        left.add(CacheKeyGenerator::provisional(GeneratorKind::Locale, Some(["en"]))).unwrap();
        let before = left.clone();

        // The feature generator is applied before the conflicting locale one
        let mut right = KeyGeneratorSet::new();
        right.add(CacheKeyGenerator::features(["dom"])).unwrap();
        right.add(CacheKeyGenerator::provisional(GeneratorKind::Locale, Some(["fr"]))).unwrap();

        assert!(left.merge(right).is_err());
        assert_eq!(left, before);
        assert!(left.get(&GeneratorKind::Feature).is_none());
    }
}
