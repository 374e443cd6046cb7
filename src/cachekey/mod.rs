//! Cache keys for built artifacts.
//!
//! Each build-condition dimension (feature flags, locales, custom values) contributes a
//! [`CacheKeyGenerator`] naming the determinants the artifact actually varies over.
//! Generators from independent build steps are combined per dimension until one
//! generator per kind remains; that [`KeyGeneratorSet`] then renders the key under
//! which the artifact is cached for a request's [`BuildConditions`].
//!
//! A generator may be *provisional*: its determinants are a guess made before the build
//! step that observes the real ones has run. Provisional generators never produce keys
//! and lose to any settled generator they are combined with. Combining two provisional
//! generators is a caller bug.
//!
//! ```rust
//! use modgraph::cachekey::{BuildConditions, CacheKeyGenerator, KeyGeneratorSet};
//!
//! let mut set = KeyGeneratorSet::new();
//! set.add(CacheKeyGenerator::features(["dom"]))?;
//! set.add(CacheKeyGenerator::features(["dom", "touch"]))?;
//!
//! let request = BuildConditions::default().with_feature("touch", false);
//! assert_eq!(set.cache_key(&request).as_deref(), Some("feature{!touch}"));
//! # Ok::<(), modgraph::core::ModgraphError>(())
//! ```

pub mod generator;
pub mod set;

pub use generator::{BuildConditions, CacheKeyGenerator, GeneratorKind, KeyState};
pub use set::KeyGeneratorSet;
