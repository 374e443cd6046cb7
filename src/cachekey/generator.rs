//! A single cache key dimension and its combination rules.

use crate::core::ModgraphError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which build-condition dimension a generator covers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Boolean feature flags.
    Feature,
    /// Requested locales.
    Locale,
    /// A named, caller-defined dimension keyed by string values.
    Custom(String),
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feature => f.write_str("feature"),
            Self::Locale => f.write_str("locale"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// Determinant set with its commit state.
///
/// `None` means the dimension contributes no constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    /// Tentative; may still change once the build observes real values.
    Provisional(Option<BTreeSet<String>>),
    /// Settled and authoritative.
    Final(Option<BTreeSet<String>>),
}

impl KeyState {
    fn determinants(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Provisional(set) | Self::Final(set) => set.as_ref(),
        }
    }
}

/// Request-side values that cache keys are rendered from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConditions {
    /// Feature flags set by the request. Unlisted features are unset.
    pub features: BTreeMap<String, bool>,
    /// Requested locales, most preferred first.
    pub locales: Vec<String>,
    /// Values for custom dimensions.
    pub values: BTreeMap<String, String>,
}

impl BuildConditions {
    /// Set a feature flag.
    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    /// Append a requested locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locales.push(locale.into());
        self
    }

    /// Set a custom dimension value.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    fn has_locale(&self, determinant: &str) -> bool {
        self.locales.iter().any(|locale| {
            locale.eq_ignore_ascii_case(determinant)
                || locale
                    .get(..determinant.len() + 1)
                    .is_some_and(|p| p.eq_ignore_ascii_case(&format!("{determinant}-")))
        })
    }
}

/// One cache key dimension.
///
/// Equality compares kind, commit state, and determinant set, so a provisional
/// generator never equals a final one with the same determinants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKeyGenerator {
    kind: GeneratorKind,
    state: KeyState,
}

fn collect_set<I, S>(determinants: Option<I>) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    determinants.map(|items| items.into_iter().map(Into::into).collect())
}

impl CacheKeyGenerator {
    /// A final generator over `determinants`.
    pub fn new<I, S>(kind: GeneratorKind, determinants: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            state: KeyState::Final(collect_set(determinants)),
        }
    }

    /// A provisional generator over `determinants`.
    pub fn provisional<I, S>(kind: GeneratorKind, determinants: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            state: KeyState::Provisional(collect_set(determinants)),
        }
    }

    /// A final generator that places no constraint on its dimension.
    pub fn unconstrained(kind: GeneratorKind) -> Self {
        Self {
            kind,
            state: KeyState::Final(None),
        }
    }

    /// Final feature-flag generator.
    pub fn features<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(GeneratorKind::Feature, Some(names))
    }

    /// Final locale generator.
    pub fn locales<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(GeneratorKind::Locale, Some(tags))
    }

    /// The dimension this generator covers.
    pub fn kind(&self) -> &GeneratorKind {
        &self.kind
    }

    /// The commit state.
    pub fn state(&self) -> &KeyState {
        &self.state
    }

    /// Determinant set, `None` if unconstrained.
    pub fn determinants(&self) -> Option<&BTreeSet<String>> {
        self.state.determinants()
    }

    /// True while the determinant set is tentative.
    pub fn is_provisional(&self) -> bool {
        matches!(self.state, KeyState::Provisional(_))
    }

    /// Settle a provisional generator on the determinants the build actually observed.
    #[must_use]
    pub fn finalize<I, S>(self, determinants: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: self.kind,
            state: KeyState::Final(collect_set(determinants)),
        }
    }

    /// Combine with another generator of the same kind.
    ///
    /// Returns whichever input already covers the other, or a new final generator over
    /// the union of both determinant sets. The result does not depend on argument
    /// order.
    ///
    /// # Errors
    ///
    /// - [`ModgraphError::KindMismatch`] if the kinds differ
    /// - [`ModgraphError::ProvisionalConflict`] if both sides are provisional and not equal
    pub fn try_combine(self, other: Self) -> Result<Self, ModgraphError> {
        if self == other {
            return Ok(self);
        }
        if self.kind != other.kind {
            return Err(ModgraphError::KindMismatch {
                left: self.kind.to_string(),
                right: other.kind.to_string(),
            });
        }

        match (&self.state, &other.state) {
            (KeyState::Provisional(_), KeyState::Provisional(_)) => {
                return Err(ModgraphError::ProvisionalConflict {
                    kind: self.kind.to_string(),
                });
            }
            (KeyState::Provisional(_), KeyState::Final(_)) => return Ok(other),
            (KeyState::Final(_), KeyState::Provisional(_)) => return Ok(self),
            (KeyState::Final(_), KeyState::Final(_)) => {}
        }

        let (Some(mine), Some(theirs)) = (self.determinants(), other.determinants()) else {
            // No constraint on one side is absorbed by the other
            return Ok(if self.determinants().is_none() { other } else { self });
        };

        if mine.is_superset(theirs) {
            return Ok(self);
        }
        if theirs.is_superset(mine) {
            return Ok(other);
        }

        let union = mine.union(theirs).cloned().collect();
        Ok(Self {
            kind: self.kind,
            state: KeyState::Final(Some(union)),
        })
    }

    /// Combine with another generator of the same kind.
    ///
    /// # Panics
    ///
    /// If [`try_combine`](Self::try_combine) fails: two provisional generators or two
    /// different kinds can only meet through a sequencing bug in the caller.
    pub fn combine(self, other: Self) -> Self {
        match self.try_combine(other) {
            Ok(combined) => combined,
            Err(e) => panic!("invalid cache key combination: {e}"),
        }
    }

    /// Render this dimension's fragment of a cache key for `conditions`.
    ///
    /// Returns `None` while provisional. Determinants are visited in sorted order, so
    /// equal generators always render equal fragments for equal conditions.
    pub fn generate_key(&self, conditions: &BuildConditions) -> Option<String> {
        if self.is_provisional() {
            return None;
        }
        let Some(determinants) = self.determinants() else {
            return Some(self.kind.to_string());
        };

        let parts: Vec<String> = match &self.kind {
            GeneratorKind::Feature => determinants
                .iter()
                .filter_map(|name| match conditions.features.get(name) {
                    Some(true) => Some(name.clone()),
                    Some(false) => Some(format!("!{name}")),
                    None => None,
                })
                .collect(),
            GeneratorKind::Locale => determinants
                .iter()
                .filter(|tag| conditions.has_locale(tag))
                .cloned()
                .collect(),
            GeneratorKind::Custom(_) => determinants
                .iter()
                .filter_map(|name| {
                    conditions.values.get(name).map(|value| format!("{name}={value}"))
                })
                .collect(),
        };

        Some(format!("{}{{{}}}", self.kind, parts.join(",")))
    }
}
