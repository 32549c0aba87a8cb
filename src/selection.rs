//! Intervention selections.
//!
//! A selection maps intervention keys to either a weight in `[0, 1]` or an
//! on/off flag. Selections are built fresh per request and never mutated by
//! the engine. Unknown keys are kept (so they can be echoed back) but have no
//! effect.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::InterventionCatalog;

/// Weight of one intervention as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterventionWeight {
    /// On/off selection. `true` is full effect.
    Flag(bool),
    /// Fractional weight in `[0, 1]`.
    Weight(f64),
}

impl InterventionWeight {
    /// The weight the engine applies, clamped into `[0, 1]`.
    ///
    /// Non-finite weights have no effect.
    #[must_use]
    pub fn effective(self) -> f64 {
        match self {
            Self::Flag(true) => 1.0,
            Self::Flag(false) => 0.0,
            Self::Weight(w) if w.is_finite() => w.clamp(0.0, 1.0),
            Self::Weight(_) => 0.0,
        }
    }

    /// The weight exactly as supplied (flags map to 0 or 1).
    #[must_use]
    pub const fn raw(self) -> f64 {
        match self {
            Self::Flag(true) => 1.0,
            Self::Flag(false) => 0.0,
            Self::Weight(w) => w,
        }
    }
}

impl From<f64> for InterventionWeight {
    fn from(w: f64) -> Self {
        Self::Weight(w)
    }
}

impl From<bool> for InterventionWeight {
    fn from(selected: bool) -> Self {
        Self::Flag(selected)
    }
}

/// Intervention key → weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterventionSelection(BTreeMap<String, InterventionWeight>);

impl InterventionSelection {
    /// Empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one intervention.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, weight: impl Into<InterventionWeight>) -> Self {
        self.0.insert(key.into(), weight.into());
        self
    }

    /// Effective weight for `key`; zero when absent.
    #[must_use]
    pub fn weight(&self, key: &str) -> f64 {
        self.0.get(key).map_or(0.0, |w| w.effective())
    }

    /// Iterates the raw entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, InterventionWeight)> {
        self.0.iter().map(|(k, w)| (k.as_str(), *w))
    }

    /// Number of entries, including unknown keys and zero weights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Counts catalog interventions with a positive effective weight.
    #[must_use]
    pub fn active_count(&self, catalog: &InterventionCatalog) -> usize {
        self.0
            .iter()
            .filter(|(key, w)| catalog.contains(key) && w.effective() > 0.0)
            .count()
    }

    /// Keys that the catalog does not know.
    pub fn unknown_keys<'a>(
        &'a self,
        catalog: &'a InterventionCatalog,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .keys()
            .filter(move |k| !catalog.contains(k))
            .map(String::as_str)
    }
}

impl<K: Into<String>, W: Into<InterventionWeight>> FromIterator<(K, W)> for InterventionSelection {
    fn from_iter<I: IntoIterator<Item = (K, W)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, w)| (k.into(), w.into())).collect())
    }
}
