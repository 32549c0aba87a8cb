//! Intervention catalogs.
//!
//! A catalog is the closed set of interventions the engine understands. Each
//! entry carries fixed per-unit-weight reduction coefficients for every
//! metric, plus the threshold above which its recommendation fires. The
//! catalog also owns the per-metric ceilings applied after composition.
//!
//! Two catalogs ship with the crate:
//!
//! - [`InterventionCatalog::weighted`]: five interventions driven by weights
//!   in `[0, 1]`. This is the canonical catalog.
//! - [`InterventionCatalog::selection`]: eighteen on/off interventions with
//!   fixed AQI fractions and fixed cross-metric ratios.
//!
//! Both are plain data and are also shipped as JSON files under `catalogs/`.
//! Any other catalog can be loaded with [`InterventionCatalog::from_json`].

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogError;
use crate::metric::{Metric, MetricTable};

/// One intervention in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionSpec {
    /// Stable wire key (e.g. `lowEmissionZone`).
    pub key: String,
    /// Display label.
    pub label: String,
    /// Reduction fraction per unit weight, per metric.
    pub coefficients: MetricTable,
    /// The recommendation fires when the weight is strictly above this.
    #[serde(default)]
    pub activation_threshold: f64,
    /// Recommendation text, if this intervention has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl InterventionSpec {
    fn new(key: &str, label: &str, coefficients: MetricTable) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            coefficients,
            activation_threshold: 0.0,
            recommendation: None,
        }
    }

    fn recommend(mut self, threshold: f64, text: &str) -> Self {
        self.activation_threshold = threshold;
        self.recommendation = Some(text.to_string());
        self
    }

    /// Selection-style entry: a fixed AQI fraction with fixed cross-metric ratios.
    fn selection(key: &str, label: &str, aqi_fraction: f64) -> Self {
        Self::new(
            key,
            label,
            MetricTable::new(
                aqi_fraction,
                aqi_fraction * SELECTION_PM25_RATIO,
                aqi_fraction * SELECTION_NO2_RATIO,
                aqi_fraction,
            ),
        )
    }
}

const SELECTION_PM25_RATIO: f64 = 0.8;
const SELECTION_NO2_RATIO: f64 = 0.4;

/// On-disk / wire form of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    name: String,
    ceilings: MetricTable,
    interventions: Vec<InterventionSpec>,
}

/// A validated, indexed set of interventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile", into = "CatalogFile")]
pub struct InterventionCatalog {
    name: String,
    ceilings: MetricTable,
    entries: Vec<InterventionSpec>,
    index: HashMap<String, usize>,
}

impl PartialEq for InterventionCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ceilings == other.ceilings && self.entries == other.entries
    }
}

impl TryFrom<CatalogFile> for InterventionCatalog {
    type Error = CatalogError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        Self::new(file.name, file.ceilings, file.interventions)
    }
}

impl From<InterventionCatalog> for CatalogFile {
    fn from(catalog: InterventionCatalog) -> Self {
        Self {
            name: catalog.name,
            ceilings: catalog.ceilings,
            interventions: catalog.entries,
        }
    }
}

impl InterventionCatalog {
    /// Builds and validates a catalog.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` for empty catalogs, empty or duplicate keys,
    /// negative or non-finite coefficients/thresholds, and ceilings outside
    /// `[0, 1]`.
    pub fn new(
        name: impl Into<String>,
        ceilings: MetricTable,
        entries: Vec<InterventionSpec>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        if entries.is_empty() {
            return Err(CatalogError::Empty { name });
        }

        for (metric, ceiling) in ceilings.iter() {
            if !ceiling.is_finite() || !(0.0..=1.0).contains(&ceiling) {
                return Err(CatalogError::InvalidCeiling {
                    metric: metric.to_string(),
                    value: ceiling,
                });
            }
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (i, spec) in entries.iter().enumerate() {
            validate_spec(spec)?;
            if index.insert(spec.key.clone(), i).is_some() {
                return Err(CatalogError::DuplicateKey {
                    key: spec.key.clone(),
                });
            }
        }

        Ok(Self {
            name,
            ceilings,
            entries,
            index,
        })
    }

    /// The canonical weighted catalog.
    #[must_use]
    pub fn weighted() -> Self {
        let entries = vec![
            InterventionSpec::new(
                "trafficSignalRetiming",
                "Traffic Signal Retiming",
                MetricTable::new(0.15, 0.15 * 0.8, 0.15 * 0.6, 0.0),
            )
            .recommend(0.5, "Implement adaptive traffic signal timing at key intersections"),
            InterventionSpec::new(
                "lowEmissionZone",
                "Low Emission Zone",
                MetricTable::new(0.25, 0.25 * 0.9, 0.25 * 0.7, 0.0),
            )
            .recommend(0.3, "Establish Low Emission Zone with vehicle restrictions"),
            InterventionSpec::new(
                "bikeLaneModalShift",
                "Bike Lane Modal Shift",
                MetricTable::new(0.20, 0.20 * 0.7, 0.20 * 0.8, 0.20 * 0.3),
            )
            .recommend(
                0.4,
                "Create protected bike lanes and improve pedestrian infrastructure",
            ),
            InterventionSpec::new(
                "greenBuffer",
                "Green Buffer",
                MetricTable::new(0.10, 0.10 * 0.6, 0.10 * 0.4, 0.0),
            )
            .recommend(0.3, "Plant street trees and create green buffers along major roads"),
            InterventionSpec::new(
                "rerouting",
                "Rerouting",
                MetricTable::new(0.18, 0.18 * 0.8, 0.18 * 0.7, 0.0),
            )
            .recommend(0.4, "Implement dynamic traffic management and alternative routing"),
        ];

        Self::from_builtin("weighted", MetricTable::new(0.60, 0.50, 0.40, 0.30), entries)
    }

    /// The on/off selection catalog.
    #[must_use]
    pub fn selection() -> Self {
        let entries = vec![
            // Traffic & transport
            InterventionSpec::selection("dedicatedBusLanes", "Dedicated Bus Lanes", 0.12),
            InterventionSpec::selection("bikeWalkingInfrastructure", "Bike & Walking Infrastructure", 0.08),
            InterventionSpec::selection("smartTrafficSignals", "Smart Traffic Signals", 0.10),
            InterventionSpec::selection("vehicleRestrictions", "Vehicle Restrictions", 0.15),
            InterventionSpec::selection("publicTransportBoost", "Public Transport Boost", 0.12),
            InterventionSpec::selection("evChargingIncentives", "EV Charging & Incentives", 0.15),
            // Urban design & environment
            InterventionSpec::selection("treeCanopyGreenBuffers", "Tree Canopy & Green Buffers", 0.08),
            InterventionSpec::selection("lowEmissionZone", "Low-Emission Zone (LEZ)", 0.18),
            InterventionSpec::selection("dustControlMeasures", "Dust Control Measures", 0.10),
            InterventionSpec::selection("streetTrees", "Street Trees", 0.06),
            InterventionSpec::selection("greenWalls", "Green Walls", 0.05),
            InterventionSpec::selection("permeablePavement", "Permeable Pavement", 0.04),
            // Policy & quick fixes
            InterventionSpec::selection("banOpenBurning", "Ban Open Burning", 0.20),
            InterventionSpec::selection("constructionDustControl", "Construction Dust Control", 0.12),
            InterventionSpec::selection("wasteManagement", "Waste Management", 0.08),
            InterventionSpec::selection("industrialEmissionControls", "Industrial Emission Controls", 0.22),
            InterventionSpec::selection("vehicleEmissionTesting", "Vehicle Emission Testing", 0.10),
            InterventionSpec::selection("publicAwareness", "Public Awareness", 0.05),
        ];

        Self::from_builtin("selection", MetricTable::new(1.0, 0.8, 0.4, 1.0), entries)
    }

    fn from_builtin(name: &str, ceilings: MetricTable, entries: Vec<InterventionSpec>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.key.clone(), i))
            .collect();
        Self {
            name: name.to_string(),
            ceilings,
            entries,
            index,
        }
    }

    /// Parses and validates a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON and any validation
    /// error from [`InterventionCatalog::new`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|e| CatalogError::Parse {
            message: e.to_string(),
        })?;
        Self::try_from(file)
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, otherwise as
    /// [`InterventionCatalog::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            catalog = %catalog.name,
            interventions = catalog.len(),
            path = %path.display(),
            "loaded intervention catalog"
        );
        Ok(catalog)
    }

    /// Serializes the catalog to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(self).map_err(|e| CatalogError::Parse {
            message: e.to_string(),
        })
    }

    /// Catalog name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-metric factor ceilings.
    #[must_use]
    pub const fn ceilings(&self) -> &MetricTable {
        &self.ceilings
    }

    /// Looks up an intervention by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&InterventionSpec> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Coefficient of `metric` for `key`, or zero if unknown.
    #[must_use]
    pub fn coefficient(&self, key: &str, metric: Metric) -> f64 {
        self.get(key).map_or(0.0, |spec| spec.coefficients.get(metric))
    }

    /// Returns true if `key` names an intervention in this catalog.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Interventions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &InterventionSpec> {
        self.entries.iter()
    }

    /// Number of interventions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a validated catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InterventionCatalog {
    fn default() -> Self {
        Self::weighted()
    }
}

fn validate_spec(spec: &InterventionSpec) -> Result<(), CatalogError> {
    if spec.key.trim().is_empty() {
        return Err(CatalogError::EmptyKey);
    }

    let invalid = |field: String, value: f64| CatalogError::InvalidCoefficient {
        key: spec.key.clone(),
        field,
        value,
    };

    for (metric, value) in spec.coefficients.iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("{metric} coefficient"), value));
        }
    }

    let threshold = spec.activation_threshold;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(invalid("activation threshold".to_string(), threshold));
    }

    Ok(())
}

/// Which built-in catalog to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogVariant {
    /// Five weighted interventions.
    #[default]
    Weighted,
    /// Eighteen on/off interventions.
    Selection,
}

impl CatalogVariant {
    /// Builds the catalog for this variant.
    #[must_use]
    pub fn build(self) -> InterventionCatalog {
        match self {
            Self::Weighted => InterventionCatalog::weighted(),
            Self::Selection => InterventionCatalog::selection(),
        }
    }
}

impl fmt::Display for CatalogVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weighted => write!(f, "weighted"),
            Self::Selection => write!(f, "selection"),
        }
    }
}

impl FromStr for CatalogVariant {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(Self::Weighted),
            "selection" => Ok(Self::Selection),
            other => Err(CatalogError::UnknownVariant {
                name: other.to_string(),
            }),
        }
    }
}
