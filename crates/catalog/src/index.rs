//! Climate index descriptors and the index registry.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use climate_common::palette::default_palette;
use climate_common::Palette;

use crate::dataset::Variable;
use crate::error::{CatalogError, Result};

/// Index categories. Text forms are exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexCategory {
    Temperature,
    Precipitation,
}

impl IndexCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexCategory::Temperature => "Temperature",
            IndexCategory::Precipitation => "Precipitation",
        }
    }

    pub fn all() -> &'static [IndexCategory] {
        &[IndexCategory::Precipitation, IndexCategory::Temperature]
    }
}

impl FromStr for IndexCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Temperature" => Ok(IndexCategory::Temperature),
            "Precipitation" => Ok(IndexCategory::Precipitation),
            other => Err(CatalogError::UnknownCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for IndexCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-day comparison against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl Comparison {
    /// Operator function name in the compute service.
    pub fn service_name(&self) -> &'static str {
        match self {
            Comparison::GreaterThan => "Image.gt",
            Comparison::GreaterOrEqual => "Image.gte",
            Comparison::LessThan => "Image.lt",
            Comparison::LessOrEqual => "Image.lte",
        }
    }
}

/// How an index is computed from a year of source data.
///
/// Thresholds are in display units (millimetres, degrees Celsius); they are
/// converted to the dataset's native units when the expression is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexRecipe {
    Sum {
        variable: Variable,
    },
    Max {
        variable: Variable,
    },
    Min {
        variable: Variable,
    },
    /// Number of days where the comparison holds
    CountDays {
        variable: Variable,
        comparison: Comparison,
        threshold: f64,
    },
    /// Longest run of consecutive days where the comparison holds
    LongestSpell {
        variable: Variable,
        comparison: Comparison,
        threshold: f64,
    },
}

impl IndexRecipe {
    pub fn variable(&self) -> Variable {
        match self {
            IndexRecipe::Sum { variable }
            | IndexRecipe::Max { variable }
            | IndexRecipe::Min { variable }
            | IndexRecipe::CountDays { variable, .. }
            | IndexRecipe::LongestSpell { variable, .. } => *variable,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_vis_max() -> f64 {
    100.0
}

/// Unvalidated index configuration, as stored in custom index files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub category: IndexCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub units: String,
    #[serde(default = "default_true")]
    pub requires_daily: bool,
    #[serde(default)]
    pub min_vis_value: f64,
    #[serde(default = "default_vis_max")]
    pub max_vis_value: f64,
    #[serde(default = "default_palette")]
    pub palette: Palette,
    pub recipe: IndexRecipe,
}

/// Validated index metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexSpec", into = "IndexSpec")]
pub struct IndexDescriptor {
    category: IndexCategory,
    description: String,
    units: String,
    requires_daily: bool,
    vis_min: f64,
    vis_max: f64,
    palette: Palette,
    recipe: IndexRecipe,
}

impl IndexDescriptor {
    pub fn new(spec: IndexSpec) -> Result<Self> {
        if !(spec.min_vis_value < spec.max_vis_value) {
            return Err(CatalogError::InvalidDescriptor(format!(
                "visualization bounds inverted: min {} >= max {}",
                spec.min_vis_value, spec.max_vis_value
            )));
        }
        if spec.recipe.variable().category() != spec.category {
            return Err(CatalogError::InvalidDescriptor(format!(
                "{} index cannot be computed from {:?}",
                spec.category,
                spec.recipe.variable()
            )));
        }

        Ok(Self {
            category: spec.category,
            description: spec.description,
            units: spec.units,
            requires_daily: spec.requires_daily,
            vis_min: spec.min_vis_value,
            vis_max: spec.max_vis_value,
            palette: spec.palette,
            recipe: spec.recipe,
        })
    }

    pub fn category(&self) -> IndexCategory {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn requires_daily(&self) -> bool {
        self.requires_daily
    }

    /// Default visualization domain as (min, max).
    pub fn vis_range(&self) -> (f64, f64) {
        (self.vis_min, self.vis_max)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn recipe(&self) -> &IndexRecipe {
        &self.recipe
    }
}

impl TryFrom<IndexSpec> for IndexDescriptor {
    type Error = CatalogError;

    fn try_from(spec: IndexSpec) -> Result<Self> {
        IndexDescriptor::new(spec)
    }
}

impl From<IndexDescriptor> for IndexSpec {
    fn from(d: IndexDescriptor) -> Self {
        IndexSpec {
            category: d.category,
            description: d.description,
            units: d.units,
            requires_daily: d.requires_daily,
            min_vis_value: d.vis_min,
            max_vis_value: d.vis_max,
            palette: d.palette,
            recipe: d.recipe,
        }
    }
}

/// Registry of indices keyed by (category, name), in registration order.
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    indices: IndexMap<(IndexCategory, String), IndexDescriptor>,
    builtin_count: usize,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in indices.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, descriptor) in crate::builtin::indices() {
            registry
                .indices
                .insert((descriptor.category(), name.to_string()), descriptor);
        }
        registry.builtin_count = registry.indices.len();
        registry
    }

    pub fn register(
        &mut self,
        category: IndexCategory,
        name: &str,
        descriptor: IndexDescriptor,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidDescriptor(
                "index name must not be empty".to_string(),
            ));
        }
        if descriptor.category() != category {
            return Err(CatalogError::InvalidDescriptor(format!(
                "descriptor category {} does not match {}",
                descriptor.category(),
                category
            )));
        }

        let key = (category, name.to_string());
        if self.indices.contains_key(&key) {
            return Err(CatalogError::DuplicateIndex {
                category: category.to_string(),
                name: name.to_string(),
            });
        }

        info!(category = %category, index = %name, "Registered index");
        self.indices.insert(key, descriptor);
        Ok(())
    }

    pub fn get(&self, category: IndexCategory, name: &str) -> Result<&IndexDescriptor> {
        self.indices
            .get(&(category, name.to_string()))
            .ok_or_else(|| CatalogError::UnknownIndex {
                category: category.to_string(),
                name: name.to_string(),
            })
    }

    /// Entries in registration order, optionally restricted to one category.
    pub fn list(&self, category: Option<IndexCategory>) -> Vec<(&str, &IndexDescriptor)> {
        self.indices
            .iter()
            .filter(|((c, _), _)| category.map_or(true, |wanted| *c == wanted))
            .map(|((_, name), d)| (name.as_str(), d))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices registered after the built-ins.
    pub fn custom(&self) -> impl Iterator<Item = (&str, &IndexDescriptor)> {
        self.indices
            .iter()
            .skip(self.builtin_count)
            .map(|((_, name), d)| (name.as_str(), d))
    }
}
