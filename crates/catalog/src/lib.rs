//! Climate dataset and index catalog.
//!
//! Holds the dataset and index registries, the built-in entries, persistence
//! for user-registered entries, and the resolver that validates an analysis
//! request against both registries.

pub mod builtin;
pub mod custom;
pub mod dataset;
pub mod error;
pub mod index;
pub mod resolver;

pub use custom::CustomStore;
pub use dataset::{
    DatasetDescriptor, DatasetInfo, DatasetRegistry, DatasetSpec, TemporalResolution, Variable,
};
pub use error::{CatalogError, Result};
pub use index::{Comparison, IndexCategory, IndexDescriptor, IndexRecipe, IndexRegistry, IndexSpec};
pub use resolver::{Catalog, RequestDescriptor};
