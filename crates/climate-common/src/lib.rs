//! Common types and utilities shared across the climate index toolkit.

pub mod bbox;
pub mod error;
pub mod geometry;
pub mod palette;
pub mod years;

pub use bbox::BoundingBox;
pub use error::{CommonError, CommonResult};
pub use geometry::{Geometry, GeometryManager};
pub use palette::{Color, Palette};
pub use years::YearRange;
