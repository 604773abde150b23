//! Climate index analysis command-line interface.
//!
//! Commands:
//! - `authenticate`: verify access to the compute service and store the project
//! - `analyze`: resolve a request, evaluate it per year and print a summary
//! - `export`: export a stored result as GeoTIFF, CSV or NetCDF
//! - `list`: show registered datasets or indices
//! - `register`: add a custom dataset or index from a JSON file
//! - `help`: describe a command

pub mod cli;
pub mod commands;
pub mod exit;
