#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rainwater harvesting model.
//!
//! Two pure, total functions: [`compute_harvest`] turns roof area and
//! annual rainfall into yield and savings figures, and [`assess`] grades
//! those figures against a fixed policy table.

pub mod assessment;
pub mod hydrology;

pub use assessment::assess;
pub use hydrology::compute_harvest;
