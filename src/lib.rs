//! iconslice - cut grid sprite sheets into named icons
//!
//! This library provides functionality to:
//! - Describe a sheet as a rows × columns table of unique icon names
//! - Cut a composite image along that grid, with an optional per-cell inset
//! - Classify the resulting icons by pixel size
//! - Drive all of the above over a set of configured sheets

pub mod cli;
pub mod config;
pub mod crop;
pub mod grid;
pub mod output;
pub mod pipeline;
pub mod quality;
