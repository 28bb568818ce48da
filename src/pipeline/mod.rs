//! Slice pipeline for iconslice
//!
//! Drives the crop engine over every configured sheet:
//! - **Context**: configuration plus the project root paths resolve against
//! - **Execution**: open each sheet, cut it, write icons through a sink
//! - **Check**: classify every written icon by size
//!
//! # Example
//!
//! ```ignore
//! use iconslice::config::load_config;
//! use iconslice::output::DirSink;
//! use iconslice::pipeline::{SliceContext, SlicePipeline};
//!
//! let config = load_config(None)?;
//! let context = SliceContext::new(config, project_root);
//! let sink = DirSink::create(context.out_dir())?;
//!
//! let result = SlicePipeline::new(context).run(&sink)?;
//! println!("Wrote {} icons", result.icon_count());
//! ```

pub mod context;
pub mod progress;
pub mod result;
pub mod runner;

pub use context::*;
pub use progress::*;
pub use result::*;
pub use runner::*;
