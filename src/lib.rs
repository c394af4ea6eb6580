// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! # elt-builder - ELT pipeline builder
//!
//! `elt-builder` scaffolds and manages pipeline definitions for two
//! extract-load tools kept side by side in one git repository:
//!
//! - **dlt** pipelines are generated as Python programs (`pipeline.py`)
//! - **Sling** pipelines are generated as declarative replications
//!   (`replication.yaml`)
//!
//! Each pipeline lives in `pipelines/<tool>/<name>/` next to a scheduler
//! descriptor (`dagster.yaml`), a configuration snapshot (`config.yaml`)
//! and a `README.md`.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scaffold a pipeline; the tool is picked from the source type
//! elt create gh1 --source github --destination snowflake
//!
//! # List, validate and toggle
//! elt list
//! elt validate
//! elt disable gh1
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! use elt_builder::pipeline::{PipelineGenerator, PipelineRegistry, PipelineRequest};
//!
//! # fn main() -> elt_builder::EltResult<()> {
//! let registry = PipelineRegistry::new("/srv/pipelines-repo");
//! let request = PipelineRequest::new("pg1", "postgres", "bigquery").with_config("tables", "users,orders");
//! let location = registry.create(&request, &PipelineGenerator::new())?;
//! println!("created {}", location.path.display());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod errors;
pub mod pipeline;
pub mod settings;
pub mod utils;
pub mod vcs;

// Re-export commonly used types
pub use errors::{EltError, EltResult};
pub use pipeline::{PipelineRegistry, PipelineRequest, Tool};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
