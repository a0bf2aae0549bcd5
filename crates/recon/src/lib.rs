//! `gridrecon-recon` — Reconciliation engine for irregular stacked-header reports.
//!
//! Pure engine crate: receives width-normalized grids, infers their layout,
//! builds labelled records and compares them across sources.
//! No CLI or IO dependencies.

pub mod aggregate;
pub mod blocks;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod grid;
pub mod header;
pub mod key;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod section;
pub mod tiers;

pub use config::{DuplicatePolicy, LayoutConfig, ReconConfig, TolerancePolicy};
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use extract::extract;
pub use grid::Grid;
pub use model::{Extraction, ReconInput, ReconResult, Record, SourceInput};
