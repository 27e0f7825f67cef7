//! # screwed_core - Mechanical Design Calculation Engine
//!
//! `screwed_core` is the computational heart of Screwed: tolerance stacks,
//! thick-walled tubes, helical springs and screw threads. All inputs and
//! outputs are JSON-serializable so calculations can be stored in workbooks
//! or driven by other tools.
//!
//! ## Design Philosophy
//!
//! - **Any input, any order**: geometry is held in a [`graph::ParameterGraph`];
//!   supply whichever quantities you know and the rest is derived
//! - **Worst case**: tolerance arithmetic keeps every contributing deviation
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use screwed_core::stack;
//! use screwed_core::ToleranceValue;
//!
//! let gap = stack::evaluate("[40 ±0.1] - [39.5 ±0.05]").unwrap();
//! assert!((gap.nominal() - 0.5).abs() < 1e-9);
//!
//! let requirement: ToleranceValue = "0.5 ±0.2".parse().unwrap();
//! assert!(gap.lower_bound() >= requirement.lower_bound());
//! ```
//!
//! ## Modules
//!
//! - [`tolerance`] - Tolerance values and worst-case arithmetic
//! - [`stack`] - Tolerance stack expressions
//! - [`graph`] - Derived-parameter graph and dimension groups
//! - [`tube`], [`spring`], [`thread`] - Component models
//! - [`stresses`], [`materials`] - Shared stress formulas and material data
//! - [`workbook`], [`settings`] - Stored calculations and their defaults
//! - [`file_io`], [`export`] - Workbook files and CSV tables
//! - [`errors`] - Structured error types

pub mod errors;
pub mod export;
pub mod file_io;
pub mod graph;
pub mod materials;
mod scan;
pub mod settings;
pub mod spring;
pub mod stack;
pub mod stresses;
pub mod thread;
pub mod tolerance;
pub mod tube;
pub mod workbook;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_workbook, save_workbook};
pub use graph::ParameterGraph;
pub use settings::CalcSettings;
pub use tolerance::ToleranceValue;
pub use workbook::{CalculationItem, Workbook};
