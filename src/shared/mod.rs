//! Querschnittsmodule: Konfiguration.

pub mod options;

pub use options::{ArtifactNames, BBoxApproximation, BatchMode, CompilerOptions};
