//! XODR-Map-Compiler Library.
//! Kompiliert OpenDRIVE-Straßennetze zu Argoverse-Kartenartefakten; als
//! Library exportiert für CLI, Tests und Benchmarks.

pub mod batch;
pub mod compile;
pub mod core;
pub mod export;
pub mod shared;
pub mod xodr;

pub use batch::{compile_batch, compile_path, discover_documents, write_batch, BatchReport};
pub use compile::{
    compile_network, BBoxEntry, CompilationContext, CompiledMap, GraphMode, LaneIdAllocator,
};
pub use core::{
    BoundsCalculator, BoundsOutcome, CompileError, MapBounds, RoadNetwork, TransformMatrix,
    VectorGraph,
};
pub use export::write_artifacts;
pub use shared::{ArtifactNames, BBoxApproximation, BatchMode, CompilerOptions};
pub use xodr::{parse_xodr, parse_xodr_file};
