//! Kompilier-Pipeline: Rasterisierung, Bounding-Boxen, Spurgraph und der
//! Kontext, der sie über mehrere Dokumente zusammenhält.

pub mod bbox;
pub mod context;
pub mod lane_graph;
pub mod lane_ids;
pub mod raster;

pub use bbox::{extract_bboxes, primitive_bbox, BBoxEntry};
pub use context::{compile_network, CompilationContext, CompiledMap, DocumentReport};
pub use lane_graph::{GraphCheckpoint, GraphDelta, GraphMode, LaneGraphCompiler};
pub use lane_ids::{LaneIdAllocator, LANE_ID_MAX, LANE_ID_MIN};
pub use raster::{lane_samples, rasterize_network, RasterStats};
