//! Core-Domänentypen: Straßennetz, Bounds, Transformation, Raster, Spurgraph.

pub mod bounds;
pub mod error;
pub mod graph;
pub mod grid;
pub mod quantize;
/// Geparste OpenDRIVE-Daten
///
/// - RoadNetwork: alle Straßen eines Dokuments
/// - RoadSegment: Referenzlinie, Spuren, Verknüpfungen
/// - LaneRecord: einzelne Spur mit konstanter Breite
pub mod road;
pub mod transform;

pub use bounds::{BoundsCalculator, BoundsOutcome, MapBounds};
pub use error::CompileError;
pub use graph::{TableIndexMap, TurnDirection, VectorGraph, VectorNode, VectorWay};
pub use grid::{Grid, GridGeometry, HeightGrid, OccupancyGrid};
pub use quantize::{PointKey, Quantizer};
pub use road::{
    ElevationRecord, GeometryPrimitive, LaneRecord, LaneSection, LinkTarget, PrimitiveKind,
    RoadLink, RoadNetwork, RoadSegment,
};
pub use transform::TransformMatrix;
