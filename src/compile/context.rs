//! Kompilier-Kontext: besitzt Raster, BBox-Liste, Spurgraph und ID-Vergabe.
//!
//! Ein Dokument wird vollständig oder gar nicht übernommen: der Spurgraph
//! (einzige fehlbare Stufe) läuft auf einer Kopie von Graph und Allokator
//! und wird nur bei Erfolg übernommen, danach folgen Raster und BBoxen.

use anyhow::Result;

use super::bbox::{extract_bboxes, BBoxEntry};
use super::lane_graph::{GraphDelta, GraphMode, LaneGraphCompiler};
use super::lane_ids::LaneIdAllocator;
use super::raster::{rasterize_network, RasterStats};
use crate::core::{
    BoundsCalculator, BoundsOutcome, CompileError, Grid, GridGeometry, HeightGrid, MapBounds,
    OccupancyGrid, RoadNetwork, TableIndexMap, TransformMatrix, VectorGraph,
};
use crate::shared::CompilerOptions;

/// Versiegelte Artefakte einer Kompilierung.
#[derive(Debug, Clone)]
pub struct CompiledMap {
    pub bounds: MapBounds,
    /// `true`, wenn keine Geometrie gefunden wurde (Fallback-Bounds)
    pub degenerate: bool,
    pub transform: TransformMatrix,
    pub occupancy: Grid<u8>,
    /// Ungemessene Zellen sind bereits 0
    pub height: Grid<f64>,
    pub bboxes: Vec<BBoxEntry>,
    pub graph: VectorGraph,
    pub table_map: TableIndexMap,
}

impl CompiledMap {
    pub fn geometry(&self) -> &GridGeometry {
        self.occupancy.geometry()
    }
}

/// Beitrag eines einzelnen Dokuments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentReport {
    pub graph: GraphDelta,
    pub raster: RasterStats,
    pub bboxes: usize,
}

/// Gemeinsamer, veränderlicher Zustand über alle Dokumente eines Laufs.
#[derive(Debug)]
pub struct CompilationContext {
    options: CompilerOptions,
    bounds: BoundsOutcome,
    occupancy: OccupancyGrid,
    height: HeightGrid,
    bboxes: Vec<BBoxEntry>,
    graph: LaneGraphCompiler,
    ids: LaneIdAllocator,
    documents: usize,
}

impl CompilationContext {
    /// Legt die Raster aus den (bereits zusammengeführten) Bounds an.
    pub fn new(
        bounds: BoundsOutcome,
        mode: GraphMode,
        options: &CompilerOptions,
    ) -> Result<Self, CompileError> {
        Self::with_allocator(bounds, mode, options, LaneIdAllocator::from_options(options))
    }

    /// Wie [`CompilationContext::new`], aber mit einem vorhandenen Allokator
    /// (z.B. über mehrere Artefakt-Sets hinweg geteilt).
    pub fn with_allocator(
        bounds: BoundsOutcome,
        mode: GraphMode,
        options: &CompilerOptions,
        ids: LaneIdAllocator,
    ) -> Result<Self, CompileError> {
        let geometry = Self::grid_geometry(&bounds, options)?;
        Ok(Self::from_geometry(geometry, bounds, mode, options, ids))
    }

    /// Prüft die Optionen und bestimmt das Raster für `bounds`.
    ///
    /// Überschreitet das Raster `options.max_grid_cells`, ist das Ergebnis
    /// [`CompileError::DegenerateGeometry`].
    pub fn grid_geometry(
        bounds: &BoundsOutcome,
        options: &CompilerOptions,
    ) -> Result<GridGeometry, CompileError> {
        options.validate()?;

        let resolved = bounds.resolve();
        GridGeometry::checked_from_bounds(&resolved, options.resolution, options.max_grid_cells)
            .ok_or_else(|| {
                CompileError::DegenerateGeometry(format!(
                    "Raster für {:.1} x {:.1} m bei {} m/Zelle überschreitet {} Zellen",
                    resolved.width(),
                    resolved.height(),
                    options.resolution,
                    options.max_grid_cells
                ))
            })
    }

    /// Legt den Kontext auf einem bereits geprüften Raster an.
    pub fn from_geometry(
        geometry: GridGeometry,
        bounds: BoundsOutcome,
        mode: GraphMode,
        options: &CompilerOptions,
        ids: LaneIdAllocator,
    ) -> Self {
        log::info!(
            "Raster {}x{} (Zeilen x Spalten) bei {} m/Zelle",
            geometry.rows,
            geometry.cols,
            geometry.resolution
        );

        Self {
            options: options.clone(),
            bounds,
            occupancy: OccupancyGrid::new(geometry),
            height: HeightGrid::new(geometry),
            bboxes: Vec::new(),
            graph: LaneGraphCompiler::new(mode, options),
            ids,
            documents: 0,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        self.occupancy.grid().geometry()
    }

    pub fn graph(&self) -> &VectorGraph {
        self.graph.graph()
    }

    pub fn allocator(&self) -> &LaneIdAllocator {
        &self.ids
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    /// Übernimmt ein Dokument in alle Artefakte.
    ///
    /// Schlägt die ID-Vergabe fehl, bleibt der Kontext unverändert und die
    /// für dieses Dokument gezogenen IDs gelten wieder als frei.
    pub fn compile_document(&mut self, network: &RoadNetwork) -> Result<DocumentReport> {
        let checkpoint = self.graph.checkpoint();
        let graph = match self.graph.compile_document(network, &mut self.ids) {
            Ok(delta) => delta,
            Err(err) => {
                let released = self.graph.rollback(checkpoint, &mut self.ids);
                log::debug!("Spurgraph zurückgesetzt, {} Lane-IDs freigegeben", released);
                return Err(err.into());
            }
        };

        let raster =
            rasterize_network(network, &self.options, &mut self.occupancy, &mut self.height);
        let boxes = extract_bboxes(network, &self.options);
        let report = DocumentReport {
            graph,
            raster,
            bboxes: boxes.len(),
        };
        self.bboxes.extend(boxes);
        self.documents += 1;

        log::info!(
            "Dokument {} übernommen: {} Spuren, {} BBoxen, {} Rasterpunkte",
            network.name.as_deref().unwrap_or("<unbenannt>"),
            report.graph.lanes_added,
            report.bboxes,
            report.raster.samples_written
        );
        Ok(report)
    }

    /// Versiegelt die Artefakte.
    pub fn finish(self) -> CompiledMap {
        self.into_parts().0
    }

    /// Versiegelt die Artefakte und gibt den Allokator zurück.
    pub fn into_parts(self) -> (CompiledMap, LaneIdAllocator) {
        let bounds = self.bounds.resolve();
        let (graph, table_map) = self.graph.into_parts();
        let map = CompiledMap {
            bounds,
            degenerate: self.bounds.is_degenerate(),
            transform: TransformMatrix::from_bounds(&bounds),
            occupancy: self.occupancy.grid().clone(),
            height: self.height.finish(),
            bboxes: self.bboxes,
            graph,
            table_map,
        };
        (map, self.ids)
    }
}

/// Kompiliert ein einzelnes Dokument (eigene Bounds, Graph ohne Deduplizierung).
pub fn compile_network(network: &RoadNetwork, options: &CompilerOptions) -> Result<CompiledMap> {
    let bounds = BoundsCalculator::compute(network);
    let mut context = CompilationContext::new(bounds, GraphMode::PerDocument, options)?;
    context.compile_document(network)?;
    Ok(context.finish())
}
