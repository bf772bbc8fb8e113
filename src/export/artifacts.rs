//! Schreibt das vollständige Artefakt-Set einer Kompilierung in ein Verzeichnis.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::npy::write_npy;
use super::preview::save_occupancy_preview;
use super::table_map::write_table_map;
use super::vector_map::write_vector_map;
use crate::compile::CompiledMap;
use crate::shared::ArtifactNames;

/// Pfade aller geschriebenen Dateien.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenArtifacts {
    pub driveable_area: PathBuf,
    pub ground_height: PathBuf,
    pub transform: PathBuf,
    pub bbox_table: PathBuf,
    pub table_index_map: PathBuf,
    pub vector_map: PathBuf,
    pub preview: Option<PathBuf>,
}

/// Schreibt Raster, Transformation, BBox-Tabelle, Table-Index-Map und
/// Vektorkarte. Das Zielverzeichnis wird bei Bedarf angelegt.
pub fn write_artifacts(
    map: &CompiledMap,
    dir: &Path,
    names: &ArtifactNames,
    preview: bool,
) -> Result<WrittenArtifacts> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Ausgabeverzeichnis nicht anlegbar: {}", dir.display()))?;

    let shape = [map.occupancy.rows(), map.occupancy.cols()];
    let written = WrittenArtifacts {
        driveable_area: dir.join(names.driveable_area()),
        ground_height: dir.join(names.ground_height()),
        transform: dir.join(names.transform()),
        bbox_table: dir.join(names.bbox_table()),
        table_index_map: dir.join(names.table_index_map()),
        vector_map: dir.join(names.vector_map()),
        preview: preview.then(|| dir.join(names.preview())),
    };

    write_npy(&written.driveable_area, &shape, map.occupancy.cells())?;
    write_npy(&written.ground_height, &shape, map.height.cells())?;
    write_npy(&written.transform, &[3, 3], &map.transform.to_row_major())?;

    let bbox_rows: Vec<f64> = map.bboxes.iter().flat_map(|b| b.to_row()).collect();
    write_npy(&written.bbox_table, &[map.bboxes.len(), 4], &bbox_rows)?;

    let json = write_table_map(&map.table_map)?;
    std::fs::write(&written.table_index_map, json).with_context(|| {
        format!(
            "Table-Index-Map konnte nicht geschrieben werden: {}",
            written.table_index_map.display()
        )
    })?;

    std::fs::write(&written.vector_map, write_vector_map(&map.graph)).with_context(|| {
        format!(
            "Vektorkarte konnte nicht geschrieben werden: {}",
            written.vector_map.display()
        )
    })?;

    if let Some(path) = &written.preview {
        save_occupancy_preview(&map.occupancy, path)?;
    }

    log::info!(
        "Artefakte geschrieben nach {}: Raster {}x{}, {} BBoxen, {} Nodes, {} Spuren",
        dir.display(),
        shape[0],
        shape[1],
        map.bboxes.len(),
        map.graph.node_count(),
        map.graph.way_count()
    );
    Ok(written)
}
