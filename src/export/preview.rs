//! PNG-Vorschau des Befahrbarkeitsrasters.

use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use std::path::Path;

use crate::core::Grid;

/// Graustufenbild: befahrbar = weiß, sonst schwarz.
///
/// Rasterzeile 0 liegt am südlichen Rand und wird daher als unterste
/// Bildzeile gezeichnet.
pub fn occupancy_preview(grid: &Grid<u8>) -> GrayImage {
    let rows = grid.rows() as u32;
    let cols = grid.cols() as u32;
    GrayImage::from_fn(cols, rows, |x, y| {
        let row = (rows - 1 - y) as usize;
        let occupied = grid.get(row, x as usize).unwrap_or(0) != 0;
        Luma([if occupied { 255 } else { 0 }])
    })
}

/// Speichert die Vorschau als PNG.
pub fn save_occupancy_preview(grid: &Grid<u8>, path: &Path) -> Result<()> {
    occupancy_preview(grid)
        .save(path)
        .with_context(|| format!("Vorschau konnte nicht gespeichert werden: {}", path.display()))?;
    log::info!("Vorschau gespeichert: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GridGeometry, MapBounds, OccupancyGrid};
    use glam::DVec2;

    #[test]
    fn test_row_zero_is_bottom_of_image() {
        let geometry = GridGeometry::from_bounds(&MapBounds::FALLBACK, 0.5);
        let mut occupancy = OccupancyGrid::new(geometry);
        occupancy.mark(DVec2::new(0.1, 0.1));

        let image = occupancy_preview(occupancy.grid());
        assert_eq!(image.dimensions(), (3, 3));
        assert_eq!(image.get_pixel(0, 2).0, [255]);
        assert_eq!(image.get_pixel(0, 0).0, [0]);
    }
}
