//! Raster: Geometrie (Ursprung, Auflösung, Größe) und die beiden Zellvarianten.
//!
//! Zeilenweise gespeichert, Zeile 0 liegt am südlichen Rand (kleinstes Y).

use glam::DVec2;

use super::bounds::MapBounds;

/// Lage und Größe eines Rasters in Weltkoordinaten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Weltkoordinate der unteren linken Zellecke
    pub origin: DVec2,
    /// Meter pro Zelle
    pub resolution: f64,
    pub rows: usize,
    pub cols: usize,
}

impl GridGeometry {
    /// Leitet die Rastergröße aus den Bounds ab: `ceil(ausdehnung / auflösung) + 1`.
    pub fn from_bounds(bounds: &MapBounds, resolution: f64) -> Self {
        let cols = (bounds.width() / resolution).ceil().max(0.0) as usize + 1;
        let rows = (bounds.height() / resolution).ceil().max(0.0) as usize + 1;
        Self {
            origin: DVec2::new(bounds.min_x, bounds.min_y),
            resolution,
            rows,
            cols,
        }
    }

    /// Wie [`GridGeometry::from_bounds`], `None` bei mehr als `max_cells` Zellen
    /// oder nicht-endlichen Bounds.
    pub fn checked_from_bounds(
        bounds: &MapBounds,
        resolution: f64,
        max_cells: usize,
    ) -> Option<Self> {
        let cols = (bounds.width() / resolution).ceil() + 1.0;
        let rows = (bounds.height() / resolution).ceil() + 1.0;
        if !(cols.is_finite() && rows.is_finite()) || cols * rows > max_cells as f64 {
            return None;
        }
        Some(Self::from_bounds(bounds, resolution))
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Zelle `(row, col)` für einen Weltpunkt, `None` außerhalb des Rasters.
    pub fn cell_of(&self, world: DVec2) -> Option<(usize, usize)> {
        let local = (world - self.origin) / self.resolution;
        let col = local.x.floor();
        let row = local.y.floor();
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row < self.rows && col < self.cols {
            Some((row, col))
        } else {
            None
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }
}

/// Zweidimensionales Raster mit beliebigem Zelltyp.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    geometry: GridGeometry,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    pub fn filled(geometry: GridGeometry, value: T) -> Self {
        Self {
            geometry,
            cells: vec![value; geometry.cell_count()],
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn rows(&self) -> usize {
        self.geometry.rows
    }

    pub fn cols(&self) -> usize {
        self.geometry.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.geometry.rows && col < self.geometry.cols {
            Some(self.cells[self.geometry.index(row, col)])
        } else {
            None
        }
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        let index = self.geometry.index(row, col);
        self.cells[index] = value;
    }

    /// Zellen zeilenweise (Zeile 0 zuerst).
    pub fn cells(&self) -> &[T] {
        &self.cells
    }
}

/// Binäres Befahrbarkeits-Raster (0/1, ODER-Verknüpfung).
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    grid: Grid<u8>,
}

impl OccupancyGrid {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            grid: Grid::filled(geometry, 0),
        }
    }

    /// Markiert die Zelle unter `world` als befahrbar. Gibt `false` zurück,
    /// wenn der Punkt außerhalb liegt (wird still verworfen).
    pub fn mark(&mut self, world: DVec2) -> bool {
        match self.grid.geometry.cell_of(world) {
            Some((row, col)) => {
                self.grid.set(row, col, 1);
                true
            }
            None => false,
        }
    }

    pub fn grid(&self) -> &Grid<u8> {
        &self.grid
    }

    /// Anzahl befahrbarer Zellen.
    pub fn occupied_count(&self) -> usize {
        self.grid.cells.iter().filter(|&&c| c != 0).count()
    }
}

/// Höhen-Raster. Unberührte Zellen sind NaN bis [`HeightGrid::finish`].
#[derive(Debug, Clone)]
pub struct HeightGrid {
    grid: Grid<f64>,
}

impl HeightGrid {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            grid: Grid::filled(geometry, f64::NAN),
        }
    }

    /// Überschreibt die Zelle unter `world` (letzter Schreiber gewinnt).
    pub fn write(&mut self, world: DVec2, height: f64) -> bool {
        match self.grid.geometry.cell_of(world) {
            Some((row, col)) => {
                self.grid.set(row, col, height);
                true
            }
            None => false,
        }
    }

    /// Anzahl gemessener Zellen (vor `finish`).
    pub fn measured_count(&self) -> usize {
        self.grid.cells.iter().filter(|c| !c.is_nan()).count()
    }

    /// Ersetzt alle ungemessenen Zellen durch 0.
    pub fn finish(mut self) -> Grid<f64> {
        for cell in &mut self.grid.cells {
            if cell.is_nan() {
                *cell = 0.0;
            }
        }
        self.grid
    }

    pub fn grid(&self) -> &Grid<f64> {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_geometry(resolution: f64) -> GridGeometry {
        GridGeometry::from_bounds(&MapBounds::FALLBACK, resolution)
    }

    #[test]
    fn test_fallback_bounds_dimensions() {
        let geometry = unit_geometry(1.0);
        assert_eq!((geometry.rows, geometry.cols), (2, 2));
        let geometry = unit_geometry(0.5);
        assert_eq!((geometry.rows, geometry.cols), (3, 3));
    }

    #[test]
    fn test_checked_rejects_oversized_bounds() {
        let huge = MapBounds {
            min_x: 0.0,
            max_x: 1e12,
            min_y: 0.0,
            max_y: 1e12,
        };
        assert!(GridGeometry::checked_from_bounds(&huge, 0.5, 1_000_000).is_none());
        assert!(GridGeometry::checked_from_bounds(&MapBounds::FALLBACK, 0.5, 9).is_some());
        assert!(GridGeometry::checked_from_bounds(&MapBounds::FALLBACK, 0.5, 8).is_none());
    }

    #[test]
    fn test_cell_of_floors_and_rejects_outside() {
        let geometry = unit_geometry(0.5);
        assert_eq!(geometry.cell_of(DVec2::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(geometry.cell_of(DVec2::new(0.74, 0.26)), Some((0, 1)));
        assert_eq!(geometry.cell_of(DVec2::new(-0.01, 0.0)), None);
        assert_eq!(geometry.cell_of(DVec2::new(1.5, 0.0)), None);
        assert_eq!(geometry.cell_of(DVec2::new(f64::NAN, 0.0)), None);
    }

    #[test]
    fn test_occupancy_mark_is_idempotent() {
        let mut grid = OccupancyGrid::new(unit_geometry(0.5));
        assert!(grid.mark(DVec2::new(0.2, 0.2)));
        assert!(grid.mark(DVec2::new(0.3, 0.3)));
        assert_eq!(grid.occupied_count(), 1);
        assert!(!grid.mark(DVec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_height_unmeasured_resolves_to_zero() {
        let mut grid = HeightGrid::new(unit_geometry(0.5));
        grid.write(DVec2::new(0.6, 0.6), 2.5);
        grid.write(DVec2::new(0.6, 0.6), 7.0);
        assert_eq!(grid.measured_count(), 1);

        let finished = grid.finish();
        assert_eq!(finished.get(1, 1), Some(7.0));
        assert_eq!(finished.get(0, 0), Some(0.0));
        assert!(finished.cells().iter().all(|c| !c.is_nan()));
    }
}
