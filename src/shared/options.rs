//! Zentrale Konfiguration für den XODR-Map-Compiler.
//!
//! `CompilerOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

use crate::core::CompileError;

// ── Raster ──────────────────────────────────────────────────────────

/// Meter pro Rasterzelle.
pub const GRID_RESOLUTION: f64 = 0.5;
/// Obergrenze der Zellen pro Raster.
pub const MAX_GRID_CELLS: usize = 400_000_000;

// ── Spuren ──────────────────────────────────────────────────────────

/// Spurbreite im Graphen, wenn ein Spur-Record keine Breite angibt.
pub const DEFAULT_LANE_WIDTH: f64 = 3.5;
/// Spurtyp, wenn das Attribut `type` fehlt.
pub const DEFAULT_LANE_TYPE: &str = "driving";

// ── Bounding-Boxen ──────────────────────────────────────────────────

/// Nominelle Breite für BBox-Ränder (nicht die echte Spurbreite).
pub const BBOX_NOMINAL_WIDTH: f64 = 3.5;

// ── Spurgraph ───────────────────────────────────────────────────────

/// Nachkommastellen für die Node-Deduplizierung.
pub const NODE_PRECISION_DECIMALS: u32 = 4;
/// Maximale Neuversuche bei einer Lane-ID-Kollision.
pub const LANE_ID_RETRY_LIMIT: u32 = 1000;

/// Näherungsstufe für die Bounding-Box je Primitiv.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BBoxApproximation {
    /// `[xs-h, ys-h, xe+h, ye+h]` (kann bei negativer Richtung invertiert sein)
    #[default]
    StartEnd,
    /// Min/Max beider Endpunkte, gepolstert um `h`
    Extent,
    /// Achsparallele Hülle des richtungsorientierten Rechtecks
    Footprint,
}

/// Zusammenführung mehrerer Eingabedokumente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// Ein globales Artefakt-Set mit dedupliziertem Spurgraph
    #[default]
    Global,
    /// Ein Artefakt-Set pro Dokument
    PerDocument,
}

/// Dateinamen der Artefakte (Argoverse-Konvention).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactNames {
    pub city_name: String,
    pub city_id: u32,
    /// Datums-Suffix der Raster-Dateien
    pub date_tag: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            city_name: "MIA".to_string(),
            city_id: 10316,
            date_tag: "2019_05_28".to_string(),
        }
    }
}

impl ArtifactNames {
    fn prefix(&self) -> String {
        format!("{}_{}", self.city_name, self.city_id)
    }

    pub fn driveable_area(&self) -> String {
        format!("{}_driveable_area_mat_{}.npy", self.prefix(), self.date_tag)
    }

    pub fn ground_height(&self) -> String {
        format!("{}_ground_height_mat_{}.npy", self.prefix(), self.date_tag)
    }

    pub fn transform(&self) -> String {
        format!("{}_npyimage_to_city_se2_{}.npy", self.prefix(), self.date_tag)
    }

    pub fn bbox_table(&self) -> String {
        format!("{}_halluc_bbox_table.npy", self.prefix())
    }

    pub fn table_index_map(&self) -> String {
        format!("{}_tableidx_to_laneid_map.json", self.prefix())
    }

    pub fn vector_map(&self) -> String {
        format!("pruned_argoverse_{}_vector_map.xml", self.prefix())
    }

    pub fn preview(&self) -> String {
        format!("{}_driveable_area_preview.png", self.prefix())
    }
}

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle Optionen einer Kompilierung. Wird als TOML geladen/gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    // ── Raster ──────────────────────────────────────────────────
    /// Meter pro Rasterzelle
    pub resolution: f64,
    /// Spurtypen, die in die Raster geschrieben werden
    pub drivable_lane_types: Vec<String>,
    pub max_grid_cells: usize,

    // ── BBox ────────────────────────────────────────────────────
    pub bbox_nominal_width: f64,
    pub bbox_approximation: BBoxApproximation,

    // ── Spurgraph ───────────────────────────────────────────────
    /// Nachkommastellen für Node-Schlüssel
    pub node_precision: u32,
    pub default_lane_width: f64,
    pub default_lane_type: String,
    /// Seed für die Lane-ID-Vergabe (None = Entropie)
    pub lane_id_seed: Option<u64>,
    pub lane_id_retry_limit: u32,

    // ── Ausgabe ─────────────────────────────────────────────────
    pub batch_mode: BatchMode,
    pub write_preview: bool,
    pub artifact_names: ArtifactNames,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            resolution: GRID_RESOLUTION,
            drivable_lane_types: vec![crate::core::road::LANE_TYPE_DRIVING.to_string()],
            max_grid_cells: MAX_GRID_CELLS,

            bbox_nominal_width: BBOX_NOMINAL_WIDTH,
            bbox_approximation: BBoxApproximation::default(),

            node_precision: NODE_PRECISION_DECIMALS,
            default_lane_width: DEFAULT_LANE_WIDTH,
            default_lane_type: DEFAULT_LANE_TYPE.to_string(),
            lane_id_seed: None,
            lane_id_retry_limit: LANE_ID_RETRY_LIMIT,

            batch_mode: BatchMode::default(),
            write_preview: false,
            artifact_names: ArtifactNames::default(),
        }
    }
}

impl CompilerOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Prüft Wertebereiche, bevor ein Raster angelegt wird.
    pub fn validate(&self) -> Result<(), CompileError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(CompileError::InvalidOptions(format!(
                "resolution muss > 0 sein, ist {}",
                self.resolution
            )));
        }
        if !(self.bbox_nominal_width.is_finite() && self.bbox_nominal_width >= 0.0) {
            return Err(CompileError::InvalidOptions(format!(
                "bbox_nominal_width muss >= 0 sein, ist {}",
                self.bbox_nominal_width
            )));
        }
        if self.node_precision > 9 {
            return Err(CompileError::InvalidOptions(format!(
                "node_precision höchstens 9, ist {}",
                self.node_precision
            )));
        }
        if self.lane_id_retry_limit == 0 {
            return Err(CompileError::InvalidOptions(
                "lane_id_retry_limit muss mindestens 1 sein".to_string(),
            ));
        }
        Ok(())
    }

    /// Prüft ob ein Spurtyp gerastert wird.
    pub fn is_drivable(&self, lane_type: &str) -> bool {
        self.drivable_lane_types.iter().any(|t| t == lane_type)
    }
}
