//! Rundung von Koordinaten auf feste Nachkommastellen für die Deduplizierung.
//!
//! Zwei Punkte gelten als identisch, wenn ihre gerundeten Schlüssel gleich
//! sind. Die Toleranz ist damit `0.5 * 10^-decimals` und verlustbehaftet.

/// Ganzzahliger Schlüssel eines gerundeten Punkts.
pub type PointKey = (i64, i64);

/// Rundet auf `decimals` Nachkommastellen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    decimals: u32,
    scale: f64,
}

impl Quantizer {
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals,
            scale: 10f64.powi(decimals as i32),
        }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Ganzzahliger Schlüssel (`round(value * 10^decimals)`).
    pub fn key(&self, value: f64) -> i64 {
        (value * self.scale).round() as i64
    }

    pub fn point_key(&self, x: f64, y: f64) -> PointKey {
        (self.key(x), self.key(y))
    }

    /// Gerundeter Wert, wie er im Graph gespeichert wird.
    pub fn round(&self, value: f64) -> f64 {
        self.key(value) as f64 / self.scale
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(crate::shared::options::NODE_PRECISION_DECIMALS)
    }
}
