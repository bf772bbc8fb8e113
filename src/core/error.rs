//! Strukturierte Fehlercodes für die Kompilier-Pipeline.
//!
//! Intern wird mit `anyhow` propagiert; an den Grenzen (Batch-Report, CLI)
//! wird der Fehler über [`CompileError::classify`] einem Code zugeordnet.

use thiserror::Error;

/// Fehlerklassen der Pipeline.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Eingabedokument unlesbar oder fehlerhaft
    #[error("Dokument konnte nicht geparst werden: {0}")]
    ParseFailure(String),

    /// Keine verwertbare Geometrie gefunden
    #[error("Keine verwertbare Geometrie gefunden: {0}")]
    DegenerateGeometry(String),

    /// Lane-ID-Raum erschöpft (Retry-Grenze überschritten)
    #[error("Lane-ID-Raum erschöpft nach {attempts} Versuchen ({issued} IDs vergeben)")]
    IdentifierSpaceExhausted { attempts: u32, issued: usize },

    /// Ungültige Konfiguration
    #[error("Ungültige Optionen: {0}")]
    InvalidOptions(String),

    /// Lese-/Schreibfehler
    #[error("I/O-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Stabiler, maschinenlesbarer Code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseFailure(_) => "E_PARSE",
            Self::DegenerateGeometry(_) => "E_DEGENERATE",
            Self::IdentifierSpaceExhausted { .. } => "E_ID_EXHAUSTED",
            Self::InvalidOptions(_) => "E_OPTIONS",
            Self::Io(_) => "E_IO",
        }
    }

    /// Ordnet einem `anyhow::Error` einen Code zu.
    ///
    /// Sucht in der Fehlerkette nach einem `CompileError`; XML-Fehler
    /// gelten als `E_PARSE`, I/O-Fehler als `E_IO`, alles andere als `E_INTERNAL`.
    pub fn classify(err: &anyhow::Error) -> &'static str {
        for cause in err.chain() {
            if let Some(compile) = cause.downcast_ref::<CompileError>() {
                return compile.code();
            }
            if cause.downcast_ref::<quick_xml::Error>().is_some() {
                return "E_PARSE";
            }
            if cause.downcast_ref::<std::io::Error>().is_some() {
                return "E_IO";
            }
        }
        "E_INTERNAL"
    }
}
