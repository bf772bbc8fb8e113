//! Batch-Verarbeitung: Dokumente finden, in zwei Durchläufen kompilieren,
//! Artefakt-Sets schreiben.
//!
//! Durchlauf 1 parsed alle Dokumente und bestimmt deren Bounds, Durchlauf 2
//! legt die Raster an und übernimmt die Dokumente in sortierter Reihenfolge.
//! Fehler einzelner Dokumente werden protokolliert, der Batch läuft weiter.

use anyhow::{ensure, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::compile::{CompilationContext, CompiledMap, GraphMode, LaneIdAllocator};
use crate::core::{BoundsCalculator, BoundsOutcome, CompileError, RoadNetwork};
use crate::export::{write_artifacts, WrittenArtifacts};
use crate::shared::{BatchMode, CompilerOptions};
use crate::xodr::parse_xodr_file;

/// Dateiendung der Eingabedokumente.
pub const XODR_EXTENSION: &str = "xodr";

/// Ein fehlgeschlagenes Dokument mit Fehlercode.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub code: &'static str,
    pub message: String,
}

/// Ein kompiliertes Artefakt-Set.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Name des Unterverzeichnisses (leer im globalen Modus)
    pub name: String,
    pub documents: Vec<PathBuf>,
    pub map: CompiledMap,
}

/// Ergebnis eines Batch-Laufs.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outputs: Vec<BatchOutput>,
    /// Erfolgreich übernommene Dokumente in Verarbeitungsreihenfolge
    pub compiled: Vec<PathBuf>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchReport {
    /// Mindestens ein Dokument wurde erfolgreich übernommen.
    pub fn has_success(&self) -> bool {
        !self.compiled.is_empty()
    }

    fn record_failure(&mut self, path: &Path, err: &anyhow::Error) {
        let code = CompileError::classify(err);
        log::error!("{} [{}]: {:#}", path.display(), code, err);
        self.failures.push(DocumentFailure {
            path: path.to_path_buf(),
            code,
            message: format!("{:#}", err),
        });
    }
}

/// Sammelt alle `.xodr`-Dateien unterhalb von `root`, lexikographisch sortiert.
///
/// Ist `root` selbst eine Datei, wird nur sie zurückgegeben.
pub fn discover_documents(root: &Path) -> Result<Vec<PathBuf>> {
    ensure!(root.exists(), "Eingabe existiert nicht: {}", root.display());
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Eintrag übersprungen: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(XODR_EXTENSION))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        log::warn!("Keine .xodr-Dateien gefunden in {}", root.display());
    } else {
        log::info!("{} .xodr-Dateien gefunden in {}", paths.len(), root.display());
    }
    Ok(paths)
}

/// Geparstes Dokument aus Durchlauf 1.
struct ParsedDocument {
    path: PathBuf,
    network: RoadNetwork,
    bounds: BoundsOutcome,
}

/// Kompiliert alle Dokumente gemäß `options.batch_mode`.
pub fn compile_batch(paths: &[PathBuf], options: &CompilerOptions) -> Result<BatchReport> {
    options.validate()?;
    let mut report = BatchReport::default();

    // Durchlauf 1: Parsen und Bounds
    let mut parsed = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        log::info!("[{}/{}] Lese {}", index + 1, paths.len(), path.display());
        match parse_xodr_file(path) {
            Ok(network) => {
                let bounds = BoundsCalculator::compute(&network);
                if bounds.is_degenerate() {
                    log::warn!("{}: keine verwertbare Geometrie", path.display());
                }
                parsed.push(ParsedDocument {
                    path: path.clone(),
                    network,
                    bounds,
                });
            }
            Err(err) => report.record_failure(path, &err),
        }
    }

    // Durchlauf 2: Raster anlegen und Dokumente übernehmen
    match options.batch_mode {
        BatchMode::Global => compile_global(&parsed, options, &mut report)?,
        BatchMode::PerDocument => compile_per_document(&parsed, options, &mut report)?,
    }

    log::info!(
        "Batch fertig: {} Dokumente übernommen, {} fehlgeschlagen",
        report.compiled.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Findet und kompiliert alle Dokumente unter `input`.
pub fn compile_path(input: &Path, options: &CompilerOptions) -> Result<BatchReport> {
    let paths = discover_documents(input)?;
    compile_batch(&paths, options)
}

fn compile_global(
    parsed: &[ParsedDocument],
    options: &CompilerOptions,
    report: &mut BatchReport,
) -> Result<()> {
    if parsed.is_empty() {
        return Ok(());
    }

    let bounds = parsed
        .iter()
        .fold(BoundsOutcome::Degenerate, |acc, doc| acc.merge(doc.bounds));
    let mut context = CompilationContext::new(bounds, GraphMode::Deduplicated, options)?;

    let mut documents = Vec::new();
    for doc in parsed {
        match context.compile_document(&doc.network) {
            Ok(_) => documents.push(doc.path.clone()),
            Err(err) => report.record_failure(&doc.path, &err),
        }
    }

    if !documents.is_empty() {
        report.compiled.extend(documents.iter().cloned());
        report.outputs.push(BatchOutput {
            name: String::new(),
            documents,
            map: context.finish(),
        });
    }
    Ok(())
}

fn compile_per_document(
    parsed: &[ParsedDocument],
    options: &CompilerOptions,
    report: &mut BatchReport,
) -> Result<()> {
    let mut ids = LaneIdAllocator::from_options(options);
    let mut used_names = HashSet::new();

    for doc in parsed {
        let geometry = match CompilationContext::grid_geometry(&doc.bounds, options) {
            Ok(geometry) => geometry,
            Err(err) => {
                report.record_failure(&doc.path, &err.into());
                continue;
            }
        };
        let mut context = CompilationContext::from_geometry(
            geometry,
            doc.bounds,
            GraphMode::PerDocument,
            options,
            ids,
        );
        let result = context.compile_document(&doc.network);
        let (map, returned) = context.into_parts();
        ids = returned;

        match result {
            Ok(_) => {
                report.compiled.push(doc.path.clone());
                report.outputs.push(BatchOutput {
                    name: output_name(&doc.path, &mut used_names),
                    documents: vec![doc.path.clone()],
                    map,
                });
            }
            Err(err) => report.record_failure(&doc.path, &err),
        }
    }
    Ok(())
}

/// Name des Artefakt-Verzeichnisses: übergeordneter Ordner des Dokuments,
/// bei Kollision ergänzt um den Dateinamen.
fn output_name(path: &Path, used: &mut HashSet<String>) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_string());
    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| stem.clone());

    let mut name = parent.clone();
    if used.contains(&name) {
        name = format!("{}_{}", parent, stem);
    }
    let mut suffix = 2;
    while used.contains(&name) {
        name = format!("{}_{}_{}", parent, stem, suffix);
        suffix += 1;
    }
    used.insert(name.clone());
    name
}

/// Schreibt alle Artefakt-Sets eines Reports unter `output_dir`.
pub fn write_batch(
    report: &BatchReport,
    output_dir: &Path,
    options: &CompilerOptions,
) -> Result<Vec<WrittenArtifacts>> {
    report
        .outputs
        .iter()
        .map(|output| {
            let dir = if output.name.is_empty() {
                output_dir.to_path_buf()
            } else {
                output_dir.join(&output.name)
            };
            write_artifacts(&output.map, &dir, &options.artifact_names, options.write_preview)
                .with_context(|| format!("Artefakte für '{}' nicht geschrieben", dir.display()))
        })
        .collect()
}
