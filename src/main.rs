//! XODR-Map-Compiler (CLI).
//!
//! Liest eine `.xodr`-Datei oder ein Verzeichnis und schreibt die
//! Argoverse-Artefakte (Raster, Transformation, BBoxen, Spurgraph).

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use xodr_map_compiler::{
    compile_path, write_batch, BBoxApproximation, BatchMode, CompileError, CompilerOptions,
};

#[derive(Parser, Debug)]
#[command(name = "xodr-map-compiler", version, about)]
struct Args {
    /// `.xodr`-Datei oder Verzeichnis (rekursiv)
    input: PathBuf,

    /// Ausgabeverzeichnis
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Optionen aus einer TOML-Datei laden
    #[arg(long)]
    config: Option<PathBuf>,

    /// Effektive Optionen als TOML speichern
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Meter pro Rasterzelle
    #[arg(long)]
    resolution: Option<f64>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Seed für reproduzierbare Lane-IDs
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    bbox: Option<BBoxArg>,

    /// PNG-Vorschau des Befahrbarkeitsrasters schreiben
    #[arg(long, default_value_t = false)]
    preview: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Global,
    PerDocument,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum BBoxArg {
    StartEnd,
    Extent,
    Footprint,
}

fn main() -> ExitCode {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    log::info!("XODR-Map-Compiler v{} startet...", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("Kein Dokument erfolgreich kompiliert");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("Fehler [{}]: {:#}", CompileError::classify(&err), err);
            ExitCode::from(2)
        }
    }
}

fn resolve_options(args: &Args) -> CompilerOptions {
    let mut options = match &args.config {
        Some(path) => CompilerOptions::load_from_file(path),
        None => CompilerOptions::default(),
    };

    if let Some(resolution) = args.resolution {
        options.resolution = resolution;
    }
    if let Some(mode) = args.mode {
        options.batch_mode = match mode {
            ModeArg::Global => BatchMode::Global,
            ModeArg::PerDocument => BatchMode::PerDocument,
        };
    }
    if let Some(seed) = args.seed {
        options.lane_id_seed = Some(seed);
    }
    if let Some(bbox) = args.bbox {
        options.bbox_approximation = match bbox {
            BBoxArg::StartEnd => BBoxApproximation::StartEnd,
            BBoxArg::Extent => BBoxApproximation::Extent,
            BBoxArg::Footprint => BBoxApproximation::Footprint,
        };
    }
    if args.preview {
        options.write_preview = true;
    }
    options
}

/// `Ok(false)`, wenn kein Dokument übernommen wurde.
fn run(args: &Args) -> anyhow::Result<bool> {
    let options = resolve_options(args);
    options.validate()?;

    if let Some(path) = &args.save_config {
        options.save_to_file(path)?;
    }

    let report = compile_path(&args.input, &options)?;
    for failure in &report.failures {
        eprintln!(
            "{} [{}]: {}",
            failure.path.display(),
            failure.code,
            failure.message
        );
    }

    if !report.has_success() {
        return Ok(false);
    }

    let written = write_batch(&report, &args.output, &options)?;
    log::info!(
        "{} Artefakt-Set(s) nach {} geschrieben",
        written.len(),
        args.output.display()
    );
    Ok(true)
}
