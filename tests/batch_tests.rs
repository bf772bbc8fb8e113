/// Integration-Tests für Batch-Verarbeitung und Artefakt-Export
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use xodr_map_compiler::export::{read_npy, read_table_map};
use xodr_map_compiler::{
    compile_batch, compile_path, discover_documents, write_batch, BatchMode, CompilerOptions,
};

fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

fn options(mode: BatchMode) -> CompilerOptions {
    CompilerOptions {
        lane_id_seed: Some(42),
        batch_mode: mode,
        ..Default::default()
    }
}

#[test]
fn test_discovery_is_sorted_and_filters_extension() {
    let paths = discover_documents(&fixture("mixed")).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["broken.xodr", "good.xodr"]);

    let single = discover_documents(&fixture("single_road.xodr")).unwrap();
    assert_eq!(single, vec![fixture("single_road.xodr")]);
}

#[test]
fn test_global_mode_deduplicates_identical_lane() {
    let report = compile_path(&fixture("tiles"), &options(BatchMode::Global)).unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.compiled.len(), 2);
    assert_eq!(report.outputs.len(), 1);

    let map = &report.outputs[0].map;
    // Straße 1 (Kachel a) und Straße 17 (Kachel b) sind nach Rundung identisch
    assert_eq!(map.graph.node_count(), 3);
    assert_eq!(map.graph.way_count(), 2);
    assert_eq!(map.table_map.len(), 2);

    let first = &map.graph.ways[0];
    assert_eq!(first.node_refs, vec![0, 1]);
    assert_eq!(first.successors, vec!["2".to_string()]);
    assert_eq!(first.right_neighbor.as_deref(), Some("-2"));

    let second = &map.graph.ways[1];
    assert_eq!(second.node_refs, vec![2]);
    assert!(second.is_intersection);
    assert_eq!(second.predecessors, vec!["1".to_string()]);

    // Bounds über beide Kacheln
    assert!(map.bounds.max_x >= 30.0);
    assert_eq!(map.bboxes.len(), 5);
}

#[test]
fn test_per_document_mode_shares_id_space() {
    let report = compile_path(&fixture("tiles"), &options(BatchMode::PerDocument)).unwrap();

    let names: Vec<&str> = report.outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);

    let b = &report.outputs[1].map;
    // ohne Deduplizierung: eigener Node pro Primitiv, IDs ab 0
    assert_eq!(b.graph.node_count(), 3);
    assert_eq!(b.graph.nodes[0].id, 0);
    assert_eq!(b.graph.way_count(), 2);

    let ids: HashSet<u32> = report
        .outputs
        .iter()
        .flat_map(|o| o.map.graph.ways.iter().map(|w| w.lane_id))
        .collect();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_failed_document_does_not_abort_batch() {
    let paths = discover_documents(&fixture("mixed")).unwrap();
    let report = compile_batch(&paths, &options(BatchMode::Global)).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].code, "E_PARSE");
    assert!(report.failures[0].path.ends_with("broken.xodr"));
    assert_eq!(report.compiled.len(), 1);
    assert!(report.has_success());
    assert_eq!(report.outputs[0].map.graph.way_count(), 1);
}

#[test]
fn test_oversized_document_is_isolated_in_per_document_mode() {
    let mut opts = options(BatchMode::PerDocument);
    opts.max_grid_cells = 100_000;

    let report = compile_path(&fixture("oversized"), &opts).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].code, "E_DEGENERATE");
    assert!(report.failures[0].path.ends_with("b/town.xodr"));

    let names: Vec<&str> = report.outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"]);
    assert_eq!(report.compiled.len(), 2);

    // Der geteilte Allokator überlebt das fehlgeschlagene Dokument
    let ids: HashSet<u32> = report
        .outputs
        .iter()
        .flat_map(|o| o.map.graph.ways.iter().map(|w| w.lane_id))
        .collect();
    assert_eq!(ids.len(), 2);
}

#[test]
fn test_missing_file_is_reported_as_io() {
    let report = compile_batch(
        &[fixture("does_not_exist.xodr")],
        &options(BatchMode::Global),
    )
    .unwrap();
    assert!(!report.has_success());
    assert_eq!(report.failures[0].code, "E_IO");
}

#[test]
fn test_write_artifacts_to_directory() {
    let out = tempfile::tempdir().unwrap();
    let mut opts = options(BatchMode::Global);
    opts.write_preview = true;

    let report = compile_path(&fixture("single_road.xodr"), &opts).unwrap();
    let written = write_batch(&report, out.path(), &opts).unwrap();
    assert_eq!(written.len(), 1);
    let files = &written[0];

    assert!(files
        .driveable_area
        .ends_with("MIA_10316_driveable_area_mat_2019_05_28.npy"));
    let occupancy = read_npy::<u8>(&files.driveable_area).unwrap();
    assert_eq!(occupancy.shape, vec![15, 35]);
    assert_eq!(occupancy.data.iter().filter(|&&c| c == 1).count(), 300);

    let height = read_npy::<f64>(&files.ground_height).unwrap();
    assert_eq!(height.shape, vec![15, 35]);
    assert!(height.data.contains(&2.0));

    let transform = read_npy::<f64>(&files.transform).unwrap();
    assert_eq!(transform.shape, vec![3, 3]);
    assert_eq!(transform.data[2], 3.5);

    let bboxes = read_npy::<f64>(&files.bbox_table).unwrap();
    assert_eq!(bboxes.shape, vec![1, 4]);

    let json = std::fs::read_to_string(&files.table_index_map).unwrap();
    let table = read_table_map(&json).unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.contains_key("0"));

    let xml = std::fs::read_to_string(&files.vector_map).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert_eq!(xml.matches("<way lane_id=").count(), 1);
    assert!(xml.contains(&format!("<way lane_id=\"{}\">", table["0"])));

    let preview = files.preview.as_ref().unwrap();
    assert!(preview.exists());
}

#[test]
fn test_empty_bbox_table_has_four_columns() {
    let out = tempfile::tempdir().unwrap();
    let opts = options(BatchMode::PerDocument);

    let report = compile_path(&fixture("empty.xodr"), &opts).unwrap();
    let written = write_batch(&report, out.path(), &opts).unwrap();

    assert!(written[0].bbox_table.starts_with(out.path().join("fixtures")));
    let bboxes = read_npy::<f64>(&written[0].bbox_table).unwrap();
    assert_eq!(bboxes.shape, vec![0, 4]);
    assert!(written[0].preview.is_none());
}
